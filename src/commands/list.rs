//! List site content

use anyhow::Result;
use std::fmt::Write;

use crate::detect::Detector;
use crate::resolve;
use crate::Site;

/// List site content by type
pub fn run(site: &Site, content_type: &str) -> Result<()> {
    print!("{}", render(site, content_type)?);
    Ok(())
}

/// The listing `run` prints
pub fn render(site: &Site, content_type: &str) -> Result<String> {
    let outcome = site.load()?;
    let mut out = String::new();

    match content_type {
        "class" | "classes" => {
            let detector = Detector::new(site.config.detect());
            let classes = detector.partition(&outcome.store);
            writeln!(out, "Classes ({}):", classes.len())?;
            for resolution in resolve::resolve_all(&classes) {
                writeln!(
                    out,
                    "  {} [{}]",
                    resolution.canonical.title(),
                    resolution.canonical.source()
                )?;
                for old in &resolution.superseded {
                    writeln!(out, "    supersedes {}", old.source())?;
                }
            }
        }
        "document" | "documents" => {
            let documents = outcome.store.documents();
            writeln!(out, "Documents ({}):", documents.len())?;
            for doc in documents {
                writeln!(
                    out,
                    "  {:>3} {} - {} [{}]",
                    doc.seq(),
                    doc.slug(),
                    doc.title(),
                    doc.source()
                )?;
            }
        }
        "failure" | "failures" => {
            let failures: Vec<_> = outcome.failures().collect();
            writeln!(out, "Failures ({}):", failures.len())?;
            for status in failures {
                writeln!(
                    out,
                    "  {} ({:?}): {}",
                    status.path,
                    status.status,
                    status.message.as_deref().unwrap_or_default()
                )?;
            }
        }
        _ => {
            anyhow::bail!(
                "Unknown type: {}. Available: classes, documents, failures",
                content_type
            );
        }
    }

    Ok(out)
}
