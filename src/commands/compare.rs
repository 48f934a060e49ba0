//! Compare two posts

use anyhow::{Context, Result};
use similar::{ChangeTag, TextDiff};
use std::fs;
use std::path::Path;

use crate::content::Document;
use crate::detect::{Detector, Metric};
use crate::Site;

/// Read a single post outside of any store
pub fn read_document(path: &Path) -> Result<Document> {
    let text =
        fs::read_to_string(path).with_context(|| format!("Failed to read {:?}", path))?;
    let source = path.to_string_lossy().to_string();
    Document::parse(source, text, 0).with_context(|| format!("Failed to parse {:?}", path))
}

/// Scores of a pair under every metric
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub scores: Vec<(Metric, f64)>,
    pub threshold: f64,
    /// Whether the configured metric clears the threshold
    pub same_article: bool,
}

pub fn compare(site: &Site, a: &Document, b: &Document) -> Comparison {
    let detector = Detector::new(site.config.detect());
    let scores = [Metric::Tokens, Metric::Edit]
        .into_iter()
        .map(|m| (m, m.score(a.body(), b.body())))
        .collect();

    Comparison {
        scores,
        threshold: detector.config().threshold,
        same_article: a.slug() == b.slug() || detector.is_match(a, b),
    }
}

/// Print similarity scores for two posts
pub fn run(site: &Site, a: &Path, b: &Path) -> Result<()> {
    let (a, b) = (read_document(a)?, read_document(b)?);
    let comparison = compare(site, &a, &b);

    println!("{} [{}]", a.source(), a.slug());
    println!("{} [{}]", b.source(), b.slug());
    for (metric, score) in &comparison.scores {
        let marker = if *metric == site.config.metric { "*" } else { " " };
        println!("{} {:<7} {:.4}", marker, metric, score);
    }
    println!(
        "threshold {:.2}: {}",
        comparison.threshold,
        if comparison.same_article {
            "same article"
        } else {
            "different articles"
        }
    );

    Ok(())
}

/// Unified line diff of two bodies
pub fn unified_diff(a: &Document, b: &Document) -> String {
    TextDiff::from_lines(a.body(), b.body())
        .unified_diff()
        .header(a.source(), b.source())
        .to_string()
}

/// Print the body diff of two posts
pub fn diff(a: &Path, b: &Path, stat: bool) -> Result<()> {
    let (a, b) = (read_document(a)?, read_document(b)?);

    if stat {
        let diff = TextDiff::from_lines(a.body(), b.body());
        let (mut added, mut removed) = (0, 0);
        for change in diff.iter_all_changes() {
            match change.tag() {
                ChangeTag::Insert => added += 1,
                ChangeTag::Delete => removed += 1,
                ChangeTag::Equal => {}
            }
        }
        println!("{} lines added, {} lines removed", added, removed);
    } else {
        print!("{}", unified_diff(&a, &b));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    #[test]
    fn test_compare_and_diff() {
        let dir = tempfile::tempdir().unwrap();
        let a_path = dir.path().join("2017-03-21-spark.md");
        let b_path = dir.path().join("2017-03-25-kryo.md");
        fs::write(&a_path, "---\ntitle: Spark\n---\nuse kryo\nregister classes\n").unwrap();
        fs::write(&b_path, "---\ntitle: Kryo\n---\nuse kryo\nregister your classes\n").unwrap();

        let a = read_document(&a_path).unwrap();
        let b = read_document(&b_path).unwrap();
        assert_eq!(a.slug(), "spark");

        let site = Site::with_config(dir.path(), SiteConfig::default());
        let comparison = compare(&site, &a, &b);
        assert_eq!(comparison.scores.len(), 2);
        // 4 shared words out of 4 + 5
        assert_eq!(comparison.scores[0], (Metric::Tokens, 8.0 / 9.0));
        assert!(!comparison.same_article);

        let diff = unified_diff(&a, &b);
        assert!(diff.contains("-register classes"));
        assert!(diff.contains("+register your classes"));
        assert!(diff.contains(" use kryo"));
    }

    #[test]
    fn test_unreadable_file() {
        assert!(read_document(Path::new("/nonexistent/post.md")).is_err());
    }
}
