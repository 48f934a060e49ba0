//! JSON report of a scan

use anyhow::Result;
use serde::Serialize;

use crate::content::FrontMatter;
use crate::detect::{DetectConfig, Metric};
use crate::resolve::{OrderedBy, Resolution};
use crate::store::loader::FileStatus;

/// Scan report: one entry per equivalence class plus per-file statuses
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub threshold: f64,
    pub metric: Metric,
    /// Documents ingested
    pub documents: usize,
    pub classes: Vec<ClassReport>,
    pub files: Vec<FileStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClassReport {
    pub canonical: CanonicalEntry,
    pub superseded: Vec<String>,
    pub members: usize,
    pub ordered_by: OrderedBy,
}

#[derive(Debug, Clone, Serialize)]
pub struct CanonicalEntry {
    pub slug: String,
    pub path: String,
    pub title: String,
    pub front_matter: FrontMatter,
}

impl Report {
    pub fn new(config: &DetectConfig, resolutions: &[Resolution<'_>], files: Vec<FileStatus>) -> Self {
        let classes: Vec<ClassReport> = resolutions.iter().map(ClassReport::from).collect();
        Self {
            threshold: config.threshold,
            metric: config.metric,
            documents: classes.iter().map(|c| c.members).sum(),
            classes,
            files,
        }
    }

    /// Classes holding more than one revision
    pub fn duplicates(&self) -> impl Iterator<Item = &ClassReport> {
        self.classes.iter().filter(|c| c.members > 1)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl From<&Resolution<'_>> for ClassReport {
    fn from(resolution: &Resolution<'_>) -> Self {
        let canonical = resolution.canonical;
        Self {
            canonical: CanonicalEntry {
                slug: canonical.slug().to_string(),
                path: canonical.source().to_string(),
                title: canonical.title().to_string(),
                front_matter: canonical.front_matter().clone(),
            },
            superseded: resolution
                .superseded
                .iter()
                .map(|d| d.source().to_string())
                .collect(),
            members: resolution.superseded.len() + 1,
            ordered_by: resolution.ordered_by,
        }
    }
}
