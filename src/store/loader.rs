//! Content loader - ingests posts from the source directory

use anyhow::{bail, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use super::DocumentStore;
use crate::content::FrontMatterError;
use crate::Site;

/// Outcome of ingesting one file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileState {
    Ok,
    /// Ingested, but the body is empty or whitespace-only
    EmptyBody,
    MalformedFrontMatter,
    InvalidFrontMatter,
    IoError,
}

impl FileState {
    /// Whether the file made it into the store
    pub fn is_ingested(&self) -> bool {
        matches!(self, FileState::Ok | FileState::EmptyBody)
    }
}

impl From<&FrontMatterError> for FileState {
    fn from(err: &FrontMatterError) -> Self {
        match err {
            FrontMatterError::Unterminated => FileState::MalformedFrontMatter,
            FrontMatterError::Invalid(_) => FileState::InvalidFrontMatter,
        }
    }
}

/// Per-file status line of a batch
#[derive(Debug, Clone, Serialize)]
pub struct FileStatus {
    pub path: String,
    pub status: FileState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl FileStatus {
    fn new(path: String, status: FileState) -> Self {
        Self {
            path,
            status,
            message: None,
        }
    }

    fn failed(path: String, status: FileState, err: impl std::fmt::Display) -> Self {
        Self {
            path,
            status,
            message: Some(err.to_string()),
        }
    }
}

/// Everything a load produced
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub store: DocumentStore,
    pub statuses: Vec<FileStatus>,
}

impl LoadOutcome {
    pub fn failures(&self) -> impl Iterator<Item = &FileStatus> {
        self.statuses.iter().filter(|s| !s.status.is_ingested())
    }
}

/// Loads posts from the source directory
pub struct ContentLoader<'a> {
    site: &'a Site,
    exclude: Vec<glob::Pattern>,
}

impl<'a> ContentLoader<'a> {
    /// Create a new content loader
    pub fn new(site: &'a Site) -> Result<Self> {
        let exclude = site.config.exclude_patterns()?;
        Ok(Self { site, exclude })
    }

    /// Ingest every post under the source directory.
    ///
    /// Files are visited in file-name order, which is the ingestion order.
    /// A bad file gets a status entry and the batch carries on.
    pub fn load(&self) -> Result<LoadOutcome> {
        let source_dir = &self.site.source_dir;
        if !source_dir.is_dir() {
            bail!("Source directory not found: {:?}", source_dir);
        }

        let mut outcome = LoadOutcome::default();

        for entry in WalkDir::new(source_dir)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| self.relative(p))
                        .unwrap_or_else(|| source_dir.to_string_lossy().to_string());
                    tracing::warn!("Failed to read {}: {}", path, e);
                    outcome
                        .statuses
                        .push(FileStatus::failed(path, FileState::IoError, e));
                    continue;
                }
            };

            let path = entry.path();
            if !entry.file_type().is_file() || !self.site.config.is_post_file(path) {
                continue;
            }

            let source = self.relative(path);
            if self.exclude.iter().any(|p| p.matches(&source)) {
                tracing::debug!("Excluded: {}", source);
                continue;
            }

            let status = self.load_file(&mut outcome.store, path, source);
            outcome.statuses.push(status);
        }

        tracing::info!(
            "Loaded {} documents ({} files skipped)",
            outcome.store.len(),
            outcome.failures().count()
        );

        Ok(outcome)
    }

    fn load_file(&self, store: &mut DocumentStore, path: &Path, source: String) -> FileStatus {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", source, e);
                return FileStatus::failed(source, FileState::IoError, e);
            }
        };

        match store.ingest(source.clone(), text) {
            Ok(doc) if doc.has_empty_body() => {
                tracing::warn!("EmptyBodyWarning: {} has an empty body", source);
                FileStatus::new(source, FileState::EmptyBody)
            }
            Ok(_) => FileStatus::new(source, FileState::Ok),
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", source, e);
                FileStatus::failed(source, FileState::from(&e), e)
            }
        }
    }

    /// Path relative to the source directory, with `/` separators
    fn relative(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.site.source_dir).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}
