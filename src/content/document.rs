//! Document model

use chrono::NaiveDateTime;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

use super::{FrontMatter, FrontMatterError};

lazy_static! {
    /// Jekyll-style `YYYY-MM-DD-` filename prefix
    static ref DATE_PREFIX: Regex = Regex::new(r"^\d{4}-\d{1,2}-\d{1,2}-").unwrap();
}

/// An ingested post. Immutable: a new edit is a new `Document`.
#[derive(Debug, Clone)]
pub struct Document {
    slug: String,
    source: String,
    seq: usize,
    raw: String,
    front_matter: FrontMatter,
    /// Byte offset where the body starts in `raw`
    body_start: usize,
}

impl Document {
    /// Parse raw text ingested from `source` as the `seq`-th document
    pub fn parse(
        source: impl Into<String>,
        raw: impl Into<String>,
        seq: usize,
    ) -> Result<Self, FrontMatterError> {
        let source = source.into();
        let raw = raw.into();

        let split = FrontMatter::split(&raw)?;
        let body_start = split.block.len();
        let front_matter = split.front_matter;
        let slug = derive_slug(&source, front_matter.title());

        Ok(Self {
            slug,
            source,
            seq,
            raw,
            front_matter,
            body_start,
        })
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    /// Source path relative to the source directory
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Ingestion sequence number
    pub fn seq(&self) -> usize {
        self.seq
    }

    pub fn raw_text(&self) -> &str {
        &self.raw
    }

    pub fn front_matter(&self) -> &FrontMatter {
        &self.front_matter
    }

    /// The front-matter block exactly as written, marker lines included
    pub fn block(&self) -> &str {
        &self.raw[..self.body_start]
    }

    pub fn body(&self) -> &str {
        &self.raw[self.body_start..]
    }

    /// Empty or whitespace-only body
    pub fn has_empty_body(&self) -> bool {
        self.body().trim().is_empty()
    }

    pub fn title(&self) -> &str {
        self.front_matter.title().unwrap_or(&self.slug)
    }

    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        self.front_matter.timestamp()
    }
}

/// Derive a slug from the file stem, dropping any date prefix.
/// Falls back to the title, then to `untitled`.
pub fn derive_slug(source: &str, title: Option<&str>) -> String {
    let stem = Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let slug = slug::slugify(DATE_PREFIX.replace(stem, ""));
    if !slug.is_empty() {
        return slug;
    }

    title
        .map(slug::slugify)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "untitled".to_string())
}
