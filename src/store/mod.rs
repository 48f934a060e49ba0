//! Append-only document store keyed by slug

pub mod loader;

use indexmap::IndexMap;

use crate::content::{Document, FrontMatterError};

/// Holds every ingested document in ingestion order.
/// Documents are never removed or modified.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    documents: Vec<Document>,
    /// Slug -> indices into `documents`, in first-ingestion order
    by_slug: IndexMap<String, Vec<usize>>,
}

/// Successive edits sharing a slug, earliest first. Never empty.
#[derive(Debug, Clone)]
pub struct Collection<'a> {
    slug: &'a str,
    documents: Vec<&'a Document>,
}

impl<'a> Collection<'a> {
    pub fn slug(&self) -> &'a str {
        self.slug
    }

    pub fn documents(&self) -> &[&'a Document] {
        &self.documents
    }

    pub fn earliest(&self) -> &'a Document {
        self.documents[0]
    }

    pub fn latest(&self) -> &'a Document {
        self.documents[self.documents.len() - 1]
    }
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and append a document. Nothing is appended on error.
    pub fn ingest(
        &mut self,
        source: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<&Document, FrontMatterError> {
        let seq = self.documents.len();
        let doc = Document::parse(source, text, seq)?;

        self.by_slug
            .entry(doc.slug().to_string())
            .or_default()
            .push(seq);
        self.documents.push(doc);

        Ok(&self.documents[seq])
    }

    /// All documents in ingestion order
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn get(&self, seq: usize) -> Option<&Document> {
        self.documents.get(seq)
    }

    pub fn collection(&self, slug: &str) -> Option<Collection<'_>> {
        let (slug, indices) = self.by_slug.get_key_value(slug)?;
        Some(self.make_collection(slug, indices))
    }

    /// Every collection, ordered by first ingestion
    pub fn collections(&self) -> impl Iterator<Item = Collection<'_>> {
        self.by_slug
            .iter()
            .map(|(slug, indices)| self.make_collection(slug, indices))
    }

    fn make_collection<'a>(&'a self, slug: &'a str, indices: &[usize]) -> Collection<'a> {
        Collection {
            slug,
            documents: indices.iter().map(|&i| &self.documents[i]).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
