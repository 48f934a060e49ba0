//! Revision resolution - picks the canonical document of a class

use serde::Serialize;

use crate::content::Document;
use crate::detect::EquivalenceClass;

/// Which signal ordered a class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderedBy {
    Ingestion,
    /// Front-matter timestamps, present on every member
    Timestamp,
}

/// The canonical latest revision and everything it supersedes
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub canonical: &'a Document,
    /// Older revisions, oldest first
    pub superseded: Vec<&'a Document>,
    pub ordered_by: OrderedBy,
}

/// Order a class and designate its last member canonical.
///
/// Timestamps are only used when every member has one; a class mixing dated
/// and undated revisions falls back to ingestion order. Equal timestamps
/// are broken by ingestion order.
pub fn resolve<'a>(class: &EquivalenceClass<'a>) -> Resolution<'a> {
    let mut ordered: Vec<&'a Document> = class.members().to_vec();

    let all_dated = ordered.iter().all(|d| d.timestamp().is_some());
    let ordered_by = if all_dated {
        ordered.sort_by_cached_key(|d| (d.timestamp(), d.seq()));
        OrderedBy::Timestamp
    } else {
        ordered.sort_by_key(|d| d.seq());
        OrderedBy::Ingestion
    };

    let canonical = match ordered.pop() {
        Some(doc) => doc,
        None => unreachable!("equivalence classes are never empty"),
    };

    Resolution {
        canonical,
        superseded: ordered,
        ordered_by,
    }
}

/// Resolve every class, keeping their order
pub fn resolve_all<'a>(classes: &[EquivalenceClass<'a>]) -> Vec<Resolution<'a>> {
    classes.iter().map(resolve).collect()
}
