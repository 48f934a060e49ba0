//! Content module - documents and front-matter parsing

mod document;
mod frontmatter;

pub use document::{derive_slug, Document};
pub use frontmatter::{parse_date_string, FieldValue, FrontMatter, FrontMatterError, Split};
