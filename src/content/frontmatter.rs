//! Front-matter parsing

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use serde::Serialize;
use serde_yaml::Value;
use thiserror::Error;

/// Line that opens and closes a front-matter block
const MARKER: &str = "---";

const BOM: char = '\u{feff}';

/// Keys consulted, in order, for an explicit revision timestamp
const TIMESTAMP_KEYS: [&str; 3] = ["updated", "last_modified_at", "date"];

/// Front-matter errors, reported per document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrontMatterError {
    #[error("front-matter block opened with `---` is never closed")]
    Unterminated,

    #[error("invalid front-matter: {0}")]
    Invalid(String),
}

/// A single front-matter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Scalar(String),
    List(Vec<String>),
}

impl FieldValue {
    fn from_yaml(value: &Value) -> Self {
        match value {
            Value::Sequence(items) => FieldValue::List(items.iter().map(value_text).collect()),
            Value::Tagged(tagged) => FieldValue::from_yaml(&tagged.value),
            other => FieldValue::Scalar(value_text(other)),
        }
    }
}

/// Flat key-value metadata from the head of a document, in source order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FrontMatter {
    fields: IndexMap<String, FieldValue>,
}

/// A document cut into its front-matter block and body.
///
/// `block` holds both marker lines verbatim, so `block` followed by `body`
/// is always the original text.
#[derive(Debug, Clone)]
pub struct Split<'a> {
    pub front_matter: FrontMatter,
    pub block: &'a str,
    pub body: &'a str,
}

impl<'a> Split<'a> {
    fn bare(text: &'a str) -> Self {
        Self {
            front_matter: FrontMatter::default(),
            block: "",
            body: text,
        }
    }
}

impl FrontMatter {
    /// Parse front-matter from content string
    /// Returns (front_matter, body)
    pub fn parse(content: &str) -> Result<(Self, &str), FrontMatterError> {
        let split = Self::split(content)?;
        Ok((split.front_matter, split.body))
    }

    /// Split the leading `---` block from the rest of the text.
    ///
    /// The block only opens when the very first line is the marker. Text
    /// without it has empty front-matter and is all body.
    pub fn split(content: &str) -> Result<Split<'_>, FrontMatterError> {
        // A leading byte-order mark stays in `block`
        let bom = if content.starts_with(BOM) { BOM.len_utf8() } else { 0 };
        let mut lines = content[bom..].split_inclusive('\n');

        let head = match lines.next() {
            Some(line) if is_marker(line) => bom + line.len(),
            _ => return Ok(Split::bare(content)),
        };

        let mut offset = head;
        for line in lines {
            let end = offset + line.len();
            if is_marker(line) {
                let front_matter = Self::from_yaml(&content[head..offset])?;
                return Ok(Split {
                    front_matter,
                    block: &content[..end],
                    body: &content[end..],
                });
            }
            offset = end;
        }

        Err(FrontMatterError::Unterminated)
    }

    fn from_yaml(yaml: &str) -> Result<Self, FrontMatterError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: Value =
            serde_yaml::from_str(yaml).map_err(|e| FrontMatterError::Invalid(e.to_string()))?;

        let mapping = match value {
            Value::Mapping(mapping) => mapping,
            // A block holding only comments
            Value::Null => return Ok(Self::default()),
            _ => {
                return Err(FrontMatterError::Invalid(
                    "expected key: value pairs".to_string(),
                ))
            }
        };

        let mut fields = IndexMap::with_capacity(mapping.len());
        for (key, value) in &mapping {
            let key = match key {
                Value::Sequence(_) | Value::Mapping(_) => {
                    return Err(FrontMatterError::Invalid(format!(
                        "unsupported key {}",
                        value_text(key)
                    )))
                }
                scalar => value_text(scalar),
            };
            fields.insert(key, FieldValue::from_yaml(value));
        }

        Ok(Self { fields })
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    /// A scalar value; list-valued keys return `None`
    pub fn scalar(&self, key: &str) -> Option<&str> {
        match self.fields.get(key)? {
            FieldValue::Scalar(s) => Some(s.as_str()),
            FieldValue::List(_) => None,
        }
    }

    /// A list value. A non-empty scalar reads as a one-element list.
    pub fn list(&self, key: &str) -> Vec<&str> {
        match self.fields.get(key) {
            Some(FieldValue::List(items)) => items.iter().map(String::as_str).collect(),
            Some(FieldValue::Scalar(s)) if !s.trim().is_empty() => vec![s.as_str()],
            _ => Vec::new(),
        }
    }

    pub fn title(&self) -> Option<&str> {
        self.scalar("title").filter(|t| !t.trim().is_empty())
    }

    pub fn tags(&self) -> Vec<&str> {
        self.list("tags")
    }

    pub fn categories(&self) -> Vec<&str> {
        self.list("categories")
    }

    /// Explicit revision timestamp, if one of the timestamp keys parses
    pub fn timestamp(&self) -> Option<NaiveDateTime> {
        TIMESTAMP_KEYS
            .iter()
            .find_map(|key| self.scalar(key).and_then(parse_date_string))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

fn is_marker(line: &str) -> bool {
    line.trim_end() == MARKER
}

/// Render a YAML value as a single-line string
fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Tagged(tagged) => value_text(&tagged.value),
        nested => serde_json::to_string(nested).unwrap_or_else(|_| {
            serde_yaml::to_string(nested)
                .map(|s| s.trim_end().replace('\n', " "))
                .unwrap_or_default()
        }),
    }
}

/// Parse a date string in various formats
pub fn parse_date_string(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();

    let datetime_formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y/%m/%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
    ];
    for fmt in datetime_formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    // Jekyll writes offsets as `2017-03-21 10:00:00 +0800`
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.naive_utc());
    }

    // Try RFC 3339 / ISO 8601
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    None
}
