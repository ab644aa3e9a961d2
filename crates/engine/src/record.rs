/// Logical records: what callers write and what reads hand back.
use serde_json::{json, Value};
use std::borrow::Cow;
use std::collections::{BTreeMap, BTreeSet};

/// Marker placed in a field whose stored text is not valid JSON.
pub const PARSE_ERROR_MARKER: &str = "Failed to parse stored data";

/// The value of one named field.
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    /// A structured JSON value.
    Json(Value),
    /// Already-serialized JSON text, stored as given (possibly pretty-printed).
    Text(String),
}

impl Document {
    /// The serialized form that size decisions are made against.
    pub fn serialize(&self) -> Cow<'_, str> {
        match self {
            Document::Json(v) => Cow::Owned(v.to_string()),
            Document::Text(s) => Cow::Borrowed(s),
        }
    }

    pub fn to_value(&self) -> Result<Value, serde_json::Error> {
        match self {
            Document::Json(v) => Ok(v.clone()),
            Document::Text(s) => serde_json::from_str(s),
        }
    }
}

impl From<Value> for Document {
    fn from(v: Value) -> Self {
        Document::Json(v)
    }
}

/// One logical record addressed by partition and row key.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub partition_key: String,
    pub row_key: String,
    pub fields: BTreeMap<String, Document>,
}

impl Record {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder form of [`Record::set`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Document>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Document>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Document> {
        self.fields.get(name)
    }
}

/// The fields of a record type that are large enough to need chunking.
/// Every other field is stored as a plain scalar property.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordSchema {
    chunked_fields: BTreeSet<String>,
}

impl RecordSchema {
    pub fn new<I, S>(chunked_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            chunked_fields: chunked_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Security assessments: `metrics` and `recommendations`.
    pub fn assessment() -> Self {
        Self::new(["metrics", "recommendations"])
    }

    pub fn is_chunked_field(&self, name: &str) -> bool {
        self.chunked_fields.contains(name)
    }

    pub fn chunked_fields(&self) -> impl Iterator<Item = &str> {
        self.chunked_fields.iter().map(String::as_str)
    }
}

/// A problem found while decoding one field. Never fatal to the read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldIssue {
    /// Fewer parts were present than the recorded chunk count.
    MissingChunks {
        field: String,
        expected: usize,
        missing_count: usize,
        /// The first missing indices; long gaps are only counted.
        missing: Vec<usize>,
    },
    /// The stored text was not valid JSON; the field holds a placeholder.
    ParseFailed { field: String, error: String },
}

impl FieldIssue {
    pub fn field(&self) -> &str {
        match self {
            FieldIssue::MissingChunks { field, .. } | FieldIssue::ParseFailed { field, .. } => field,
        }
    }
}

/// A record as read back from a store.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedRecord {
    pub partition_key: String,
    pub row_key: String,
    pub fields: BTreeMap<String, Value>,
    pub issues: Vec<FieldIssue>,
}

impl DecodedRecord {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// `true` if every field decoded completely.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// `true` if `name` holds a degraded summary instead of the full document.
    pub fn is_degraded(&self, name: &str) -> bool {
        self.get(name)
            .and_then(|v| v.get("degraded"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

/// Parses stored text for `field`. Invalid JSON becomes a placeholder value
/// carrying the parser error, plus a [`FieldIssue::ParseFailed`].
pub(crate) fn parse_field(field: &str, text: &str) -> (Value, Option<FieldIssue>) {
    match serde_json::from_str(text) {
        Ok(v) => (v, None),
        Err(e) => {
            log::warn!(
                "field '{}': stored text ({} bytes) is not valid JSON: {}",
                field,
                text.len(),
                e
            );
            let placeholder = json!({
                "error": PARSE_ERROR_MARKER,
                "parseError": e.to_string(),
                "rawLength": text.len(),
            });
            let issue = FieldIssue::ParseFailed {
                field: field.to_string(),
                error: e.to_string(),
            };
            (placeholder, Some(issue))
        }
    }
}
