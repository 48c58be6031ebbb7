//! Core data models for document store exploration.
//!
//! Raw store values are represented as a closed [`FieldValue`] enum. Store
//! implementations decide which variant a raw value becomes by probing its
//! capabilities (timestamp-like first, then geopoint-like, reference-like,
//! bytes-like, then primitives and containers), so the inferencer never has
//! to guess at runtime types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::inference::TypeLabel;

/// A single value read from a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldValue {
    /// Explicit null or absent value
    Null,
    /// Boolean flag
    Boolean(bool),
    /// Whole number
    Integer(i64),
    /// Floating point number
    Float(f64),
    /// Text value
    String(String),
    /// Raw byte sequence
    Bytes(Vec<u8>),
    /// Nested map, keys in sorted order
    Map(BTreeMap<String, FieldValue>),
    /// Ordered list of values
    Array(Vec<FieldValue>),
    /// Point in time with timezone
    Timestamp(DateTime<Utc>),
    /// Latitude/longitude pair
    GeoPoint { latitude: f64, longitude: f64 },
    /// Path of another document in the same store
    Reference(String),
    /// A value matching no known shape, carrying its raw type name
    Other { type_name: String },
}

impl FieldValue {
    /// Returns the raw type name of this value.
    pub fn type_name(&self) -> &str {
        match self {
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Map(_) => "map",
            Self::Array(_) => "array",
            Self::Timestamp(_) => "timestamp",
            Self::GeoPoint { .. } => "geopoint",
            Self::Reference(_) => "reference",
            Self::Other { type_name } => type_name,
        }
    }

    /// Convenience constructor for map values.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, FieldValue)>,
    {
        Self::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(values: Vec<T>) -> Self {
        Self::Array(values.into_iter().map(Into::into).collect())
    }
}

/// Top-level field map of a document, iterated in sorted key order.
pub type DocumentData = BTreeMap<String, FieldValue>;

/// A document as returned by a listing call.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    /// Last path segment of the document
    pub id: String,
    /// `None` when the document exists only as a parent of subcollections
    pub data: Option<DocumentData>,
}

impl DocumentSnapshot {
    /// Creates a snapshot; `None` data marks a document without fields.
    pub fn new(id: impl Into<String>, data: Option<DocumentData>) -> Self {
        Self {
            id: id.into(),
            data,
        }
    }

    /// Returns the field map if the document carries any fields.
    pub fn fields(&self) -> Option<&DocumentData> {
        self.data.as_ref().filter(|data| !data.is_empty())
    }
}

/// Reference to a collection returned by a listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRef {
    /// Last path segment of the collection
    pub id: String,
}

impl CollectionRef {
    /// Creates a reference from a collection id.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// One described field of a sampled document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Field key
    pub name: String,
    /// Inferred type
    pub type_label: TypeLabel,
    /// Indentation level the field is rendered at
    pub level: usize,
}

/// Document count reported in a collection header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentCount {
    /// Exact count below the cap
    Exact(u64),
    /// The count query reached its cap
    AtLeast(u64),
    /// The count query timed out or failed
    Unknown,
}

impl DocumentCount {
    /// Builds a count from a capped count result.
    pub fn from_capped(count: u64, cap: u64) -> Self {
        if count >= cap {
            Self::AtLeast(cap)
        } else {
            Self::Exact(count)
        }
    }

    /// Returns the known count, if any.
    pub fn known(&self) -> Option<u64> {
        match self {
            Self::Exact(n) | Self::AtLeast(n) => Some(*n),
            Self::Unknown => None,
        }
    }
}

impl std::fmt::Display for DocumentCount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentCount::Exact(n) => write!(f, "{}", n),
            DocumentCount::AtLeast(n) => write!(f, "{}+", n),
            DocumentCount::Unknown => write!(f, "unknown"),
        }
    }
}

/// Final state of a visited collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    /// Documents were listed
    Ok,
    /// Document listing timed out
    TimedOut,
    /// Document listing was refused
    PermissionDenied,
    /// Document listing failed or the path was invalid
    Error,
}

impl std::fmt::Display for CollectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectionStatus::Ok => write!(f, "ok"),
            CollectionStatus::TimedOut => write!(f, "timed out"),
            CollectionStatus::PermissionDenied => write!(f, "permission denied"),
            CollectionStatus::Error => write!(f, "error"),
        }
    }
}

/// Per-path record written once by the traversal engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionSummary {
    /// Full collection path
    pub path: String,
    /// Documents with data that were described
    pub sampled_docs: usize,
    /// `None` when counting was disabled
    pub counted: Option<DocumentCount>,
    pub status: CollectionStatus,
}

impl CollectionSummary {
    /// Creates an `ok` summary with nothing sampled yet.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            sampled_docs: 0,
            counted: None,
            status: CollectionStatus::Ok,
        }
    }

    /// Count shown in the structure tree: counted if known, else sampled.
    ///
    /// A capped count renders as `N+`, the same text as the collection header.
    pub fn display_count(&self) -> String {
        match self.counted {
            Some(count) if count.known().is_some() => count.to_string(),
            _ => self.sampled_docs.to_string(),
        }
    }
}

/// Run counters. Only the traversal engine writes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExplorationStats {
    /// Collections visited
    pub collections: usize,
    /// Documents with data that were described
    pub documents: usize,
    /// Field descriptors emitted
    pub fields: usize,
    /// Store calls that hit the deadline
    pub timeouts: usize,
    /// Store calls and collections that failed
    pub errors: usize,
    /// Wall-clock time of the run
    pub duration: Duration,
}

impl ExplorationStats {
    /// Renders the statistics block lines.
    pub fn render_lines(&self) -> Vec<String> {
        vec![
            String::new(),
            "## Statistics".to_string(),
            format!("- Collections: {}", self.collections),
            format!("- Documents sampled: {}", self.documents),
            format!("- Fields analyzed: {}", self.fields),
            format!("- Duration: {:.2} seconds", self.duration.as_secs_f64()),
            format!("- Timeouts: {}", self.timeouts),
            format!("- Errors: {}", self.errors),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_count_display() {
        assert_eq!(DocumentCount::from_capped(12, 1000).to_string(), "12");
        assert_eq!(DocumentCount::from_capped(1000, 1000).to_string(), "1000+");
        assert_eq!(DocumentCount::Unknown.to_string(), "unknown");
        assert_eq!(DocumentCount::Unknown.known(), None);
    }

    #[test]
    fn test_summary_display_count_falls_back_to_sampled() {
        let mut summary = CollectionSummary::new("users");
        summary.sampled_docs = 3;
        assert_eq!(summary.display_count(), "3");

        summary.counted = Some(DocumentCount::Unknown);
        assert_eq!(summary.display_count(), "3");

        summary.counted = Some(DocumentCount::Exact(7));
        assert_eq!(summary.display_count(), "7");

        summary.counted = Some(DocumentCount::AtLeast(1000));
        assert_eq!(summary.display_count(), "1000+");
    }

    #[test]
    fn test_snapshot_fields_skips_empty_data() {
        assert!(DocumentSnapshot::new("a", None).fields().is_none());
        assert!(
            DocumentSnapshot::new("b", Some(DocumentData::new()))
                .fields()
                .is_none()
        );

        let mut data = DocumentData::new();
        data.insert("name".to_string(), FieldValue::from("x"));
        assert_eq!(
            DocumentSnapshot::new("c", Some(data)).fields().map(|d| d.len()),
            Some(1)
        );
    }

    #[test]
    fn test_stats_render_lines() {
        let stats = ExplorationStats {
            collections: 2,
            documents: 4,
            fields: 9,
            timeouts: 1,
            errors: 0,
            duration: Duration::from_millis(1234),
        };
        let lines = stats.render_lines();
        assert_eq!(lines[1], "## Statistics");
        assert!(lines.contains(&"- Collections: 2".to_string()));
        assert!(lines.contains(&"- Documents sampled: 4".to_string()));
        assert!(lines.contains(&"- Fields analyzed: 9".to_string()));
        assert!(lines.contains(&"- Duration: 1.23 seconds".to_string()));
        assert!(lines.contains(&"- Timeouts: 1".to_string()));
        assert!(lines.contains(&"- Errors: 0".to_string()));
    }

    #[test]
    fn test_type_name_fallback() {
        let value = FieldValue::Other {
            type_name: "VectorValue".to_string(),
        };
        assert_eq!(value.type_name(), "VectorValue");
        assert_eq!(FieldValue::from(vec![1_i64, 2]).type_name(), "array");
    }
}
