//! Structured form of a rendered report.
//!
//! The markdown report is the source of truth; this module reads it back
//! line by line. Collection headers open a collection, document headers open
//! a document in the collection one level above them, and field bullets
//! attach to the most recently opened document.
//! Nested fields appear flattened in report order.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Format version written into every structured export.
pub const FORMAT_VERSION: &str = "1.0";

const COLLECTION_MARKER: &str = "### Collection: `";
const DOCUMENT_MARKER: &str = "#### Document: `";
const FIELD_MARKER: &str = "- `";
const PROJECT_MARKER: &str = "Project: `";

/// One field bullet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredField {
    /// Field name; nested fields keep their own key only
    pub name: String,
    /// Rendered type label
    #[serde(rename = "type")]
    pub field_type: String,
}

/// Fields of one sampled document, in report order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredDocument {
    /// Flattened field list
    pub fields: Vec<StructuredField>,
}

/// Sampled documents of one collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredCollection {
    /// Documents keyed by id
    pub documents: BTreeMap<String, StructuredDocument>,
}

/// Collection -> document -> fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredSchema {
    /// Export format version
    pub format_version: String,
    /// Project line of the report, if present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    /// Collections keyed by full path
    pub collections: BTreeMap<String, StructuredCollection>,
}

impl Default for StructuredSchema {
    fn default() -> Self {
        Self {
            format_version: FORMAT_VERSION.to_string(),
            project_id: None,
            collections: BTreeMap::new(),
        }
    }
}

/// Text between the first pair of backticks.
fn quoted(line: &str) -> Option<&str> {
    line.split('`').nth(1)
}

fn parse_field(line: &str) -> Option<StructuredField> {
    let rest = line.trim_start().strip_prefix(FIELD_MARKER)?;
    let (name, tail) = rest.split_once('`')?;
    let field_type = tail.strip_prefix(" (")?;
    let end = field_type.rfind(')')?;
    Some(StructuredField {
        name: name.to_string(),
        field_type: field_type[..end].to_string(),
    })
}

/// Number of leading spaces on a line.
fn indent_width(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// A collection header seen while parsing, with the document currently open in it.
#[derive(Debug)]
struct OpenCollection {
    indent: usize,
    path: String,
    document: Option<String>,
}

/// Parses a rendered markdown report.
///
/// Subcollection blocks are nested under their parent document, so a
/// document header belongs to the open collection whose header sits one
/// level (two spaces) shallower. Deeper collections are closed when a
/// shallower document or collection header appears.
pub fn parse_report(markdown: &str) -> StructuredSchema {
    let mut schema = StructuredSchema::default();
    let mut open: Vec<OpenCollection> = Vec::new();

    for line in markdown.lines() {
        let indent = indent_width(line);

        if line.contains(COLLECTION_MARKER) {
            if let Some(path) = quoted(line) {
                open.retain(|c| c.indent < indent);
                schema.collections.entry(path.to_string()).or_default();
                open.push(OpenCollection {
                    indent,
                    path: path.to_string(),
                    document: None,
                });
            }
        } else if line.contains(DOCUMENT_MARKER) {
            let Some(id) = quoted(line) else {
                continue;
            };
            open.retain(|c| c.indent + 2 <= indent);
            if let Some(current) = open.last_mut()
                && current.indent + 2 == indent
                && let Some(entry) = schema.collections.get_mut(&current.path)
            {
                entry.documents.entry(id.to_string()).or_default();
                current.document = Some(id.to_string());
            }
        } else if let Some(field) = parse_field(line) {
            if let Some(current) = open.last()
                && let Some(document) = &current.document
                && let Some(entry) = schema
                    .collections
                    .get_mut(&current.path)
                    .and_then(|c| c.documents.get_mut(document))
            {
                entry.fields.push(field);
            }
        } else if schema.project_id.is_none() && line.starts_with(PROJECT_MARKER) {
            schema.project_id = quoted(line).map(str::to_string);
        }
    }

    schema
}
