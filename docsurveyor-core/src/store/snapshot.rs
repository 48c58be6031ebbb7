//! JSON snapshot loading.
//!
//! A snapshot is an export of a document store:
//!
//! ```json
//! {
//!   "project_id": "demo",
//!   "collections": [
//!     {
//!       "id": "users",
//!       "documents": [
//!         { "id": "alice", "data": { "age": 30 }, "collections": [] }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! Field values are decoded into [`FieldValue`] by probing for store-specific
//! shapes before falling back to plain JSON types.

use std::path::Path;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::MemoryStore;
use crate::error::DocSurveyorError;
use crate::models::{DocumentData, DocumentSnapshot, FieldValue};
use crate::Result;

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    project_id: String,
    #[serde(default)]
    collections: Vec<SnapshotCollection>,
}

#[derive(Debug, Deserialize)]
struct SnapshotCollection {
    id: String,
    #[serde(default)]
    documents: Vec<SnapshotDocument>,
}

#[derive(Debug, Deserialize)]
struct SnapshotDocument {
    id: String,
    #[serde(default)]
    data: Option<Map<String, Value>>,
    #[serde(default)]
    collections: Vec<SnapshotCollection>,
}

/// Loads a snapshot file into a [`MemoryStore`].
///
/// # Errors
/// Returns a configuration error if the file is missing or malformed, or an
/// I/O error if it cannot be read
pub async fn load_snapshot(path: &Path) -> Result<MemoryStore> {
    if !path.is_file() {
        return Err(DocSurveyorError::configuration(format!(
            "Snapshot file not found: {}",
            path.display()
        )));
    }

    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| DocSurveyorError::Io {
            context: format!("Failed to read snapshot {}", path.display()),
            source: e,
        })?;

    from_json_str(&contents)
}

/// Parses snapshot JSON into a [`MemoryStore`].
///
/// # Errors
/// Returns a configuration error if the JSON does not describe a snapshot
/// or contains invalid collection or document ids
pub fn from_json_str(json: &str) -> Result<MemoryStore> {
    let snapshot: SnapshotFile = serde_json::from_str(json).map_err(|e| {
        DocSurveyorError::configuration(format!("Malformed snapshot: {}", e))
    })?;

    let mut store = MemoryStore::builder(snapshot.project_id).build();
    for collection in &snapshot.collections {
        load_collection(&mut store, None, collection)?;
    }

    debug!("Loaded snapshot with {} collections", store.collection_count());
    Ok(store)
}

fn check_id(id: &str, kind: &str) -> Result<()> {
    if id.is_empty() || id.contains('/') {
        return Err(DocSurveyorError::configuration(format!(
            "Invalid {} id '{}' in snapshot",
            kind, id
        )));
    }
    Ok(())
}

fn load_collection(
    store: &mut MemoryStore,
    parent_document: Option<&str>,
    collection: &SnapshotCollection,
) -> Result<()> {
    check_id(&collection.id, "collection")?;
    let path = match parent_document {
        Some(parent) => format!("{}/{}", parent, collection.id),
        None => collection.id.clone(),
    };
    store.ensure_collection(&path);

    for document in &collection.documents {
        check_id(&document.id, "document")?;
        let data = document.data.as_ref().map(decode_fields);
        store.insert_document(&path, DocumentSnapshot::new(document.id.clone(), data));

        let document_path = format!("{}/{}", path, document.id);
        for child in &document.collections {
            load_collection(store, Some(&document_path), child)?;
        }
    }

    Ok(())
}

fn decode_fields(map: &Map<String, Value>) -> DocumentData {
    map.iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

/// Decodes a raw JSON value.
///
/// Objects are probed in order: timestamp, geopoint, reference, bytes,
/// explicit `$type`, and only then treated as a plain map.
pub fn decode_value(value: &Value) -> FieldValue {
    match value {
        Value::Null => FieldValue::Null,
        Value::Bool(b) => FieldValue::Boolean(*b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => FieldValue::Integer(i),
            None => FieldValue::Float(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => FieldValue::String(s.clone()),
        Value::Array(items) => FieldValue::Array(items.iter().map(decode_value).collect()),
        Value::Object(map) => decode_object(map),
    }
}

fn decode_object(map: &Map<String, Value>) -> FieldValue {
    if let Some(timestamp) = probe_timestamp(map) {
        return FieldValue::Timestamp(timestamp);
    }

    if let Some((latitude, longitude)) = probe_geopoint(map) {
        return FieldValue::GeoPoint {
            latitude,
            longitude,
        };
    }

    if let Some(path) = ["$ref", "_path"]
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_str))
    {
        return FieldValue::Reference(path.to_string());
    }

    if let Some(bytes) = map
        .get("$bytes")
        .and_then(Value::as_str)
        .and_then(|encoded| STANDARD.decode(encoded).ok())
    {
        return FieldValue::Bytes(bytes);
    }

    if let Some(type_name) = map.get("$type").and_then(Value::as_str) {
        return FieldValue::Other {
            type_name: type_name.to_string(),
        };
    }

    FieldValue::Map(decode_fields(map))
}

fn probe_timestamp(map: &Map<String, Value>) -> Option<DateTime<Utc>> {
    if let (Some(seconds), Some(nanos)) = (
        map.get("_seconds").and_then(Value::as_i64),
        map.get("_nanoseconds").and_then(Value::as_u64),
    ) {
        return DateTime::from_timestamp(seconds, u32::try_from(nanos).ok()?);
    }

    map.get("$timestamp")
        .and_then(Value::as_str)
        .and_then(|text| DateTime::parse_from_rfc3339(text).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

fn probe_geopoint(map: &Map<String, Value>) -> Option<(f64, f64)> {
    [("latitude", "longitude"), ("_latitude", "_longitude")]
        .iter()
        .find_map(|(lat, lon)| {
            let latitude = map.get(*lat)?.as_f64()?;
            let longitude = map.get(*lon)?.as_f64()?;
            Some((latitude, longitude))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::DocumentStore;
    use serde_json::json;

    #[test]
    fn test_decode_primitives() {
        assert_eq!(decode_value(&json!(null)), FieldValue::Null);
        assert_eq!(decode_value(&json!(true)), FieldValue::Boolean(true));
        assert_eq!(decode_value(&json!(5)), FieldValue::Integer(5));
        assert_eq!(decode_value(&json!(1.5)), FieldValue::Float(1.5));
        assert_eq!(decode_value(&json!("x")), FieldValue::from("x"));
    }

    #[test]
    fn test_decode_store_shapes() {
        assert!(matches!(
            decode_value(&json!({"_seconds": 1_700_000_000, "_nanoseconds": 0})),
            FieldValue::Timestamp(_)
        ));
        assert!(matches!(
            decode_value(&json!({"$timestamp": "2024-05-01T10:00:00Z"})),
            FieldValue::Timestamp(_)
        ));
        assert_eq!(
            decode_value(&json!({"latitude": 1.0, "longitude": 2.0})),
            FieldValue::GeoPoint {
                latitude: 1.0,
                longitude: 2.0
            }
        );
        assert_eq!(
            decode_value(&json!({"_latitude": 3, "_longitude": 4})),
            FieldValue::GeoPoint {
                latitude: 3.0,
                longitude: 4.0
            }
        );
        assert_eq!(
            decode_value(&json!({"$ref": "users/alice"})),
            FieldValue::Reference("users/alice".to_string())
        );
        assert_eq!(
            decode_value(&json!({"$bytes": "AQI="})),
            FieldValue::Bytes(vec![1, 2])
        );
        assert_eq!(
            decode_value(&json!({"$type": "VectorValue", "values": [1, 2]})),
            FieldValue::Other {
                type_name: "VectorValue".to_string()
            }
        );
    }

    #[test]
    fn test_non_numeric_coordinates_stay_a_map() {
        let value = decode_value(&json!({"latitude": "north", "longitude": 2.0}));
        assert!(matches!(value, FieldValue::Map(_)));
    }

    #[tokio::test]
    async fn test_from_json_str_builds_hierarchy() {
        let store = from_json_str(
            r#"{
                "project_id": "demo",
                "collections": [
                    {"id": "users", "documents": [
                        {"id": "alice", "data": {"age": 30}, "collections": [
                            {"id": "orders", "documents": [{"id": "o1", "data": {"total": 9.5}}]}
                        ]},
                        {"id": "ghost"}
                    ]}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(store.project_id(), "demo");
        let docs = store.list_documents("users", 10).await.unwrap();
        assert_eq!(docs.len(), 2);
        assert!(docs[1].data.is_none());
        let children = store.list_child_collections("users/alice").await.unwrap();
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, "orders");
    }

    #[test]
    fn test_malformed_snapshot_is_configuration_error() {
        let err = from_json_str("{\"collections\": []}").unwrap_err();
        assert!(err.is_configuration());

        let err = from_json_str(r#"{"project_id": "p", "collections": [{"id": "a/b"}]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("Invalid collection id"));
    }

    #[tokio::test]
    async fn test_missing_file_is_configuration_error() {
        let err = load_snapshot(Path::new("/nonexistent/snapshot.json"))
            .await
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
