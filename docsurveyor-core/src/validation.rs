//! JSON Schema validation for the structured export format.
//!
//! The JSON export is derived from the markdown report, so a mismatch between
//! the two would silently produce a broken file. Every export is checked
//! against the embedded schema before it is written.
//!
//! # Example
//! ```rust
//! use docsurveyor_core::validation::{initialize_schema_validator, validate_structured_output};
//! use serde_json::json;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! initialize_schema_validator()?;
//! let export = json!({
//!     "format_version": "1.0",
//!     "collections": {
//!         "users": { "documents": { "alice": { "fields": [
//!             { "name": "age", "type": "integer" }
//!         ] } } }
//!     }
//! });
//!
//! validate_structured_output(&export)?;
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

use jsonschema::Validator;
use serde_json::Value;
use std::sync::OnceLock;
use thiserror::Error;

/// Export validation errors
#[derive(Debug, Error)]
pub enum ValidationError {
    /// Schema compilation failed during initialization
    #[error("JSON Schema compilation failed: {message}")]
    SchemaCompilation { message: String },

    /// Validation failed with specific field errors
    #[error("Export validation failed with {error_count} errors: {errors:?}")]
    ValidationFailed {
        error_count: usize,
        errors: Vec<String>,
    },

    /// Unsupported format version detected
    #[error("Unsupported format version '{version}'. Supported versions: {supported:?}")]
    UnsupportedVersion {
        version: String,
        supported: Vec<String>,
    },

    /// JSON parsing error
    #[error("JSON parsing failed: {source}")]
    JsonParsing {
        #[from]
        source: serde_json::Error,
    },
}

const SUPPORTED_VERSIONS: &[&str] = &["1.0"];

/// Embedded JSON Schema for v1.0 exports
const EXPORT_SCHEMA_V1_0: &str = r#"{
  "$schema": "https://json-schema.org/draft/2020-12/schema",
  "title": "DocSurveyor Structured Schema Export v1.0",
  "type": "object",
  "required": ["format_version", "collections"],
  "properties": {
    "format_version": { "type": "string", "pattern": "^1\\.0$" },
    "project_id": { "type": "string" },
    "collections": {
      "type": "object",
      "additionalProperties": {
        "type": "object",
        "required": ["documents"],
        "properties": {
          "documents": {
            "type": "object",
            "additionalProperties": {
              "type": "object",
              "required": ["fields"],
              "properties": {
                "fields": {
                  "type": "array",
                  "items": {
                    "type": "object",
                    "required": ["name", "type"],
                    "properties": {
                      "name": { "type": "string", "minLength": 1 },
                      "type": { "type": "string", "minLength": 1 }
                    },
                    "additionalProperties": false
                  }
                }
              }
            }
          }
        }
      }
    }
  }
}"#;

static COMPILED_SCHEMA: OnceLock<Validator> = OnceLock::new();

/// Compiles the embedded schema once and caches it.
///
/// # Errors
/// Returns `ValidationError::SchemaCompilation` if the embedded schema is invalid.
pub fn initialize_schema_validator() -> Result<(), ValidationError> {
    if COMPILED_SCHEMA.get().is_some() {
        return Ok(());
    }

    let schema_json: Value = serde_json::from_str(EXPORT_SCHEMA_V1_0).map_err(|e| {
        ValidationError::SchemaCompilation {
            message: format!("Failed to parse embedded schema: {}", e),
        }
    })?;

    let compiled = jsonschema::validator_for(&schema_json).map_err(|e| {
        ValidationError::SchemaCompilation {
            message: format!("Schema compilation error: {}", e),
        }
    })?;

    let _ = COMPILED_SCHEMA.set(compiled);

    Ok(())
}

/// Validates a structured export.
///
/// Checks the format version first, then the overall shape.
///
/// # Errors
/// Returns a validation error describing the first problem found
pub fn validate_structured_output(json_value: &Value) -> Result<(), ValidationError> {
    initialize_schema_validator()?;
    let schema = COMPILED_SCHEMA
        .get()
        .ok_or_else(|| ValidationError::SchemaCompilation {
            message: "Export validator not initialized".to_string(),
        })?;

    validate_format_version(json_value)?;

    if let Err(validation_error) = schema.validate(json_value) {
        return Err(ValidationError::ValidationFailed {
            error_count: 1,
            errors: vec![format!("Export validation failed: {}", validation_error)],
        });
    }

    Ok(())
}

/// Parses and validates an export from its JSON text.
///
/// # Errors
/// Returns `JsonParsing` for invalid JSON, otherwise as `validate_structured_output`
pub fn validate_structured_str(json: &str) -> Result<(), ValidationError> {
    let value: Value = serde_json::from_str(json)?;
    validate_structured_output(&value)
}

fn validate_format_version(json_value: &Value) -> Result<(), ValidationError> {
    let version = json_value
        .get("format_version")
        .and_then(|v| v.as_str())
        .ok_or_else(|| ValidationError::ValidationFailed {
            error_count: 1,
            errors: vec!["Missing required field 'format_version'".to_string()],
        })?;

    if !SUPPORTED_VERSIONS.contains(&version) {
        return Err(ValidationError::UnsupportedVersion {
            version: version.to_string(),
            supported: SUPPORTED_VERSIONS.iter().map(|s| s.to_string()).collect(),
        });
    }

    Ok(())
}
