//! Error types for DocSurveyor operations.
//!
//! Traversal-time failures (timeouts, permission denials, store errors) are
//! converted into inline report markers by the traversal engine and never
//! reach callers of `explore_database`. The types here cover what remains:
//! startup configuration problems, invalid paths, I/O, serialization and
//! export validation.

use crate::validation::ValidationError;
use thiserror::Error;

/// Main error type for DocSurveyor operations.
#[derive(Debug, Error)]
pub enum DocSurveyorError {
    /// Configuration or startup error (fatal before traversal begins)
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A collection or document path is malformed
    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    /// I/O operation failed
    #[error("I/O operation failed: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Serialization or deserialization failed
    #[error("Serialization failed: {context}")]
    Serialization {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// Structured export did not pass validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The run was interrupted before completion
    #[error("Exploration cancelled")]
    Cancelled,
}

/// Convenience type alias for Results with DocSurveyorError
pub type Result<T> = std::result::Result<T, DocSurveyorError>;

impl DocSurveyorError {
    /// Creates a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates an invalid path error
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a serialization error with context
    pub fn serialization(context: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Serialization {
            context: context.into(),
            source,
        }
    }

    /// Returns true if this error is fatal at startup.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let error = DocSurveyorError::configuration("max_docs must be greater than 0");
        assert!(error.to_string().contains("max_docs must be greater than 0"));
        assert!(error.is_configuration());

        let error = DocSurveyorError::invalid_path("users//items", "empty segment");
        assert!(error.to_string().contains("users//items"));
        assert!(error.to_string().contains("empty segment"));
        assert!(!error.is_configuration());
    }

    #[test]
    fn test_io_error_is_source() {
        use std::error::Error as _;

        let error = DocSurveyorError::Io {
            context: "Failed to read snapshot".to_string(),
            source: std::io::Error::other("disk gone"),
        };
        assert!(error.to_string().contains("Failed to read snapshot"));
        let source = error.source().map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("disk gone"));
    }

    #[test]
    fn test_cancelled_display() {
        assert_eq!(DocSurveyorError::Cancelled.to_string(), "Exploration cancelled");
    }
}
