//! Exploration configuration.
//!
//! `ExplorerConfig` controls how much of the store is sampled and how long
//! any single remote call may take. `InferenceConfig` is the subset the
//! type inferencer needs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Upper bound for documents sampled per collection.
pub const MAX_DOCS_LIMIT: usize = 1000;

/// Cap applied to document count queries.
pub const COUNT_CAP: u64 = 1000;

/// Array element sampling settings used by type inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferenceConfig {
    /// Whether to inspect several leading elements of arrays
    pub sample_arrays: bool,
    /// Number of leading array elements to inspect
    pub array_sample_size: usize,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            sample_arrays: true,
            array_sample_size: 3,
        }
    }
}

/// Configuration for a schema exploration run.
///
/// # Example
/// ```rust
/// use docsurveyor_core::config::ExplorerConfig;
///
/// let config = ExplorerConfig::new()
///     .with_max_docs(10)
///     .with_max_depth(3)
///     .with_timeout_secs(15);
///
/// assert!(config.validate().is_ok());
/// assert_eq!(config.max_docs, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    /// Maximum number of documents sampled per collection
    pub max_docs: usize,
    /// Maximum traversal depth for subcollections
    pub max_depth: usize,
    /// Whether to run document count queries and render statistics
    pub include_stats: bool,
    /// Array sampling settings
    pub inference: InferenceConfig,
    /// Per-call timeout for remote store operations
    pub timeout: Duration,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            max_docs: 5,
            max_depth: 5,
            include_stats: true,
            inference: InferenceConfig::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl ExplorerConfig {
    /// Creates a new explorer config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    /// Returns a configuration error if any value is out of range
    pub fn validate(&self) -> crate::Result<()> {
        if self.max_docs == 0 {
            return Err(crate::error::DocSurveyorError::configuration(
                "max_docs must be greater than 0",
            ));
        }

        if self.max_docs > MAX_DOCS_LIMIT {
            return Err(crate::error::DocSurveyorError::configuration(format!(
                "max_docs should not exceed {} per collection",
                MAX_DOCS_LIMIT
            )));
        }

        if self.max_depth == 0 {
            return Err(crate::error::DocSurveyorError::configuration(
                "max_depth must be greater than 0",
            ));
        }

        if self.inference.array_sample_size == 0 {
            return Err(crate::error::DocSurveyorError::configuration(
                "array_sample_size must be greater than 0",
            ));
        }

        if self.timeout.is_zero() {
            return Err(crate::error::DocSurveyorError::configuration(
                "timeout must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Builder method to set documents sampled per collection.
    pub fn with_max_docs(mut self, max_docs: usize) -> Self {
        self.max_docs = max_docs;
        self
    }

    /// Builder method to set maximum traversal depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Builder method to enable/disable document counts and statistics.
    pub fn with_stats(mut self, enabled: bool) -> Self {
        self.include_stats = enabled;
        self
    }

    /// Builder method to enable/disable array element sampling.
    pub fn with_array_sampling(mut self, enabled: bool) -> Self {
        self.inference.sample_arrays = enabled;
        self
    }

    /// Builder method to set array sample size.
    pub fn with_array_sample_size(mut self, size: usize) -> Self {
        self.inference.array_sample_size = size;
        self
    }

    /// Builder method to set the per-call timeout in seconds.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(secs);
        self
    }

    /// Builder method to set the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
