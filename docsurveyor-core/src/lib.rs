//! Core schema inference and traversal engine for DocSurveyor.
//!
//! Schemaless document stores declare no schema, so DocSurveyor infers one by
//! sampling live data. This crate walks a store's collections, documents and
//! subcollections, labels every sampled value with a type, and produces a
//! report with a structure tree and run statistics.
//!
//! # Guarantees
//! - All store access is read-only
//! - Every remote call is bounded by a timeout
//! - Each collection path is visited at most once per run
//! - A report is produced even when the store fails completely
//!
//! # Architecture
//! - `inference`: pure value to type label mapping
//! - `guard`: deadline and outcome classification for store calls
//! - `traversal`: the depth-first walker and its per-run context
//! - `tree`: structure tree rendering over collection summaries
//! - `report`: markdown rendering and the structured JSON form
//! - `store`: the store contract plus in-memory and snapshot stores

pub mod config;
pub mod error;
pub mod guard;
pub mod inference;
pub mod logging;
pub mod models;
pub mod report;
pub mod store;
pub mod traversal;
pub mod tree;
pub mod validation;

// Re-export commonly used types
pub use config::{ExplorerConfig, InferenceConfig};
pub use error::{DocSurveyorError, Result};
pub use guard::{BoundedOutcome, Escalation, TimeoutGuard};
pub use inference::{TypeLabel, describe_fields, describe_type};
pub use models::{
    CollectionRef, CollectionStatus, CollectionSummary, DocumentCount, DocumentData,
    DocumentSnapshot, ExplorationStats, FieldDescriptor, FieldValue,
};
pub use report::{ExplorationOutcome, SchemaReport, StructuredSchema};
pub use store::{DocumentStore, MemoryStore, StoreError, StoreResult};
pub use traversal::{TraversalContext, TraversalEngine};
pub use tree::build_tree;
pub use validation::{ValidationError, initialize_schema_validator, validate_structured_output};
