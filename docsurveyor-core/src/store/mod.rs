//! Document store contract and bundled store implementations.
//!
//! The traversal engine only ever reads from a store through the
//! [`DocumentStore`] trait. Every call it makes is wrapped by the
//! [`TimeoutGuard`](crate::guard::TimeoutGuard), so implementations do not
//! need their own deadlines.
//!
//! # Module Structure
//! - `memory`: ordered in-memory store with fault injection
//! - `snapshot`: loads a JSON snapshot file into a `MemoryStore`

use crate::models::{CollectionRef, DocumentSnapshot};
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod snapshot;

pub use memory::{Fault, MemoryStore, StoreOperation};
pub use snapshot::{from_json_str, load_snapshot};

/// Errors a store call can fail with.
///
/// Permission denials are kept distinct because the engine renders them with
/// their own marker and does not count them as generic errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The caller may not read this path
    #[error("Permission denied for '{path}'")]
    PermissionDenied { path: String },

    /// Any other store failure
    #[error("{message}")]
    Other { message: String },
}

/// Result alias for store calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// Creates a permission denied error
    pub fn permission_denied(path: impl Into<String>) -> Self {
        Self::PermissionDenied { path: path.into() }
    }

    /// Creates a generic store error
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Returns true for permission denials.
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }
}

/// Read-only access to a hierarchical document store.
///
/// # Read-Only Guarantee
/// The contract exposes listing and sampling calls only. Nothing here can
/// write back to the store.
///
/// # Object Safety
/// This trait is object-safe. The engine holds it as
/// `Arc<dyn DocumentStore>` so each bounded call can move a clone of the
/// handle into its own task.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Identifier of the project or database being explored.
    fn project_id(&self) -> String;

    /// Lists the top-level collections in listing order.
    ///
    /// # Errors
    /// Returns `PermissionDenied` if the caller may not list collections,
    /// or another `StoreError` on failure
    async fn list_root_collections(&self) -> StoreResult<Vec<CollectionRef>>;

    /// Streams at most `limit` documents of a collection, in store order.
    ///
    /// # Arguments
    /// * `collection_path` - Slash-delimited collection path
    /// * `limit` - Maximum number of documents to return
    ///
    /// # Errors
    /// Returns `PermissionDenied` if the collection may not be read
    async fn list_documents(
        &self,
        collection_path: &str,
        limit: usize,
    ) -> StoreResult<Vec<DocumentSnapshot>>;

    /// Counts documents in a collection, stopping at `cap`.
    ///
    /// A result equal to `cap` means "at least `cap`".
    async fn count_up_to(&self, collection_path: &str, cap: u64) -> StoreResult<u64>;

    /// Lists the child collections of a single document.
    async fn list_child_collections(&self, document_path: &str) -> StoreResult<Vec<CollectionRef>>;
}
