//! Ordered in-memory document store.
//!
//! Backs snapshot files and tests. Listings come back in insertion order, and
//! faults (permission denials, errors, delays) can be injected per path and
//! operation to reproduce an unreliable remote store.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;

use super::{DocumentStore, StoreError, StoreResult};
use crate::models::{CollectionRef, DocumentData, DocumentSnapshot, FieldValue};

/// Store calls that faults can be attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOperation {
    /// `list_root_collections`; attach with an empty path
    ListRoot,
    /// `list_documents`
    ListDocuments,
    /// `count_up_to`
    Count,
    /// `list_child_collections`, keyed by document path
    ListChildren,
}

/// Injected behavior for one (path, operation) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    /// Fail with a permission denial
    PermissionDenied,
    /// Fail with a generic error carrying this message
    Error(String),
    /// Sleep before answering normally
    Delay(Duration),
}

#[derive(Debug, Clone)]
struct StoredCollection {
    path: String,
    documents: Vec<DocumentSnapshot>,
}

/// In-memory store keyed by slash-delimited paths.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    project_id: String,
    collections: Vec<StoredCollection>,
    faults: HashMap<(String, StoreOperation), Fault>,
}

/// Builder for [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryStoreBuilder {
    store: MemoryStore,
}

fn parent_document(collection_path: &str) -> Option<(&str, &str)> {
    let (document_path, _) = collection_path.rsplit_once('/')?;
    document_path.rsplit_once('/')
}

impl MemoryStore {
    /// Starts an empty store for `project_id`.
    pub fn builder(project_id: impl Into<String>) -> MemoryStoreBuilder {
        MemoryStoreBuilder {
            store: MemoryStore {
                project_id: project_id.into(),
                collections: Vec::new(),
                faults: HashMap::new(),
            },
        }
    }

    /// Replaces the project identifier.
    pub fn set_project_id(&mut self, project_id: impl Into<String>) {
        self.project_id = project_id.into();
    }

    /// Number of collections at any depth.
    pub fn collection_count(&self) -> usize {
        self.collections.len()
    }

    fn find(&self, path: &str) -> Option<&StoredCollection> {
        self.collections.iter().find(|c| c.path == path)
    }

    pub(super) fn ensure_collection(&mut self, path: &str) -> usize {
        if let Some(index) = self.collections.iter().position(|c| c.path == path) {
            return index;
        }

        // Subcollections are only reachable through a listed parent document.
        if let Some((parent_collection, document_id)) = parent_document(path) {
            let parent = self.ensure_collection(parent_collection);
            let documents = &mut self.collections[parent].documents;
            if !documents.iter().any(|d| d.id == document_id) {
                documents.push(DocumentSnapshot::new(document_id, None));
            }
        }

        self.collections.push(StoredCollection {
            path: path.to_string(),
            documents: Vec::new(),
        });
        self.collections.len() - 1
    }

    pub(super) fn insert_document(&mut self, collection_path: &str, document: DocumentSnapshot) {
        let index = self.ensure_collection(collection_path);
        let documents = &mut self.collections[index].documents;
        match documents.iter_mut().find(|d| d.id == document.id) {
            Some(existing) => *existing = document,
            None => documents.push(document),
        }
    }

    async fn check_fault(&self, path: &str, operation: StoreOperation) -> StoreResult<()> {
        match self.faults.get(&(path.to_string(), operation)) {
            None => Ok(()),
            Some(Fault::PermissionDenied) => Err(StoreError::permission_denied(path)),
            Some(Fault::Error(message)) => Err(StoreError::other(message.clone())),
            Some(Fault::Delay(delay)) => {
                tokio::time::sleep(*delay).await;
                Ok(())
            }
        }
    }
}

impl MemoryStoreBuilder {
    /// Adds an empty collection.
    pub fn collection(mut self, path: &str) -> Self {
        self.store.ensure_collection(path);
        self
    }

    /// Adds a document with fields, creating its collection if needed.
    pub fn document<K, I>(mut self, collection_path: &str, id: &str, fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, FieldValue)>,
    {
        let data: DocumentData = fields.into_iter().map(|(k, v)| (k.into(), v)).collect();
        self.store
            .insert_document(collection_path, DocumentSnapshot::new(id, Some(data)));
        self
    }

    /// Adds a document that has no data of its own.
    pub fn empty_document(mut self, collection_path: &str, id: &str) -> Self {
        self.store
            .insert_document(collection_path, DocumentSnapshot::new(id, None));
        self
    }

    /// Injects a fault. Use an empty path for [`StoreOperation::ListRoot`].
    pub fn fault(mut self, path: &str, operation: StoreOperation, fault: Fault) -> Self {
        self.store.faults.insert((path.to_string(), operation), fault);
        self
    }

    /// Finishes the store.
    pub fn build(self) -> MemoryStore {
        self.store
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn project_id(&self) -> String {
        self.project_id.clone()
    }

    async fn list_root_collections(&self) -> StoreResult<Vec<CollectionRef>> {
        self.check_fault("", StoreOperation::ListRoot).await?;
        Ok(self
            .collections
            .iter()
            .filter(|c| !c.path.contains('/'))
            .map(|c| CollectionRef::new(c.path.clone()))
            .collect())
    }

    async fn list_documents(
        &self,
        collection_path: &str,
        limit: usize,
    ) -> StoreResult<Vec<DocumentSnapshot>> {
        self.check_fault(collection_path, StoreOperation::ListDocuments)
            .await?;
        Ok(self
            .find(collection_path)
            .map(|c| c.documents.iter().take(limit).cloned().collect())
            .unwrap_or_default())
    }

    async fn count_up_to(&self, collection_path: &str, cap: u64) -> StoreResult<u64> {
        self.check_fault(collection_path, StoreOperation::Count).await?;
        let count = self.find(collection_path).map_or(0, |c| c.documents.len());
        Ok((count as u64).min(cap))
    }

    async fn list_child_collections(&self, document_path: &str) -> StoreResult<Vec<CollectionRef>> {
        self.check_fault(document_path, StoreOperation::ListChildren)
            .await?;
        Ok(self
            .collections
            .iter()
            .filter_map(|c| {
                let (parent, id) = c.path.rsplit_once('/')?;
                (parent == document_path).then(|| CollectionRef::new(id))
            })
            .collect())
    }
}
