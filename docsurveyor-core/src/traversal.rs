//! Depth-first traversal of collections, documents and subcollections.
//!
//! The engine walks the store one collection at a time. Every remote call
//! goes through the [`TimeoutGuard`], every field through
//! [`describe_fields`], and all per-run state lives in a single
//! [`TraversalContext`]. Failures below the root listing are rendered as
//! inline markers, so a run always produces a report.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{COUNT_CAP, ExplorerConfig};
use crate::error::DocSurveyorError;
use crate::guard::{BoundedOutcome, Escalation, TimeoutGuard};
use crate::inference::describe_fields;
use crate::models::{
    CollectionStatus, CollectionSummary, DocumentCount, ExplorationStats, FieldDescriptor,
};
use crate::report::{ExplorationOutcome, SchemaReport};
use crate::store::DocumentStore;
use crate::tree::build_tree;
use crate::Result;

/// Marker lines emitted into the report body.
pub mod markers {
    /// Collection listed with no documents.
    pub const NO_DOCUMENTS: &str = "*No documents found*";
    /// Document listing was refused.
    pub const PERMISSION_DENIED: &str = "*Permission denied when accessing documents*";
    /// Document listing hit the deadline.
    pub const DOCUMENTS_TIMED_OUT: &str = "*Timed out while fetching documents.*";
    /// Child listing of one document hit the deadline.
    pub const SUBCOLLECTIONS_TIMED_OUT: &str = "*Timed out while fetching subcollections.*";
    /// Child listing of one document was refused.
    pub const SUBCOLLECTIONS_DENIED: &str = "*Permission denied when fetching subcollections*";
    /// Root listing hit the deadline.
    pub const COLLECTIONS_TIMED_OUT: &str = "*Timed out while listing collections.*";
    /// Root listing returned nothing.
    pub const NO_COLLECTIONS: &str = "*No collections found in the database.*";
    /// Appended once when the run is interrupted.
    pub const CANCELLED: &str = "*Exploration cancelled by user.*";
}

/// Indentation for a nesting level, two spaces per level.
pub fn indent(level: usize) -> String {
    "  ".repeat(level)
}

/// Renders a field bullet line.
pub fn render_field(field: &FieldDescriptor) -> String {
    format!(
        "{}- `{}` ({})",
        indent(field.level),
        field.name,
        field.type_label
    )
}

/// Checks that `path` names a collection: an odd number of non-empty segments.
pub fn validate_collection_path(path: &str) -> Result<()> {
    let segments: Vec<&str> = path.split('/').collect();
    if segments.iter().any(|segment| segment.is_empty()) {
        return Err(DocSurveyorError::invalid_path(path, "empty path segment"));
    }
    if segments.len() % 2 == 0 {
        return Err(DocSurveyorError::invalid_path(
            path,
            "collection paths have an odd number of segments",
        ));
    }
    Ok(())
}

/// Per-run mutable state.
#[derive(Debug)]
pub struct TraversalContext {
    visited: HashSet<String>,
    stats: ExplorationStats,
    summaries: BTreeMap<String, CollectionSummary>,
    cancelled: bool,
    started: Instant,
}

impl TraversalContext {
    fn new() -> Self {
        Self {
            visited: HashSet::new(),
            stats: ExplorationStats::default(),
            summaries: BTreeMap::new(),
            cancelled: false,
            started: Instant::now(),
        }
    }

    /// Counters collected so far.
    pub fn stats(&self) -> &ExplorationStats {
        &self.stats
    }

    /// Summaries of visited paths, keyed by path.
    pub fn summaries(&self) -> &BTreeMap<String, CollectionSummary> {
        &self.summaries
    }

    /// Whether `path` has already been explored in this run.
    pub fn is_visited(&self, path: &str) -> bool {
        self.visited.contains(path)
    }

    /// Whether the run stopped on cancellation.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Walks a [`DocumentStore`] and produces a [`SchemaReport`].
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use docsurveyor_core::config::ExplorerConfig;
/// use docsurveyor_core::models::FieldValue;
/// use docsurveyor_core::store::MemoryStore;
/// use docsurveyor_core::traversal::TraversalEngine;
///
/// # #[tokio::main]
/// # async fn main() {
/// let store = MemoryStore::builder("demo")
///     .document("users", "alice", [("age", FieldValue::Integer(30))])
///     .build();
///
/// let engine = TraversalEngine::new(Arc::new(store), ExplorerConfig::default()).unwrap();
/// let report = engine.explore_database().await;
/// assert!(report.render().contains("- `age` (integer)"));
/// # }
/// ```
pub struct TraversalEngine {
    store: Arc<dyn DocumentStore>,
    config: ExplorerConfig,
    guard: TimeoutGuard,
    ctx: TraversalContext,
}

impl TraversalEngine {
    /// Creates an engine for one run.
    ///
    /// # Errors
    /// Returns a configuration error if `config` does not validate
    pub fn new(store: Arc<dyn DocumentStore>, config: ExplorerConfig) -> Result<Self> {
        config.validate()?;
        let guard = TimeoutGuard::new(config.timeout);
        Ok(Self {
            store,
            config,
            guard,
            ctx: TraversalContext::new(),
        })
    }

    /// Stops the run when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.guard = self.guard.with_cancellation(token);
        self
    }

    /// Per-run state, mostly for inspection in tests.
    pub fn context(&self) -> &TraversalContext {
        &self.ctx
    }

    /// Explores one collection and everything below it.
    ///
    /// Returns no lines and changes nothing when the path was already
    /// visited, `depth >= max_depth`, or the run was cancelled.
    pub fn explore_collection(&mut self, path: String, depth: usize) -> BoxFuture<'_, Vec<String>> {
        async move {
            if self.ctx.cancelled
                || depth >= self.config.max_depth
                || self.ctx.visited.contains(&path)
            {
                return Vec::new();
            }

            self.ctx.visited.insert(path.clone());
            self.ctx.stats.collections += 1;
            debug!("Exploring collection {} at depth {}", path, depth);

            let mut summary = CollectionSummary::new(path.clone());
            let mut lines = Vec::new();

            match self.walk_collection(&path, depth, &mut summary, &mut lines).await {
                Ok(()) => {}
                Err(DocSurveyorError::Cancelled) => {
                    self.ctx.cancelled = true;
                }
                Err(e) => {
                    self.ctx.stats.errors += 1;
                    summary.status = CollectionStatus::Error;
                    lines.push(format!("{}### `{}`: *Error: {}*", indent(depth), path, e));
                    error!("Error processing collection {}: {}", path, e);
                }
            }

            self.ctx.summaries.insert(path, summary);
            lines
        }
        .boxed()
    }

    async fn walk_collection(
        &mut self,
        path: &str,
        depth: usize,
        summary: &mut CollectionSummary,
        lines: &mut Vec<String>,
    ) -> Result<()> {
        validate_collection_path(path)?;

        if self.config.include_stats {
            summary.counted = Some(self.count_documents(path).await?);
        }

        let mut header = format!("{}### Collection: `{}`", indent(depth), path);
        if let Some(count) = summary.counted {
            header.push_str(&format!(" ({} documents)", count));
        }
        lines.push(header);

        let marker_indent = indent(depth + 1);
        let store = Arc::clone(&self.store);
        let owned_path = path.to_string();
        let limit = self.config.max_docs;
        let outcome = self
            .guard
            .run_bounded(
                &format!("list documents in {}", path),
                &mut self.ctx.stats,
                async move { store.list_documents(&owned_path, limit).await },
            )
            .await;

        let documents = match outcome {
            Ok(BoundedOutcome::Completed(documents)) => documents,
            Ok(BoundedOutcome::TimedOut) => {
                summary.status = CollectionStatus::TimedOut;
                lines.push(format!("{}{}", marker_indent, markers::DOCUMENTS_TIMED_OUT));
                return Ok(());
            }
            Ok(BoundedOutcome::Failed(e)) => {
                summary.status = CollectionStatus::Error;
                lines.push(format!("{}*Error accessing documents: {}*", marker_indent, e));
                return Ok(());
            }
            Err(Escalation::PermissionDenied(e)) => {
                debug!("{}", e);
                summary.status = CollectionStatus::PermissionDenied;
                lines.push(format!("{}{}", marker_indent, markers::PERMISSION_DENIED));
                return Ok(());
            }
            Err(Escalation::Cancelled) => return Err(DocSurveyorError::Cancelled),
        };

        if documents.is_empty() {
            lines.push(format!("{}{}", marker_indent, markers::NO_DOCUMENTS));
            return Ok(());
        }

        for document in documents {
            let Some(data) = document.fields() else {
                debug!("Skipping document {} in {} without data", document.id, path);
                continue;
            };

            self.ctx.stats.documents += 1;
            summary.sampled_docs += 1;
            lines.push(format!("{}#### Document: `{}`", marker_indent, document.id));

            let fields = describe_fields(data, depth + 2, &self.config.inference);
            self.ctx.stats.fields += fields.len();
            lines.extend(fields.iter().map(render_field));

            if depth + 1 < self.config.max_depth {
                let document_path = format!("{}/{}", path, document.id);
                self.explore_children(&document_path, depth, lines).await?;
            }
        }

        Ok(())
    }

    async fn count_documents(&mut self, path: &str) -> Result<DocumentCount> {
        let store = Arc::clone(&self.store);
        let owned_path = path.to_string();
        let outcome = self
            .guard
            .run_bounded(
                &format!("count documents in {}", path),
                &mut self.ctx.stats,
                async move { store.count_up_to(&owned_path, COUNT_CAP).await },
            )
            .await;

        Ok(match outcome {
            Ok(BoundedOutcome::Completed(count)) => DocumentCount::from_capped(count, COUNT_CAP),
            Ok(BoundedOutcome::TimedOut) | Ok(BoundedOutcome::Failed(_)) => DocumentCount::Unknown,
            Err(Escalation::PermissionDenied(e)) => {
                warn!("Failed to count documents in {}: {}", path, e);
                DocumentCount::Unknown
            }
            Err(Escalation::Cancelled) => return Err(DocSurveyorError::Cancelled),
        })
    }

    async fn explore_children(
        &mut self,
        document_path: &str,
        depth: usize,
        lines: &mut Vec<String>,
    ) -> Result<()> {
        let marker_indent = indent(depth + 2);
        let store = Arc::clone(&self.store);
        let owned_path = document_path.to_string();
        let outcome = self
            .guard
            .run_bounded(
                &format!("list subcollections of {}", document_path),
                &mut self.ctx.stats,
                async move { store.list_child_collections(&owned_path).await },
            )
            .await;

        let children = match outcome {
            Ok(BoundedOutcome::Completed(children)) => children,
            Ok(BoundedOutcome::TimedOut) => {
                lines.push(format!("{}{}", marker_indent, markers::SUBCOLLECTIONS_TIMED_OUT));
                return Ok(());
            }
            Ok(BoundedOutcome::Failed(e)) => {
                lines.push(format!("{}*Error fetching subcollections: {}*", marker_indent, e));
                return Ok(());
            }
            Err(Escalation::PermissionDenied(_)) => {
                lines.push(format!("{}{}", marker_indent, markers::SUBCOLLECTIONS_DENIED));
                return Ok(());
            }
            Err(Escalation::Cancelled) => return Err(DocSurveyorError::Cancelled),
        };

        for child in children {
            let child_path = format!("{}/{}", document_path, child.id);
            let child_lines = self.explore_collection(child_path, depth + 2).await;
            lines.extend(child_lines);
            if self.ctx.cancelled {
                return Err(DocSurveyorError::Cancelled);
            }
        }

        Ok(())
    }

    /// Explores every root collection and assembles the report.
    ///
    /// Never fails: store failures, timeouts and cancellation all end up in
    /// the report itself.
    pub async fn explore_database(mut self) -> SchemaReport {
        let project_id = self.store.project_id();
        info!("Starting schema exploration for project {}", project_id);

        let mut lines = Vec::new();
        let store = Arc::clone(&self.store);
        let outcome = self
            .guard
            .run_bounded(
                "list root collections",
                &mut self.ctx.stats,
                async move { store.list_root_collections().await },
            )
            .await;

        let roots = match outcome {
            Ok(BoundedOutcome::Completed(roots)) => roots,
            Ok(BoundedOutcome::TimedOut) => {
                lines.push(markers::COLLECTIONS_TIMED_OUT.to_string());
                Vec::new()
            }
            Ok(BoundedOutcome::Failed(e)) | Err(Escalation::PermissionDenied(e)) => {
                lines.push(format!("*Error listing collections: {}*", e));
                Vec::new()
            }
            Err(Escalation::Cancelled) => {
                self.ctx.cancelled = true;
                Vec::new()
            }
        };

        if lines.is_empty() && !self.ctx.cancelled && roots.is_empty() {
            lines.push(markers::NO_COLLECTIONS.to_string());
        }

        for root in roots {
            if self.ctx.cancelled {
                break;
            }
            let collection_lines = self.explore_collection(root.id, 0).await;
            lines.extend(collection_lines);
        }

        let outcome = if self.ctx.cancelled || self.guard.is_cancelled() {
            warn!("Exploration cancelled, report is partial");
            lines.push(markers::CANCELLED.to_string());
            ExplorationOutcome::Cancelled
        } else {
            ExplorationOutcome::Completed
        };

        self.ctx.stats.duration = self.ctx.started.elapsed();
        let tree = build_tree(&self.ctx.summaries);

        info!(
            "Exploration finished: {} collections, {} documents, {} fields in {:.2}s",
            self.ctx.stats.collections,
            self.ctx.stats.documents,
            self.ctx.stats.fields,
            self.ctx.stats.duration.as_secs_f64()
        );

        SchemaReport {
            project_id,
            generated_at: chrono::Local::now(),
            lines,
            tree,
            stats: self.ctx.stats,
            summaries: self.ctx.summaries,
            outcome,
            include_stats: self.config.include_stats,
        }
    }
}
