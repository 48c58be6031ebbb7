//! Final report assembly.
//!
//! A [`SchemaReport`] holds the body lines produced by the traversal engine
//! together with the structure tree and run statistics, and renders them as
//! markdown. [`structured`] turns rendered markdown back into a
//! collection/document/field structure for JSON export.

use std::collections::BTreeMap;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::models::{CollectionSummary, ExplorationStats};

pub mod structured;

pub use structured::{StructuredCollection, StructuredDocument, StructuredField, StructuredSchema};

/// Report title line.
pub const TITLE: &str = "# 🔥 DocSurveyor Schema Explorer";

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplorationOutcome {
    /// Every reachable collection within the limits was explored
    Completed,
    /// Interrupted; the report covers what was explored before the interrupt
    Cancelled,
}

impl std::fmt::Display for ExplorationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExplorationOutcome::Completed => write!(f, "completed"),
            ExplorationOutcome::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of one exploration run.
#[derive(Debug, Clone)]
pub struct SchemaReport {
    /// Project the store belongs to
    pub project_id: String,
    /// Local time the run finished
    pub generated_at: DateTime<Local>,
    /// Body lines in traversal order
    pub lines: Vec<String>,
    /// Rendered structure tree, empty when nothing was visited
    pub tree: String,
    /// Run counters
    pub stats: ExplorationStats,
    /// Per-path summaries the tree was built from
    pub summaries: BTreeMap<String, CollectionSummary>,
    /// How the run ended
    pub outcome: ExplorationOutcome,
    /// Whether the statistics block is rendered
    pub include_stats: bool,
}

impl SchemaReport {
    /// Renders the report as markdown.
    pub fn render(&self) -> String {
        let mut output = vec![
            TITLE.to_string(),
            String::new(),
            format!(
                "Generated on {}",
                self.generated_at.format("%Y-%m-%d %H:%M:%S")
            ),
            format!("Project: `{}`", self.project_id),
            String::new(),
        ];

        if !self.tree.is_empty() {
            output.push("## Database Structure".to_string());
            output.push(String::new());
            output.push("```".to_string());
            output.push(self.tree.clone());
            output.push("```".to_string());
            output.push(String::new());
        }

        output.extend(self.lines.iter().cloned());

        if self.include_stats {
            output.extend(self.stats.render_lines());
        }

        output.join("\n")
    }

    /// Number of documents described in the report.
    pub fn documents(&self) -> usize {
        self.stats.documents
    }

    /// Whether the report is partial because the run was interrupted.
    pub fn is_cancelled(&self) -> bool {
        self.outcome == ExplorationOutcome::Cancelled
    }

    /// Parses the rendered report into its structured form.
    pub fn to_structured(&self) -> StructuredSchema {
        structured::parse_report(&self.render())
    }
}
