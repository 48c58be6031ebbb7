//! Library half of the `docsurveyor` binary.
//!
//! Argument parsing, configuration mapping and the run itself live here so
//! they can be tested without spawning the binary.

pub mod output;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Args, Parser, ValueEnum};
use docsurveyor_core::{
    DocSurveyorError, ExplorerConfig, MemoryStore, Result, SchemaReport, TraversalEngine,
    store::load_snapshot,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Markdown report
    Md,
    /// Structured JSON derived from the markdown report
    Json,
}

impl ReportFormat {
    /// File extension for reports in this format.
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Md => "md",
            ReportFormat::Json => "json",
        }
    }
}

/// Flags shared by every invocation.
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all output except errors")]
    pub quiet: bool,
}

/// Command line of the `docsurveyor` binary.
#[derive(Debug, Parser)]
#[command(name = "docsurveyor")]
#[command(about = "Document store schema explorer")]
#[command(version)]
#[command(long_about = "
DocSurveyor - Schema discovery for schemaless document stores

Samples documents from every collection and subcollection and documents the
implicit schema: field names, inferred types, nesting, references and array
element types.

GUARANTEES:
- Read-only: nothing is ever written back to the store
- Every store call is bounded by --timeout
- Ctrl-C stops the run and still saves a partial report

EXAMPLES:
  docsurveyor --source export.json
  docsurveyor --source export.json --max-docs 10 --depth 3 --format json
  DOCSURVEYOR_SOURCE=export.json docsurveyor -o docs/schema.md
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Store snapshot to explore
    #[arg(
        short,
        long,
        env = "DOCSURVEYOR_SOURCE",
        value_name = "FILE",
        help = "JSON snapshot of the document store"
    )]
    pub source: Option<PathBuf>,

    /// Project identifier override
    #[arg(
        short,
        long,
        env = "DOCSURVEYOR_PROJECT",
        help = "Project ID (defaults to the snapshot's project)"
    )]
    pub project_id: Option<String>,

    /// Documents sampled per collection
    #[arg(
        short,
        long,
        default_value_t = 5,
        help = "Maximum documents sampled per collection"
    )]
    pub max_docs: usize,

    /// Subcollection depth limit
    #[arg(
        short,
        long,
        default_value_t = 5,
        help = "Maximum depth for subcollection traversal"
    )]
    pub depth: usize,

    /// Disable counts and statistics
    #[arg(long, help = "Skip document counts and the statistics block")]
    pub no_stats: bool,

    /// Disable array element sampling
    #[arg(long, help = "Infer array types from the first element only")]
    pub no_array_sampling: bool,

    /// Array elements inspected
    #[arg(
        long,
        default_value_t = 3,
        help = "Number of array elements inspected for type inference"
    )]
    pub array_sample_size: usize,

    /// Per-call timeout in seconds
    #[arg(
        short,
        long,
        default_value_t = 30,
        value_name = "SECONDS",
        help = "Timeout for each store operation"
    )]
    pub timeout: u64,

    /// Output file override
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Output file (defaults to <project>.schema.md or .json)"
    )]
    pub output: Option<PathBuf>,

    /// Report format
    #[arg(short, long, value_enum, default_value_t = ReportFormat::Md)]
    pub format: ReportFormat,

    /// Enable compression
    #[arg(long, help = "Compress output using Zstandard (.zst)")]
    pub compress: bool,
}

impl Cli {
    /// Maps CLI flags onto an explorer configuration.
    ///
    /// # Errors
    /// Returns a configuration error if any value is out of range
    pub fn explorer_config(&self) -> Result<ExplorerConfig> {
        let config = ExplorerConfig::new()
            .with_max_docs(self.max_docs)
            .with_max_depth(self.depth)
            .with_stats(!self.no_stats)
            .with_array_sampling(!self.no_array_sampling)
            .with_array_sample_size(self.array_sample_size)
            .with_timeout_secs(self.timeout);
        config.validate()?;
        Ok(config)
    }

    /// Returns the snapshot path, checking that it exists.
    ///
    /// # Errors
    /// Returns a configuration error if no source was given or the file is missing
    pub fn resolve_source(&self) -> Result<&Path> {
        let source = self.source.as_deref().ok_or_else(|| {
            DocSurveyorError::configuration(
                "Store snapshot required. Set DOCSURVEYOR_SOURCE or use --source.",
            )
        })?;

        if !source.is_file() {
            return Err(DocSurveyorError::configuration(format!(
                "Snapshot file not found: {}",
                source.display()
            )));
        }

        Ok(source)
    }

    /// Output path for a project, honoring `--output` and `--compress`.
    pub fn output_path(&self, project_id: &str) -> PathBuf {
        let path = self
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(project_id, self.format));

        if self.compress && path.extension().is_none_or(|ext| ext != "zst") {
            let mut name = path.clone().into_os_string();
            name.push(".zst");
            PathBuf::from(name)
        } else {
            path
        }
    }
}

/// Default output file name: `<project>.schema.<ext>`.
pub fn default_output_path(project_id: &str, format: ReportFormat) -> PathBuf {
    PathBuf::from(format!("{}.schema.{}", project_id, format.extension()))
}

/// Loads the snapshot named by the CLI, applying the project override.
///
/// # Errors
/// Returns a configuration error if the snapshot is missing or malformed
pub async fn load_store(cli: &Cli) -> Result<MemoryStore> {
    let source = cli.resolve_source()?;
    let mut store = load_snapshot(source).await?;
    if let Some(project_id) = &cli.project_id {
        store.set_project_id(project_id.clone());
    }
    Ok(store)
}

/// Outcome of a completed or cancelled run.
#[derive(Debug)]
pub struct RunResult {
    /// The rendered run
    pub report: SchemaReport,
    /// Where the report was written
    pub output: PathBuf,
}

/// Explores the store and saves the report.
///
/// Cancellation via `cancel` still saves the partial report.
///
/// # Errors
/// Returns configuration errors before exploration starts, or I/O and
/// validation errors while saving
pub async fn run(cli: &Cli, cancel: CancellationToken) -> Result<RunResult> {
    let config = cli.explorer_config()?;
    let store = load_store(cli).await?;

    let engine = TraversalEngine::new(Arc::new(store), config)?.with_cancellation(cancel);
    let report = engine.explore_database().await;

    let output = cli.output_path(&report.project_id);
    output::save_report(&report, cli.format, &output, cli.compress).await?;
    info!("✓ Report saved to {}", output.display());

    Ok(RunResult { report, output })
}
