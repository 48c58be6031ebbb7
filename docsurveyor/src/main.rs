//! Document store schema explorer.
//!
//! Loads a store snapshot, walks every collection and subcollection, and
//! writes a markdown or JSON report of the inferred schema.
//!
//! # Guarantees
//! - Read-only store access
//! - Every store call is bounded by the configured timeout
//! - Ctrl-C saves a partial report and exits with status 130

use clap::Parser;
use docsurveyor::{
    Cli, ReportFormat,
    output::{PREVIEW_CHARS, preview},
    run,
};
use docsurveyor_core::{DocSurveyorError, Result, initialize_schema_validator, logging::init_logging};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Exit status used when the run was interrupted.
const EXIT_CANCELLED: i32 = 130;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    initialize_schema_validator().map_err(|e| {
        DocSurveyorError::configuration(format!("Failed to initialize export validator: {}", e))
    })?;

    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping exploration");
            signal_token.cancel();
        }
    });

    info!("Starting schema exploration...");
    let result = run(&cli, cancel).await.map_err(|e| {
        error!("Exploration failed: {}", e);
        e
    })?;

    let report = &result.report;
    if !cli.global.quiet {
        if cli.format == ReportFormat::Md {
            println!("{}", preview(&report.render(), PREVIEW_CHARS));
            println!();
        }
        println!("Output: {}", result.output.display());
        println!("Collections: {}", report.stats.collections);
        println!("Documents sampled: {}", report.documents());
        println!("Fields analyzed: {}", report.stats.fields);
        if report.stats.timeouts > 0 || report.stats.errors > 0 {
            println!(
                "Timeouts: {}, errors: {}",
                report.stats.timeouts, report.stats.errors
            );
        }
    }

    if report.is_cancelled() {
        warn!("Partial report saved after cancellation");
        std::process::exit(EXIT_CANCELLED);
    }

    Ok(())
}
