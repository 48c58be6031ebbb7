//! Console logging for the `docsurveyor` binary.
//!
//! Diagnostics are written to stderr. Stdout is left to the report preview
//! and run summary so it can be piped.

use tracing::Level;

use crate::error::DocSurveyorError;
use crate::Result;

/// Most verbose level printed for the given `-v` count and `-q` flag.
///
/// `-q` wins over any number of `-v`. Without flags the run logs progress at
/// info; `-v` adds per-collection debug lines and `-vv` everything else.
pub fn level_for(verbose: u8, quiet: bool) -> Level {
    if quiet {
        return Level::ERROR;
    }
    match verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

/// Installs the global fmt subscriber.
///
/// # Errors
/// Returns a configuration error when a global subscriber is already set,
/// which happens if this is called twice in one process.
///
/// ```rust,no_run
/// docsurveyor_core::logging::init_logging(0, false)?;
/// # Ok::<(), docsurveyor_core::DocSurveyorError>(())
/// ```
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level_for(verbose, quiet))
        .with_target(false)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .try_init()
        .map_err(|e| {
            DocSurveyorError::configuration(format!("Logging setup failed: {}", e))
        })
}
