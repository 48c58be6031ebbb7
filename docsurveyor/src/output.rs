//! File output for schema reports.
//!
//! Writes markdown or validated structured JSON, optionally compressed.

use std::path::Path;

use docsurveyor_core::{DocSurveyorError, Result, SchemaReport, validate_structured_output};
use tracing::info;

use crate::ReportFormat;

/// Characters of markdown shown in the console preview.
pub const PREVIEW_CHARS: usize = 2000;

/// Renders the report in the requested format.
///
/// # Errors
/// Returns a validation error if the structured export fails its schema check
pub fn render_report(report: &SchemaReport, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Md => Ok(report.render()),
        ReportFormat::Json => {
            let structured = report.to_structured();
            let json_value = serde_json::to_value(&structured)
                .map_err(|e| DocSurveyorError::serialization("Structured report", e))?;

            validate_structured_output(&json_value)?;
            info!("✓ Output validation passed");

            serde_json::to_string_pretty(&json_value)
                .map_err(|e| DocSurveyorError::serialization("JSON serialization", e))
        }
    }
}

/// Saves a report, creating parent directories as needed.
///
/// # Errors
/// Returns I/O errors, validation errors, or a configuration error when
/// compression is requested but not compiled in
pub async fn save_report(
    report: &SchemaReport,
    format: ReportFormat,
    output_path: &Path,
    compress: bool,
) -> Result<()> {
    let contents = render_report(report, format)?;

    if let Some(parent) = output_path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DocSurveyorError::Io {
                context: format!("Failed to create directory {}", parent.display()),
                source: e,
            })?;
    }

    if compress {
        #[cfg(feature = "compression")]
        {
            save_compressed(&contents, output_path).await
        }
        #[cfg(not(feature = "compression"))]
        {
            Err(DocSurveyorError::configuration(
                "Compression not available. Compile with --features compression",
            ))
        }
    } else {
        save_text(&contents, output_path).await
    }
}

/// Saves text to a file.
pub async fn save_text(contents: &str, output_path: &Path) -> Result<()> {
    tokio::fs::write(output_path, contents)
        .await
        .map_err(|e| DocSurveyorError::Io {
            context: format!("Failed to write to {}", output_path.display()),
            source: e,
        })?;
    Ok(())
}

#[cfg(feature = "compression")]
async fn save_compressed(contents: &str, output_path: &Path) -> Result<()> {
    use std::io::Write;

    let mut encoder = zstd::Encoder::new(Vec::new(), 3).map_err(|e| DocSurveyorError::Io {
        context: "Failed to create compressor".to_string(),
        source: e,
    })?;

    encoder
        .write_all(contents.as_bytes())
        .map_err(|e| DocSurveyorError::Io {
            context: "Compression failed".to_string(),
            source: e,
        })?;

    let compressed = encoder.finish().map_err(|e| DocSurveyorError::Io {
        context: "Compression finalization failed".to_string(),
        source: e,
    })?;

    tokio::fs::write(output_path, compressed)
        .await
        .map_err(|e| DocSurveyorError::Io {
            context: format!(
                "Failed to write compressed file to {}",
                output_path.display()
            ),
            source: e,
        })?;

    Ok(())
}

/// First `limit` characters of a rendered report, marked when truncated.
pub fn preview(markdown: &str, limit: usize) -> String {
    match markdown.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}\n... (truncated)", &markdown[..cut]),
        None => markdown.to_string(),
    }
}
