//! JSON report output writer.
//!
//! Reports are wrapped in a small envelope carrying the schema version,
//! the trace they came from and a timestamp.

use crate::parser::ProfileReport;
use crate::utils::config::REPORT_SCHEMA_VERSION;
use crate::utils::error::OutputError;
use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// On-disk form of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportFile {
    /// Schema version (REPORT_SCHEMA_VERSION at write time)
    pub version: String,

    /// Trace file the report was reduced from
    pub source: String,

    /// RFC 3339 timestamp
    pub generated_at: String,

    pub report: ProfileReport,
}

impl ReportFile {
    pub fn new(report: ProfileReport, source: impl Into<String>) -> Self {
        Self {
            version: REPORT_SCHEMA_VERSION.to_string(),
            source: source.into(),
            generated_at: Utc::now().to_rfc3339(),
            report,
        }
    }
}

/// Borrowing twin of [`ReportFile`] used on the write path
#[derive(Serialize)]
struct ReportFileRef<'a> {
    version: &'static str,
    source: &'a str,
    generated_at: String,
    report: &'a ProfileReport,
}

impl<'a> ReportFileRef<'a> {
    fn new(report: &'a ProfileReport, source: &'a str) -> Self {
        Self {
            version: REPORT_SCHEMA_VERSION,
            source,
            generated_at: Utc::now().to_rfc3339(),
            report,
        }
    }
}

/// Write a report to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `report` - Reduced profile
/// * `source` - Trace the report came from, recorded in the envelope
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
///
/// # Example
/// ```ignore
/// let report = reduce_file("trace.json.gz", &ReduceConfig::default())?;
/// write_report(&report, "trace.json.gz", "report.json")?;
/// ```
pub fn write_report(
    report: &ProfileReport,
    source: &str,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing report to: {}", output_path.display());

    validate_path(output_path)?;
    create_parent_dirs(output_path)?;

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, &ReportFileRef::new(report, source))
        .map_err(OutputError::SerializationFailed)?;

    info!(
        "Report written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Serialize a report envelope to a pretty JSON string
///
/// **Public** - useful for tests and piping
pub fn report_to_string(report: &ProfileReport, source: &str) -> Result<String, OutputError> {
    serde_json::to_string_pretty(&ReportFileRef::new(report, source))
        .map_err(OutputError::SerializationFailed)
}

/// Validate that an output path is usable
///
/// **Public** - shared by the JSON and SVG writers
pub fn validate_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

/// **Private** - creates missing parent directories
pub(crate) fn create_parent_dirs(path: &Path) -> Result<(), OutputError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!(
                    "Cannot create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Read a report envelope from a JSON file
///
/// **Public** - used by the `validate` command and tests
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_report(input_path: impl AsRef<Path>) -> Result<ReportFile, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading report from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let envelope: ReportFile =
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(OutputError::SerializationFailed)?;

    debug!(
        "Report loaded: version {}, source {}, {} files",
        envelope.version,
        envelope.source,
        envelope.report.line_info.len()
    );

    Ok(envelope)
}
