//! Report files.
//!
//! A report is one pretty-printed JSON document terminated by a newline, so
//! successive runs diff cleanly.

use crate::parser::schema::TraceReport;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write `report` to `output_path`, creating missing parent directories
///
/// **Public** - used by the analyze command
///
/// # Errors
/// * `OutputError::InvalidPath` - a parent directory could not be created
/// * `OutputError::WriteFailed` - the file could not be created or written
/// * `OutputError::SerializationFailed` - JSON serialization error
pub fn write_report(report: &TraceReport, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| {
            OutputError::InvalidPath(format!("Cannot create directory {}: {}", parent.display(), e))
        })?;
    }

    let mut writer = BufWriter::new(File::create(output_path).map_err(OutputError::WriteFailed)?);
    serde_json::to_writer_pretty(&mut writer, report).map_err(OutputError::SerializationFailed)?;
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(OutputError::WriteFailed)?;

    info!(
        "Report with {} frames (key {:?}) written to {}",
        report.items.len(),
        report.stack_key,
        output_path.display()
    );
    Ok(())
}

/// Serialize a report for stdout
pub fn report_to_string(report: &TraceReport) -> Result<String, OutputError> {
    serde_json::to_string_pretty(report).map_err(OutputError::SerializationFailed)
}

/// Read a report written by [`write_report`]
///
/// **Public** - used by the validate command and tests
///
/// # Errors
/// * `OutputError::WriteFailed` - the file could not be opened
/// * `OutputError::SerializationFailed` - not a valid report
pub fn read_report(input_path: impl AsRef<Path>) -> Result<TraceReport, OutputError> {
    let input_path = input_path.as_ref();
    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let report: TraceReport =
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(OutputError::SerializationFailed)?;

    debug!(
        "Loaded report {} ({} frames, version {})",
        input_path.display(),
        report.items.len(),
        report.version
    );
    Ok(report)
}
