//! JSON result writer.
//!
//! Writes an `AggregationResult` as a JSON object keyed by group name,
//! global totals first.

use crate::aggregator::AggregationResult;
use crate::utils::error::OutputError;
use log::{debug, info};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Write an aggregation result to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_result(
    result: &AggregationResult,
    output_path: impl AsRef<Path>,
) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing aggregation result to: {}", output_path.display());

    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
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

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, result).map_err(OutputError::SerializationFailed)?;

    info!(
        "Result written successfully ({} bytes)",
        calculate_file_size(output_path)
    );

    Ok(())
}

/// Serialize a result to a pretty JSON string
pub fn result_to_string(result: &AggregationResult) -> Result<String, OutputError> {
    serde_json::to_string_pretty(result).map_err(OutputError::SerializationFailed)
}

/// Read a result back from a JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_result(input_path: impl AsRef<Path>) -> Result<AggregationResult, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading result from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let result: AggregationResult =
        serde_json::from_reader(file).map_err(OutputError::SerializationFailed)?;

    debug!("Result loaded: {} entries", result.len());

    Ok(result)
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
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

fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::run;
    use crate::parser::Sample;
    use crate::utils::config::AnalyzerConfig;
    use chrono::{TimeZone, Utc};
    use std::convert::Infallible;
    use tempfile::NamedTempFile;

    fn create_test_result() -> AggregationResult {
        let ts = Utc.timestamp_millis_opt(1_000).unwrap();
        let samples = vec![
            Sample::new(ts, "/main", 100, 10, true),
            Sample::new(ts, "/main/sub", 300, 20, false),
        ];
        let config = AnalyzerConfig::new().with_group("blob", "/main/**");
        run(samples.into_iter().map(Ok::<_, Infallible>), config).unwrap()
    }

    #[test]
    fn test_write_and_read_result() {
        let result = create_test_result();
        let temp_file = NamedTempFile::new().unwrap();

        write_result(&result, temp_file.path()).unwrap();
        let loaded = read_result(temp_file.path()).unwrap();

        assert_eq!(loaded, result);
    }

    #[test]
    fn test_validate_output_path_empty() {
        assert!(validate_output_path(Path::new("")).is_err());
    }

    #[test]
    fn test_validate_output_path_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(validate_output_path(temp_dir.path()).is_err());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested/dirs/result.json");

        write_result(&create_test_result(), &nested_path).unwrap();

        assert!(nested_path.exists());
    }
}
