//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use thiserror::Error;

/// Errors in the analyzer configuration
///
/// Always raised before the first sample is ingested.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("max_samples must be at least 1 (got {0})")]
    InvalidMaxSamples(usize),

    #[error("duplicate group name: {0}")]
    DuplicateGroup(String),

    #[error("group name cannot be empty")]
    EmptyGroupName,

    #[error("group '{0}' has an empty pattern")]
    EmptyPattern(String),

    #[error("group name '{0}' is reserved for the global totals")]
    ReservedGroupName(String),

    #[error("percentile {0} is outside 0..=100")]
    InvalidPercentile(f64),

    #[error("failed to read config file: {0}")]
    Io(String),

    #[error("invalid config file: {0}")]
    InvalidFile(String),
}

/// Errors that can occur while decoding a results log
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("CSV decoding failed: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Invalid record at line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}
