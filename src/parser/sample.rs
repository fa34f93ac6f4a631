//! A single request/response observation from a results log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One recorded request/response event
///
/// Immutable once built; the decoder creates it and the aggregator only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    timestamp: DateTime<Utc>,
    label: String,
    elapsed_millis: u64,
    bytes: u64,
    success: bool,
}

impl Sample {
    pub fn new(
        timestamp: DateTime<Utc>,
        label: impl Into<String>,
        elapsed_millis: u64,
        bytes: u64,
        success: bool,
    ) -> Self {
        Self {
            timestamp,
            label: label.into(),
            elapsed_millis,
            bytes,
            success,
        }
    }

    /// When the sample was recorded
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Hierarchical, path-like request label (e.g. `/main/sub`)
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Request duration in milliseconds
    pub fn elapsed_millis(&self) -> u64 {
        self.elapsed_millis
    }

    /// Response size in bytes, 0 when unknown
    pub fn bytes(&self) -> u64 {
        self.bytes
    }

    pub fn success(&self) -> bool {
        self.success
    }
}
