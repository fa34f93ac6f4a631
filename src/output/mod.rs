//! Output writers for aggregation results.
//!
//! This module handles:
//! - JSON results (written to and read from disk)
//! - Plain-text summary tables

pub mod json;
pub mod text;

// Re-export main functions
pub use json::{read_result, result_to_string, write_result};
pub use text::render_summary;
