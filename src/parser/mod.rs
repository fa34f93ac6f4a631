//! Results log decoding.
//!
//! This module handles:
//! - The `Sample` record consumed by the aggregator
//! - Decoding CSV results logs into a lazy sample stream

pub mod jtl;
pub mod sample;

// Re-export main types
pub use jtl::SampleReader;
pub use sample::Sample;
