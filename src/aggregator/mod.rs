//! Aggregation of sample streams into per-group statistics.
//!
//! This module turns a stream of samples into:
//! - Group membership per label (exact, subtree and glob rules)
//! - Bounded-memory running statistics per group
//! - Immutable snapshots keyed by group name

pub mod accumulator;
pub mod driver;
pub mod matcher;
pub mod metrics;
pub mod snapshot;

// Re-export main types and functions
pub use accumulator::{Accumulator, NumericSummary};
pub use driver::{run, AnalysisError, Aggregator, DriverState};
pub use matcher::{GroupMatcher, GroupPattern, GroupRule};
pub use snapshot::{AggregationResult, DistributionStats, Percentile, Snapshot};
