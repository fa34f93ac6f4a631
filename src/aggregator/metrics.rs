//! Order statistics over retained reservoir values.
//!
//! Percentiles are only as exact as the reservoir: once a summary has seen
//! more values than its capacity, they are estimates over a uniform random
//! subset. Callers needing exact percentiles should size `max_samples` to at
//! least the expected sample count.

use log::debug;

/// Percentile of already sorted values by linear interpolation between adjacent ranks
///
/// `percent` is in `0..=100`. Returns `None` for an empty slice.
pub fn interpolated_percentile(sorted: &[u64], percent: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;

    let rank = (percent.clamp(0.0, 100.0) / 100.0) * last as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;

    let low_value = sorted[lower] as f64;
    let high_value = sorted[upper] as f64;

    Some(low_value + (high_value - low_value) * (rank - lower as f64))
}

/// Compute several percentiles with a single sort
///
/// **Public** - used when finalizing accumulators
pub fn calculate_percentiles(values: &[u64], percents: &[f64]) -> Vec<(f64, f64)> {
    if values.is_empty() {
        return Vec::new();
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    debug!(
        "Calculating {} percentiles over {} retained values",
        percents.len(),
        sorted.len()
    );

    percents
        .iter()
        .filter_map(|&p| interpolated_percentile(&sorted, p).map(|v| (p, v)))
        .collect()
}

/// Mean of a running sum, `None` when nothing was counted
pub fn mean(sum: u128, count: u64) -> Option<f64> {
    if count == 0 {
        None
    } else {
        Some(sum as f64 / count as f64)
    }
}
