//! Per-group running statistics with bounded memory.
//!
//! Counts, sums, min and max are exact. Percentiles come from a fixed-size
//! reservoir kept with uniform reservoir sampling (Algorithm R), so memory
//! stays at O(capacity) whatever the log size.

use super::metrics::{calculate_percentiles, mean};
use super::snapshot::{DistributionStats, Percentile, Snapshot};
use crate::parser::Sample;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// Derive the reservoir seed of the `ordinal`-th accumulator of a run
///
/// SplitMix64 finalizer, so neighbouring ordinals get unrelated streams.
pub fn derive_seed(base: u64, ordinal: u64) -> u64 {
    let mut z = base ^ ordinal.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Exact running aggregates plus a bounded reservoir of observed values
#[derive(Debug, Clone)]
pub struct NumericSummary {
    count: u64,
    sum: u128,
    min: u64,
    max: u64,
    reservoir: Vec<u64>,
    capacity: usize,
}

impl NumericSummary {
    pub fn new(capacity: usize) -> Self {
        Self {
            count: 0,
            sum: 0,
            min: u64::MAX,
            max: 0,
            reservoir: Vec::with_capacity(capacity.min(4096)),
            capacity,
        }
    }

    /// Record one value
    ///
    /// Until the reservoir is full every value is kept. After that the n-th
    /// value replaces a uniformly chosen slot with probability len/n, which
    /// also holds for a reservoir left below capacity by a weighted merge.
    pub fn record<R: Rng>(&mut self, value: u64, rng: &mut R) {
        let exact = self.is_exact();
        self.count += 1;
        self.sum += u128::from(value);
        self.min = self.min.min(value);
        self.max = self.max.max(value);

        if exact && self.reservoir.len() < self.capacity {
            self.reservoir.push(value);
        } else {
            let slot = rng.gen_range(0..self.count);
            if slot < self.reservoir.len() as u64 {
                self.reservoir[slot as usize] = value;
            }
        }
    }

    /// True while every recorded value is still in the reservoir
    pub fn is_exact(&self) -> bool {
        self.count == self.reservoir.len() as u64
    }

    /// Fold another summary in
    ///
    /// Exact aggregates are combined directly. Two exact reservoirs that fit
    /// together are concatenated. Otherwise the merged reservoir is drawn
    /// without replacement from both sides, each draw picking a side in
    /// proportion to how many not-yet-drawn values it still represents. Its
    /// size is capped so that no side is asked for more values than its
    /// sampling rate supports.
    pub fn merge<R: Rng>(&mut self, other: &NumericSummary, rng: &mut R) {
        if other.count == 0 {
            return;
        }

        let combined = self.reservoir.len() + other.reservoir.len();
        if self.is_exact() && other.is_exact() && combined <= self.capacity {
            self.reservoir.extend_from_slice(&other.reservoir);
        } else {
            let total = u128::from(self.count) + u128::from(other.count);
            let target = merge_target(
                self.capacity,
                total,
                (self.reservoir.len(), self.count),
                (other.reservoir.len(), other.count),
            );

            let mut ours = std::mem::take(&mut self.reservoir);
            let mut theirs = other.reservoir.clone();
            ours.shuffle(rng);
            theirs.shuffle(rng);

            let (mut ours_left, mut theirs_left) = (self.count, other.count);
            let mut merged = Vec::with_capacity(target);

            while merged.len() < target {
                let pick_ours = match (ours.is_empty(), theirs.is_empty()) {
                    (true, true) => break,
                    (false, true) => true,
                    (true, false) => false,
                    (false, false) => rng.gen_range(0..ours_left + theirs_left) < ours_left,
                };

                if pick_ours {
                    merged.extend(ours.pop());
                    ours_left = ours_left.saturating_sub(1);
                } else {
                    merged.extend(theirs.pop());
                    theirs_left = theirs_left.saturating_sub(1);
                }
            }

            self.reservoir = merged;
        }

        self.count += other.count;
        self.sum += other.sum;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn min(&self) -> Option<u64> {
        (self.count > 0).then_some(self.min)
    }

    pub fn max(&self) -> Option<u64> {
        (self.count > 0).then_some(self.max)
    }

    pub fn mean(&self) -> Option<f64> {
        mean(self.sum, self.count)
    }

    /// Values currently retained for order statistics
    pub fn reservoir(&self) -> &[u64] {
        &self.reservoir
    }

    /// Finalized statistics, `None` when nothing was recorded
    pub fn summarize(&self, percents: &[f64]) -> Option<DistributionStats> {
        let mean = self.mean()?;

        let percentiles = calculate_percentiles(&self.reservoir, percents)
            .into_iter()
            .map(|(percent, value)| Percentile { percent, value })
            .collect();

        Some(DistributionStats {
            min: self.min,
            max: self.max,
            mean,
            sum: self.sum,
            retained: self.reservoir.len(),
            percentiles,
        })
    }
}

/// Size of a merged reservoir
///
/// A side with `len` retained out of `count` recorded values samples at rate
/// `len / count`; the merged sample can be no denser than the sparser side.
fn merge_target(capacity: usize, total: u128, ours: (usize, u64), theirs: (usize, u64)) -> usize {
    let supported = |(len, count): (usize, u64)| {
        if count == 0 {
            u128::MAX
        } else {
            len as u128 * total / u128::from(count)
        }
    };

    let target = supported(ours).min(supported(theirs)).min(capacity as u128);
    usize::try_from(target).unwrap_or(capacity)
}

/// Running statistics for one group (or the global totals)
#[derive(Debug, Clone)]
pub struct Accumulator {
    total_count: u64,
    success_count: u64,
    error_count: u64,
    first_timestamp: Option<DateTime<Utc>>,
    last_timestamp: Option<DateTime<Utc>>,
    durations: NumericSummary,
    sizes: NumericSummary,
    percentiles: Vec<f64>,
    rng: StdRng,
}

impl Accumulator {
    /// `max_samples` bounds each reservoir; `seed` makes sampling reproducible
    pub fn new(max_samples: usize, percentiles: &[f64], seed: u64) -> Self {
        Self {
            total_count: 0,
            success_count: 0,
            error_count: 0,
            first_timestamp: None,
            last_timestamp: None,
            durations: NumericSummary::new(max_samples),
            sizes: NumericSummary::new(max_samples),
            percentiles: percentiles.to_vec(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn ingest(&mut self, sample: &Sample) {
        self.total_count += 1;
        if sample.success() {
            self.success_count += 1;
        } else {
            self.error_count += 1;
        }

        let ts = sample.timestamp();
        self.first_timestamp = Some(self.first_timestamp.map_or(ts, |t| t.min(ts)));
        self.last_timestamp = Some(self.last_timestamp.map_or(ts, |t| t.max(ts)));

        self.durations.record(sample.elapsed_millis(), &mut self.rng);
        self.sizes.record(sample.bytes(), &mut self.rng);
    }

    /// Fold the state of another accumulator (e.g. an independent shard) in
    pub fn merge(&mut self, other: &Accumulator) {
        self.total_count += other.total_count;
        self.success_count += other.success_count;
        self.error_count += other.error_count;

        self.first_timestamp = match (self.first_timestamp, other.first_timestamp) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.last_timestamp = match (self.last_timestamp, other.last_timestamp) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };

        self.durations.merge(&other.durations, &mut self.rng);
        self.sizes.merge(&other.sizes, &mut self.rng);
    }

    /// Freeze the current state into a snapshot
    ///
    /// Does not mutate the accumulator, so repeated calls agree.
    ///
    /// # Panics
    /// If `total == success + error` does not hold, which means a bug here.
    pub fn finalize(&self) -> Snapshot {
        assert_eq!(
            self.total_count,
            self.success_count + self.error_count,
            "accumulator counts out of balance: total={} success={} error={}",
            self.total_count,
            self.success_count,
            self.error_count
        );

        if self.total_count == 0 {
            return Snapshot::empty();
        }

        Snapshot {
            count: self.total_count,
            success_count: self.success_count,
            error_count: self.error_count,
            first_timestamp: self.first_timestamp,
            last_timestamp: self.last_timestamp,
            duration: self.durations.summarize(&self.percentiles),
            size: self.sizes.summarize(&self.percentiles),
        }
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn success_count(&self) -> u64 {
        self.success_count
    }

    pub fn error_count(&self) -> u64 {
        self.error_count
    }

    pub fn durations(&self) -> &NumericSummary {
        &self.durations
    }

    pub fn sizes(&self) -> &NumericSummary {
        &self.sizes
    }
}
