//! Single-pass aggregation of a sample stream into per-group snapshots.
//!
//! The driver pulls samples one at a time, resolves their groups, and feeds
//! the global accumulator plus every matched group accumulator. Group
//! accumulators are created on first use, so output order is first-seen order.

use super::accumulator::{derive_seed, Accumulator};
use super::matcher::GroupMatcher;
use super::snapshot::AggregationResult;
use crate::parser::Sample;
use crate::utils::config::AnalyzerConfig;
use crate::utils::error::ConfigError;
use log::{debug, info, warn};
use std::collections::HashMap;
use thiserror::Error;

/// Failure of a whole aggregation run
#[derive(Error, Debug)]
pub enum AnalysisError<E: std::error::Error + 'static> {
    /// Rejected before any sample was read
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The stream failed mid-way; `partial` holds everything ingested before it
    #[error("sample stream failed after {ingested} samples: {source}")]
    Incomplete {
        partial: Box<AggregationResult>,
        ingested: u64,
        #[source]
        source: E,
    },
}

impl<E: std::error::Error + 'static> AnalysisError<E> {
    /// Partial result of an interrupted run, if any
    pub fn partial(&self) -> Option<&AggregationResult> {
        match self {
            Self::Incomplete { partial, .. } => Some(partial.as_ref()),
            Self::Config(_) => None,
        }
    }

    pub fn into_partial(self) -> Option<AggregationResult> {
        match self {
            Self::Incomplete { partial, .. } => Some(*partial),
            Self::Config(_) => None,
        }
    }
}

/// Lifecycle of an `Aggregator`
///
/// Finalizing consumes the aggregator, so a finalized run cannot be observed
/// or fed again; start a new `Aggregator` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No sample ingested yet
    Idle,
    /// At least one sample ingested
    Running,
}

/// Streaming aggregation driver for one run
#[derive(Debug)]
pub struct Aggregator {
    matcher: GroupMatcher,
    max_samples: usize,
    percentiles: Vec<f64>,
    seed: u64,
    global: Accumulator,
    groups: Vec<(String, Accumulator)>,
    group_index: HashMap<String, usize>,
    ingested: u64,
}

impl Aggregator {
    /// Validate the configuration and prepare an idle aggregator
    pub fn new(config: AnalyzerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let matcher = GroupMatcher::new(config.groups)?;

        debug!(
            "Aggregator ready: {} group rules, max_samples={}, seed={}",
            matcher.rules().len(),
            config.max_samples,
            config.seed
        );

        Ok(Self {
            global: Accumulator::new(
                config.max_samples,
                &config.percentiles,
                derive_seed(config.seed, 0),
            ),
            matcher,
            max_samples: config.max_samples,
            percentiles: config.percentiles,
            seed: config.seed,
            groups: Vec::new(),
            group_index: HashMap::new(),
            ingested: 0,
        })
    }

    pub fn state(&self) -> DriverState {
        if self.ingested == 0 {
            DriverState::Idle
        } else {
            DriverState::Running
        }
    }

    /// Samples ingested so far
    pub fn ingested(&self) -> u64 {
        self.ingested
    }

    pub fn matcher(&self) -> &GroupMatcher {
        &self.matcher
    }

    /// Count one sample into the global totals and every matching group
    pub fn ingest(&mut self, sample: &Sample) {
        self.global.ingest(sample);

        for name in self.matcher.resolve_groups(sample.label()) {
            let slot = match self.group_index.get(name) {
                Some(&slot) => slot,
                None => {
                    let slot = self.groups.len();
                    debug!("Creating accumulator for group '{}'", name);
                    let seed = derive_seed(self.seed, slot as u64 + 1);
                    self.groups.push((
                        name.to_string(),
                        Accumulator::new(self.max_samples, &self.percentiles, seed),
                    ));
                    self.group_index.insert(name.to_string(), slot);
                    slot
                }
            };
            self.groups[slot].1.ingest(sample);
        }

        self.ingested += 1;
    }

    /// Freeze every accumulator and end the run
    pub fn finalize(self) -> AggregationResult {
        let groups: Vec<_> = self
            .groups
            .into_iter()
            .map(|(name, acc)| (name, acc.finalize()))
            .collect();

        info!(
            "Aggregated {} samples into {} groups",
            self.ingested,
            groups.len()
        );

        AggregationResult::new(self.global.finalize(), groups)
    }
}

/// Aggregate a whole stream in one forward pass
///
/// A stream error stops ingestion; the samples seen so far are still
/// finalized and returned inside `AnalysisError::Incomplete`.
pub fn run<I, E>(samples: I, config: AnalyzerConfig) -> Result<AggregationResult, AnalysisError<E>>
where
    I: IntoIterator<Item = Result<Sample, E>>,
    E: std::error::Error + 'static,
{
    let mut aggregator = Aggregator::new(config)?;

    for item in samples {
        match item {
            Ok(sample) => aggregator.ingest(&sample),
            Err(source) => {
                let ingested = aggregator.ingested();
                warn!(
                    "Sample stream failed after {} samples, finalizing partial result: {}",
                    ingested, source
                );
                return Err(AnalysisError::Incomplete {
                    partial: Box::new(aggregator.finalize()),
                    ingested,
                    source,
                });
            }
        }
    }

    Ok(aggregator.finalize())
}
