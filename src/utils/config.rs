//! Configuration and constants for the analyzer.

use super::error::ConfigError;
use crate::aggregator::matcher::{GroupPattern, GroupRule};
use log::debug;
use serde::Deserialize;
use std::path::Path;

/// Current output schema version
pub const SCHEMA_VERSION: &str = "1.0.0";

/// Reservoir capacity used when none is configured
pub const DEFAULT_MAX_SAMPLES: usize = 1000;

/// Seed for reservoir sampling when none is configured
pub const DEFAULT_SEED: u64 = 0x5EED_1DEA;

/// Percentiles computed for every snapshot by default
pub const DEFAULT_PERCENTILES: &[f64] = &[50.0, 90.0, 95.0, 99.0];

/// Result key of the ungrouped totals; no group rule may use it
pub const GLOBAL_GROUP: &str = "__all__";

/// Separator between label path segments
pub const PATH_SEPARATOR: char = '/';

/// Settings for one aggregation run
///
/// Fixed for the lifetime of the run; build a fresh `Aggregator` to change it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyzerConfig {
    /// Group rules in declaration order
    pub groups: Vec<GroupRule>,

    /// Reservoir capacity per accumulator (>= 1)
    pub max_samples: usize,

    /// Percentiles reported in each snapshot (0..=100)
    pub percentiles: Vec<f64>,

    /// Base seed for the reservoir RNGs
    pub seed: u64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            max_samples: DEFAULT_MAX_SAMPLES,
            percentiles: DEFAULT_PERCENTILES.to_vec(),
            seed: DEFAULT_SEED,
        }
    }
}

impl AnalyzerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, name: impl Into<String>, pattern: &str) -> Self {
        self.groups.push(GroupRule::new(name, GroupPattern::parse(pattern)));
        self
    }

    pub fn with_max_samples(mut self, max_samples: usize) -> Self {
        self.max_samples = max_samples;
        self
    }

    pub fn with_percentiles(mut self, percentiles: Vec<f64>) -> Self {
        self.percentiles = percentiles;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check everything that does not depend on the rule set.
    ///
    /// Group rules are checked by `GroupMatcher::new`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_samples < 1 {
            return Err(ConfigError::InvalidMaxSamples(self.max_samples));
        }

        if let Some(p) = self
            .percentiles
            .iter()
            .find(|p| !(0.0..=100.0).contains(*p))
        {
            return Err(ConfigError::InvalidPercentile(*p));
        }

        Ok(())
    }

    /// Load a config from a JSON file
    ///
    /// Missing fields fall back to the defaults. Group order follows the array order.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        debug!("Loading analyzer config from: {}", path.display());

        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile =
            serde_json::from_str(content).map_err(|e| ConfigError::InvalidFile(e.to_string()))?;

        let defaults = Self::default();
        let config = Self {
            groups: file
                .groups
                .into_iter()
                .map(|g| GroupRule::new(g.name, GroupPattern::parse(&g.pattern)))
                .collect(),
            max_samples: file.max_samples.unwrap_or(defaults.max_samples),
            percentiles: file.percentiles.unwrap_or(defaults.percentiles),
            seed: file.seed.unwrap_or(defaults.seed),
        };

        config.validate()?;
        Ok(config)
    }
}

/// On-disk shape of the config file
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    groups: Vec<GroupEntry>,
    max_samples: Option<usize>,
    percentiles: Option<Vec<f64>>,
    seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct GroupEntry {
    name: String,
    pattern: String,
}
