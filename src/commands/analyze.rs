//! Analyze command implementation.
//!
//! The analyze command:
//! 1. Builds the analyzer configuration
//! 2. Streams the results log through the aggregator
//! 3. Writes the JSON result and/or prints a summary

use crate::aggregator::{run, AggregationResult, AnalysisError, GroupRule};
use crate::output::{render_summary, write_result};
use crate::parser::SampleReader;
use crate::utils::config::AnalyzerConfig;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::time::Instant;

/// Arguments for the analyze command
///
/// **Public** - used by main.rs to construct from CLI args
#[derive(Debug, Clone)]
pub struct AnalyzeArgs {
    /// Results log to read
    pub input: PathBuf,

    /// Optional JSON config file (groups, max_samples, percentiles, seed)
    pub config_file: Option<PathBuf>,

    /// `name=pattern` directives appended after the config file groups
    pub groups: Vec<String>,

    /// Reservoir capacity; overrides the config file when set
    pub max_samples: Option<usize>,

    /// Reservoir seed; overrides the config file when set
    pub seed: Option<u64>,

    /// Output path for the JSON result (optional)
    pub output_json: Option<PathBuf>,

    /// Print text summary to stdout
    pub print_summary: bool,

    /// Treat a truncated log as success
    pub allow_partial: bool,
}

impl Default for AnalyzeArgs {
    fn default() -> Self {
        Self {
            input: PathBuf::from("results.jtl"),
            config_file: None,
            groups: Vec::new(),
            max_samples: None,
            seed: None,
            output_json: Some(PathBuf::from("result.json")),
            print_summary: false,
            allow_partial: false,
        }
    }
}

/// Execute the analyze command
///
/// **Public** - main entry point called from main.rs
///
/// Outputs are written even when the log ends early; the command then fails
/// unless `allow_partial` is set.
pub fn execute_analyze(args: AnalyzeArgs) -> Result<AggregationResult> {
    let start_time = Instant::now();

    info!("Analyzing results log: {}", args.input.display());

    // Step 1: Configuration
    info!("Step 1/3: Building configuration...");
    let config = build_config(&args)?;

    // Step 2: Aggregate
    info!("Step 2/3: Aggregating samples...");
    let reader = SampleReader::from_path(&args.input)
        .with_context(|| format!("Failed to open results log {}", args.input.display()))?;

    let (result, failure) = match run(reader, config) {
        Ok(result) => (result, None),
        Err(AnalysisError::Config(e)) => {
            return Err(e).context("Invalid analyzer configuration");
        }
        Err(AnalysisError::Incomplete { partial, ingested, source }) => {
            warn!("Results log ended early after {} samples: {}", ingested, source);
            (*partial, Some(source))
        }
    };

    debug!("Result entries: {:?}", result.names());

    // Step 3: Outputs
    info!("Step 3/3: Writing outputs...");
    if let Some(path) = &args.output_json {
        write_result(&result, path).context("Failed to write result JSON")?;
        info!("✓ Result written to: {}", path.display());
    }

    if args.print_summary {
        println!("\n{}", render_summary(&result));
    }

    let elapsed = start_time.elapsed();
    info!("Analysis completed in {:.2}s", elapsed.as_secs_f64());

    match failure {
        Some(source) if !args.allow_partial => Err(anyhow::Error::new(source)
            .context("Results log could not be read completely (use --allow-partial to accept)")),
        _ => Ok(result),
    }
}

/// Merge the config file with command-line overrides
///
/// **Private** - internal helper for execute_analyze
fn build_config(args: &AnalyzeArgs) -> Result<AnalyzerConfig> {
    let mut config = match &args.config_file {
        Some(path) => AnalyzerConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };

    for directive in &args.groups {
        let rule = GroupRule::parse_directive(directive)
            .with_context(|| format!("Invalid group directive '{}'", directive))?;
        config.groups.push(rule);
    }

    if let Some(max_samples) = args.max_samples {
        config.max_samples = max_samples;
    }

    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    debug!(
        "Configuration: {} groups, max_samples={}",
        config.groups.len(),
        config.max_samples
    );

    Ok(config)
}

/// Validate analyze arguments
///
/// **Public** - can be called before execute_analyze for early validation
pub fn validate_args(args: &AnalyzeArgs) -> Result<()> {
    if args.input.as_os_str().is_empty() {
        anyhow::bail!("Input path cannot be empty");
    }

    for directive in &args.groups {
        if GroupRule::parse_directive(directive).is_none() {
            anyhow::bail!("Group must be given as name=pattern (got '{}')", directive);
        }
    }

    if args.max_samples == Some(0) {
        anyhow::bail!("max_samples must be greater than 0");
    }

    if args.output_json.is_none() && !args.print_summary {
        anyhow::bail!("Nothing to do: give --output and/or --summary");
    }

    Ok(())
}
