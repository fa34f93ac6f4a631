//! Loadtest Analyzer CLI
//!
//! Aggregates a load-test results log into per-group statistics.

use anyhow::Result;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::path::PathBuf;

use loadtest_analyzer::commands::{execute_analyze, validate_args, AnalyzeArgs};
use loadtest_analyzer::utils::config::SCHEMA_VERSION;

/// Loadtest Analyzer - per-group statistics for load-test results
#[derive(Parser, Debug)]
#[command(name = "loadtest-analyzer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Aggregate a CSV results log
    Analyze {
        /// Results log (CSV with header row)
        #[arg(short, long)]
        input: PathBuf,

        /// JSON config file with groups, max_samples, percentiles and seed
        #[arg(short, long, env = "LOADTEST_ANALYZER_CONFIG")]
        config: Option<PathBuf>,

        /// Group rule as name=pattern (repeatable, e.g. blob=/main/**)
        #[arg(short, long = "group")]
        groups: Vec<String>,

        /// Values retained per distribution for percentiles [default: 1000]
        #[arg(long)]
        max_samples: Option<usize>,

        /// Seed for reservoir sampling
        #[arg(long)]
        seed: Option<u64>,

        /// Output path for the JSON result
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print text summary to stdout
        #[arg(long)]
        summary: bool,

        /// Accept a truncated results log
        #[arg(long)]
        allow_partial: bool,
    },

    /// Display version information
    Version,
}

fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    match cli.command {
        Commands::Analyze {
            input,
            config,
            groups,
            max_samples,
            seed,
            output,
            summary,
            allow_partial,
        } => {
            let args = AnalyzeArgs {
                input,
                config_file: config,
                groups,
                max_samples,
                seed,
                output_json: output,
                print_summary: summary,
                allow_partial,
            };

            validate_args(&args)?;
            execute_analyze(args)?;
        }

        Commands::Version => {
            display_version();
        }
    }

    Ok(())
}

/// Display version information
///
/// **Private** - internal command implementation
fn display_version() {
    println!("Loadtest Analyzer v{}", env!("CARGO_PKG_VERSION"));
    println!("Result Schema: v{}", SCHEMA_VERSION);
}
