//! Loadtest Analyzer
//!
//! Streaming aggregation of load-test results logs into per-group
//! statistics (counts, error split, duration and size distributions).
//!
//! The engine is pure data-in/data-out: feed it `Sample`s from any source
//! and it returns an `AggregationResult` keyed by group name.
//!
//! ```
//! use loadtest_analyzer::aggregator::run;
//! use loadtest_analyzer::parser::Sample;
//! use loadtest_analyzer::utils::config::AnalyzerConfig;
//! use chrono::Utc;
//! use std::convert::Infallible;
//!
//! let samples = vec![Sample::new(Utc::now(), "/main", 120, 512, true)];
//! let config = AnalyzerConfig::new().with_group("page", "/main");
//!
//! let result = run(samples.into_iter().map(Ok::<_, Infallible>), config).unwrap();
//! assert_eq!(result.get("page").unwrap().count, 1);
//! ```

pub mod aggregator;
pub mod commands;
pub mod output;
pub mod parser;
pub mod utils;
