//! lineprof
//!
//! Reduction of line-level profiling traces. A trace is a stream of
//! JSON records (line reads, line executions with elapsed ticks, function
//! entry and exit, file id announcements); the reduction produces per-line
//! statistics, call-site cross-references and a call tree of runtimes.
//!
//! This crate provides the core implementation for the `lineprof` CLI.
//!
//! ## Getting Started
//!
//! ```ignore
//! use lineprof::aggregator::reduce_file;
//! use lineprof::utils::config::ReduceConfig;
//!
//! let report = reduce_file("trace.json.gz", &ReduceConfig::default())?;
//! for file in &report.line_info {
//!     println!("{}: {} lines", file.path, file.lines.len());
//! }
//! ```

pub mod aggregator;
pub mod commands;
pub mod flamegraph;
pub mod input;
pub mod output;
pub mod parser;
pub mod utils;
