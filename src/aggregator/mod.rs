//! Reduction of trace events into per-line statistics and a call tree.
//!
//! This module transforms decoded trace events into:
//! - Per-line read/exec counts and self/inclusive time
//! - Call-site cross-references in both directions
//! - A call tree flattened into per-path runtimes
//! - Hot path and distribution metrics over that tree

pub mod call_tree;
pub mod cross_ref;
pub mod file_table;
pub mod ingest;
pub mod line_stats;
pub mod metrics;
pub mod report;
pub mod tracker;

// Re-export main types and functions
pub use call_tree::{CallTree, CallTreeNode, NodeId};
pub use cross_ref::{CallerSite, CrossReference};
pub use file_table::FileTable;
pub use ingest::{reduce_file, reduce_lines, reduce_reader};
pub use line_stats::{LineRecord, LineStatsTable};
pub use metrics::{
    calculate_hot_paths, calculate_runtime_distribution, hottest_lines, HotPath, LineHotspot,
    RuntimeDistribution,
};
pub use report::ReportAssembler;
pub use tracker::{CallStackTracker, CorrectionSnapshot};
