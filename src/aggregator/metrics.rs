//! Calculate summary metrics and hot paths from a reduced profile.
//!
//! Hot paths are the call-tree nodes with the most self runtime.
//! These are the primary targets for optimization.

use crate::parser::{CallTreePath, LineNo, ProfileReport};
use log::debug;
use serde::{Deserialize, Serialize};

/// Label used for the root node, whose path is empty
pub const TOPLEVEL_LABEL: &str = "<toplevel>";

/// A call path with its share of the total runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HotPath {
    /// Collapsed path, e.g. "main@a.g:1;f@b.g:9"
    pub stack: String,

    /// Self runtime of the node
    pub runtime: u64,

    /// Percentage of total runtime
    pub percentage: f64,

    /// Times the node was entered
    pub calls: u64,
}

/// Calculate hot paths from the flattened call tree
///
/// **Public** - main entry point for metrics calculation
///
/// # Arguments
/// * `paths` - Flattened call tree (`ProfileReport::stack_runtimes`)
/// * `top_n` - Number of top paths to return (e.g., 10)
///
/// # Returns
/// Vector of hot paths, sorted by runtime (descending). Nodes that never
/// accumulated runtime are left out.
pub fn calculate_hot_paths(paths: &[CallTreePath], top_n: usize) -> Vec<HotPath> {
    debug!("Calculating top {} hot paths from {} call paths", top_n, paths.len());

    let total: u64 = paths.iter().map(|p| p.runtime).sum();

    let mut ranked: Vec<&CallTreePath> = paths.iter().filter(|p| p.runtime > 0).collect();
    // stable: equal runtimes keep call-tree order
    ranked.sort_by(|a, b| b.runtime.cmp(&a.runtime));

    ranked
        .into_iter()
        .take(top_n)
        .map(|path| create_hot_path(path, total))
        .collect()
}

/// Create a HotPath from a CallTreePath
///
/// **Private** - internal conversion
fn create_hot_path(path: &CallTreePath, total: u64) -> HotPath {
    let stack = if path.path.is_empty() {
        TOPLEVEL_LABEL.to_string()
    } else {
        path.collapsed()
    };

    HotPath {
        stack,
        runtime: path.runtime,
        percentage: percentage_of(path.runtime, total),
        calls: path.calls,
    }
}

fn percentage_of(part: u64, total: u64) -> f64 {
    if total > 0 {
        (part as f64 / total as f64) * 100.0
    } else {
        0.0
    }
}

/// Calculate runtime distribution statistics
///
/// **Public** - provides summary statistics
///
/// Only nodes with non-zero runtime are counted as paths.
pub fn calculate_runtime_distribution(paths: &[CallTreePath]) -> RuntimeDistribution {
    let mut runtimes: Vec<u64> = paths.iter().map(|p| p.runtime).filter(|&r| r > 0).collect();
    if runtimes.is_empty() {
        return RuntimeDistribution::default();
    }

    runtimes.sort_unstable_by(|a, b| b.cmp(a));

    let total: u64 = runtimes.iter().sum();
    let count = runtimes.len();
    let mean = total / count as u64;
    let median = runtimes[count / 2];

    let top_10_percent_count = (count as f64 * 0.1).ceil() as usize;
    let top_10_percent_ticks: u64 = runtimes.iter().take(top_10_percent_count).sum();

    RuntimeDistribution {
        total_ticks: total,
        path_count: count,
        mean_ticks_per_path: mean,
        median_ticks_per_path: median,
        top_10_percent_ticks,
        top_10_percent_percentage: percentage_of(top_10_percent_ticks, total),
    }
}

/// Runtime distribution statistics
///
/// **Public** - returned from calculate_runtime_distribution
#[derive(Debug, Clone, Default)]
pub struct RuntimeDistribution {
    /// Total ticks across all paths
    pub total_ticks: u64,

    /// Number of paths with runtime
    pub path_count: usize,

    pub mean_ticks_per_path: u64,

    pub median_ticks_per_path: u64,

    /// Ticks spent in the top 10% of paths
    pub top_10_percent_ticks: u64,

    /// Percentage of total runtime in the top 10%
    pub top_10_percent_percentage: f64,
}

impl RuntimeDistribution {
    /// Returns true if the top 10% of paths take more than 80% of runtime
    pub fn is_highly_concentrated(&self) -> bool {
        self.top_10_percent_percentage > 80.0
    }

    /// Get human-readable summary
    ///
    /// **Public** - for logging and debugging
    pub fn summary(&self) -> String {
        format!(
            "Total: {} ticks | Paths: {} | Mean: {} | Median: {} | Top 10%: {:.1}%",
            self.total_ticks,
            self.path_count,
            self.mean_ticks_per_path,
            self.median_ticks_per_path,
            self.top_10_percent_percentage
        )
    }
}

/// One source line ranked by self runtime
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineHotspot {
    pub file: String,
    pub line: LineNo,
    pub self_ticks: u64,
    pub inclusive_ticks: u64,
    pub exec_count: u64,
}

/// Lines with the most self runtime across every file
///
/// **Public** - used by the text summary
pub fn hottest_lines(report: &ProfileReport, top_n: usize) -> Vec<LineHotspot> {
    let mut spots: Vec<LineHotspot> = report
        .line_info
        .iter()
        .flat_map(|file| {
            file.lines
                .iter()
                .enumerate()
                .filter(|(_, stats)| stats.self_ticks > 0)
                .map(move |(index, stats)| LineHotspot {
                    file: file.path.clone(),
                    line: index as LineNo + 1,
                    self_ticks: stats.self_ticks,
                    inclusive_ticks: stats.inclusive_ticks,
                    exec_count: stats.exec_count,
                })
        })
        .collect();

    spots.sort_by(|a, b| b.self_ticks.cmp(&a.self_ticks));
    spots.truncate(top_n);
    spots
}
