//! Report schema definitions.
//!
//! This module defines the structure handed back to callers once a trace
//! has been reduced. All of it serializes with serde; the on-disk envelope
//! lives in `output::json`.

use super::event::{FunctionSite, LineNo};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Top-level result of reducing one trace
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileReport {
    /// Per-file line statistics, lines 1..=max_line
    pub line_info: Vec<FileLines>,

    /// Flattened call tree, root first (with an empty path)
    pub stack_runtimes: Vec<CallTreePath>,

    /// Per-file call cross-references, parallel to `line_info`
    pub line_function_calls: Vec<FileCalls>,

    /// Stream metadata
    pub info: ProfileInfo,

    /// Recoverable problems found while assembling the report
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ProfileReport {
    /// Line statistics for a file path
    pub fn lines_for(&self, path: &str) -> Option<&[LineStats]> {
        self.line_info
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.lines.as_slice())
    }

    /// Statistics for one 1-based line of a file
    pub fn line(&self, path: &str, line: LineNo) -> Option<&LineStats> {
        let index = usize::try_from(line).ok()?.checked_sub(1)?;
        self.lines_for(path)?.get(index)
    }

    /// Call cross-references for a file path
    pub fn calls_for(&self, path: &str) -> Option<&[LineCalls]> {
        self.line_function_calls
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.lines.as_slice())
    }

    /// Cross-references for one 1-based line of a file
    pub fn calls_at(&self, path: &str, line: LineNo) -> Option<&LineCalls> {
        let index = usize::try_from(line).ok()?.checked_sub(1)?;
        self.calls_for(path)?.get(index)
    }

    /// Sum of self runtime over every call-tree node
    pub fn total_runtime(&self) -> u64 {
        self.stack_runtimes.iter().map(|p| p.runtime).sum()
    }
}

/// Line statistics of one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileLines {
    pub path: String,
    pub lines: Vec<LineStats>,
}

/// Statistics of one line
///
/// Serialized as `[read, exec, self, inclusive]` to keep reports compact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "[u64; 4]", from = "[u64; 4]")]
pub struct LineStats {
    pub read: bool,
    pub exec_count: u64,
    pub self_ticks: u64,
    pub inclusive_ticks: u64,
}

impl From<LineStats> for [u64; 4] {
    fn from(stats: LineStats) -> Self {
        [
            stats.read as u64,
            stats.exec_count,
            stats.self_ticks,
            stats.inclusive_ticks,
        ]
    }
}

impl From<[u64; 4]> for LineStats {
    fn from(raw: [u64; 4]) -> Self {
        Self {
            read: raw[0] != 0,
            exec_count: raw[1],
            self_ticks: raw[2],
            inclusive_ticks: raw[3],
        }
    }
}

/// Call cross-references of one file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileCalls {
    pub path: String,
    pub lines: Vec<LineCalls>,
}

/// Functions called from a line, and the call sites that reach it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineCalls {
    pub called: BTreeSet<FunctionSite>,
    pub calling: BTreeSet<Location>,
}

/// A place a call was made from
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// Function enclosing the call
    pub name: String,
    pub file: String,
    pub line: LineNo,
}

/// One call-tree node, identified by its path from the root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallTreePath {
    pub path: Vec<FunctionSite>,

    /// Self runtime of the node
    pub runtime: u64,

    /// Times the node was entered
    pub calls: u64,
}

impl CallTreePath {
    /// Collapsed representation, e.g. "main@a.g:1;f@a.g:9"
    pub fn collapsed(&self) -> String {
        self.path
            .iter()
            .map(FunctionSite::label)
            .collect::<Vec<_>>()
            .join(";")
    }
}

/// Stream-level metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileInfo {
    pub is_cover: bool,
    pub time_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_stats_serialize_as_array() {
        let stats = LineStats {
            read: true,
            exec_count: 3,
            self_ticks: 10,
            inclusive_ticks: 25,
        };
        assert_eq!(serde_json::to_string(&stats).unwrap(), "[1,3,10,25]");

        let back: LineStats = serde_json::from_str("[1,3,10,25]").unwrap();
        assert_eq!(back, stats);
    }

    #[test]
    fn test_line_lookup_is_one_based() {
        let report = ProfileReport {
            line_info: vec![FileLines {
                path: "a.g".to_string(),
                lines: vec![LineStats::default(), LineStats::from([0, 2, 0, 0])],
            }],
            ..Default::default()
        };

        assert_eq!(report.line("a.g", 2).unwrap().exec_count, 2);
        assert!(report.line("a.g", 0).is_none());
        assert!(report.line("a.g", 3).is_none());
        assert!(report.line("b.g", 1).is_none());
    }

    #[test]
    fn test_collapsed_path() {
        let path = CallTreePath {
            path: vec![
                FunctionSite::new("main", "a.g", 1, 5),
                FunctionSite::new("f", "b.g", 9, 12),
            ],
            runtime: 4,
            calls: 1,
        };
        assert_eq!(path.collapsed(), "main@a.g:1;f@b.g:9");
    }
}
