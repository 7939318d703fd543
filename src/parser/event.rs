//! Decoded trace records.
//!
//! One [`Event`] per line of a line-by-line profiling trace. Decoding maps
//! the wire's one-character tags to variants once, so nothing downstream
//! ever looks at raw tags again.

use crate::utils::config::{NO_FILE, NO_LINE};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Small integer a trace uses in place of a file path
pub type FileId = i64;

/// Source line number (1-based; negative means "unknown")
pub type LineNo = i64;

/// A (file id, line) pair: where something executed or was called from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LineLocation {
    pub file_id: FileId,
    pub line: LineNo,
}

impl LineLocation {
    /// The location before anything has executed
    pub const NOWHERE: LineLocation = LineLocation {
        file_id: NO_FILE,
        line: NO_LINE,
    };

    pub fn new(file_id: FileId, line: LineNo) -> Self {
        Self { file_id, line }
    }
}

impl Default for LineLocation {
    fn default() -> Self {
        Self::NOWHERE
    }
}

/// A function definition (not a call instance)
///
/// Ordered by `(line, end_line, name, file)`. The order only has to be
/// total and stable so that call-tree children group canonically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionSite {
    pub name: String,

    #[serde(rename = "filename")]
    pub file: String,

    pub line: LineNo,

    #[serde(rename = "endline")]
    pub end_line: LineNo,
}

impl FunctionSite {
    pub fn new(name: impl Into<String>, file: impl Into<String>, line: LineNo, end_line: LineNo) -> Self {
        Self {
            name: name.into(),
            file: file.into(),
            line,
            end_line,
        }
    }

    /// Short label used in collapsed stacks and flamegraph frames
    pub fn label(&self) -> String {
        format!("{}@{}:{}", self.name, self.file, self.line)
    }
}

impl Ord for FunctionSite {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.line, self.end_line, &self.name, &self.file).cmp(&(
            other.line,
            other.end_line,
            &other.name,
            &other.file,
        ))
    }
}

impl PartialOrd for FunctionSite {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A single decoded trace record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Line was loaded/parsed
    Read { file_id: FileId, line: LineNo },

    /// Line executed. `ticks` is the time since the previous Exec/Info
    /// record, `exec_count` the number of executions folded into it.
    Exec {
        file_id: FileId,
        line: LineNo,
        ticks: u64,
        exec_count: u64,
    },

    /// Call entered. `line`/`end_line` span the function definition.
    EnterFunction {
        name: String,
        file: String,
        file_id: FileId,
        line: LineNo,
        end_line: LineNo,
    },

    /// Call returned
    ExitFunction,

    /// Associates a file id with a path
    InternFile { file_id: FileId, path: String },

    /// Stream metadata, doubling as a "current location" marker
    Info {
        is_cover: bool,
        time_type: String,
        at: LineLocation,
    },
}

impl Event {
    /// Shorthand for a single execution
    pub fn exec(file_id: FileId, line: LineNo, ticks: u64) -> Self {
        Event::Exec {
            file_id,
            line,
            ticks,
            exec_count: 1,
        }
    }

    /// Shorthand for entering a function whose file id is known
    pub fn enter(name: &str, file: &str, file_id: FileId, line: LineNo, end_line: LineNo) -> Self {
        Event::EnterFunction {
            name: name.to_string(),
            file: file.to_string(),
            file_id,
            line,
            end_line,
        }
    }

    /// Wire tag name, for logging
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Read { .. } => "Read",
            Event::Exec { .. } => "Exec",
            Event::EnterFunction { .. } => "EnterFunction",
            Event::ExitFunction => "ExitFunction",
            Event::InternFile { .. } => "InternFile",
            Event::Info { .. } => "Info",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(Event::exec(1, 2, 3).kind(), "Exec");
        assert_eq!(Event::enter("f", "a.g", 1, 2, 3).kind(), "EnterFunction");
        assert_eq!(Event::ExitFunction.kind(), "ExitFunction");
    }

    #[test]
    fn test_function_site_orders_by_line_first() {
        let a = FunctionSite::new("zeta", "a.g", 1, 9);
        let b = FunctionSite::new("alpha", "a.g", 2, 3);
        assert!(a < b);
    }

    #[test]
    fn test_function_site_tie_breaks() {
        let a = FunctionSite::new("f", "b.g", 4, 8);
        let b = FunctionSite::new("f", "a.g", 4, 9);
        let c = FunctionSite::new("g", "a.g", 4, 8);
        assert!(a < b);
        assert!(a < c);
        assert!(FunctionSite::new("f", "a.g", 4, 8) < a);
    }

    #[test]
    fn test_function_site_serializes_like_reports() {
        let site = FunctionSite::new("f", "lib/a.g", 3, 7);
        let json = serde_json::to_value(&site).unwrap();
        assert_eq!(json["filename"], "lib/a.g");
        assert_eq!(json["endline"], 7);
    }
}
