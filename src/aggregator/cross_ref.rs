//! Call-site cross-references.
//!
//! Forward: which functions each line calls. Inverse: for the first line
//! of each function definition, which call sites reach it.

use crate::parser::{FileId, FunctionSite, LineLocation, LineNo};
use std::collections::{BTreeMap, BTreeSet};

/// A call site as seen from the callee: the enclosing function and the
/// line the call was made from. The file stays an id until the report
/// resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallerSite {
    pub function: String,
    pub at: LineLocation,
}

#[derive(Debug, Clone, Default)]
pub struct CrossReference {
    called: BTreeMap<LineLocation, BTreeSet<FunctionSite>>,
    callers: BTreeMap<LineLocation, BTreeSet<CallerSite>>,
}

impl CrossReference {
    pub fn new() -> Self {
        Self::default()
    }

    /// `at` calls `callee`
    pub fn record_call(&mut self, at: LineLocation, callee: FunctionSite) {
        self.called.entry(at).or_default().insert(callee);
    }

    /// The function starting at `callee_at` is reached from `caller`
    pub fn record_caller(&mut self, callee_at: LineLocation, caller: CallerSite) {
        self.callers.entry(callee_at).or_default().insert(caller);
    }

    pub fn called_at(&self, at: LineLocation) -> Option<&BTreeSet<FunctionSite>> {
        self.called.get(&at)
    }

    pub fn callers_of(&self, at: LineLocation) -> Option<&BTreeSet<CallerSite>> {
        self.callers.get(&at)
    }

    /// Highest line of `file_id` present in either direction
    pub fn max_line(&self, file_id: FileId) -> Option<LineNo> {
        let range = LineLocation::new(file_id, LineNo::MIN)..=LineLocation::new(file_id, LineNo::MAX);
        let called = self.called.range(range.clone()).next_back().map(|(k, _)| k.line);
        let callers = self.callers.range(range).next_back().map(|(k, _)| k.line);
        called.max(callers)
    }

    pub fn is_empty(&self) -> bool {
        self.called.is_empty() && self.callers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_call_dedups() {
        let mut xref = CrossReference::new();
        let at = LineLocation::new(1, 3);
        let g = FunctionSite::new("g", "b.g", 9, 12);

        xref.record_call(at, g.clone());
        xref.record_call(at, g.clone());

        let called = xref.called_at(at).unwrap();
        assert_eq!(called.len(), 1);
        assert!(called.contains(&g));
        assert!(xref.called_at(LineLocation::new(1, 4)).is_none());
    }

    #[test]
    fn test_record_caller() {
        let mut xref = CrossReference::new();
        let caller = CallerSite {
            function: "main".to_string(),
            at: LineLocation::new(1, 3),
        };
        xref.record_caller(LineLocation::new(2, 9), caller.clone());

        assert!(xref.callers_of(LineLocation::new(2, 9)).unwrap().contains(&caller));
    }

    #[test]
    fn test_max_line_spans_both_maps() {
        let mut xref = CrossReference::new();
        assert_eq!(xref.max_line(1), None);

        xref.record_call(LineLocation::new(1, 5), FunctionSite::new("f", "a.g", 1, 2));
        xref.record_caller(
            LineLocation::new(1, 20),
            CallerSite {
                function: "main".to_string(),
                at: LineLocation::new(2, 1),
            },
        );
        xref.record_call(LineLocation::new(2, 50), FunctionSite::new("f", "a.g", 1, 2));

        assert_eq!(xref.max_line(1), Some(20));
        assert_eq!(xref.max_line(2), Some(50));
    }
}
