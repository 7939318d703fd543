//! Per-line accumulators.
//!
//! A sparse table keyed by (file id, line). Every mutating operation
//! creates a zeroed record on first touch; [`LineStatsTable::get`] reads
//! with the same get-or-zero contract but never creates anything.

use crate::parser::{FileId, LineLocation, LineNo};
use std::collections::BTreeMap;

/// Counters of one (file, line)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineRecord {
    pub was_read: bool,
    pub exec_count: u64,
    pub self_ticks: u64,
    pub inclusive_ticks: u64,
}

/// Sparse, auto-vivifying per-line statistics
#[derive(Debug, Clone, Default)]
pub struct LineStatsTable {
    records: BTreeMap<LineLocation, LineRecord>,
}

impl LineStatsTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&mut self, at: LineLocation) -> &mut LineRecord {
        self.records.entry(at).or_default()
    }

    pub fn record_read(&mut self, at: LineLocation) {
        self.entry(at).was_read = true;
    }

    pub fn record_exec(&mut self, at: LineLocation, exec_count: u64) {
        self.entry(at).exec_count += exec_count;
    }

    pub fn add_self_ticks(&mut self, at: LineLocation, ticks: u64) {
        self.entry(at).self_ticks += ticks;
    }

    /// Overwrites, not additive: the value already folds in earlier calls
    pub fn set_inclusive_ticks(&mut self, at: LineLocation, value: u64) {
        self.entry(at).inclusive_ticks = value;
    }

    /// Current counters, zero if the line was never touched
    pub fn get(&self, at: LineLocation) -> LineRecord {
        self.records.get(&at).copied().unwrap_or_default()
    }

    /// Distinct file ids with at least one record, ascending
    pub fn file_ids(&self) -> Vec<FileId> {
        let mut ids: Vec<FileId> = self.records.keys().map(|k| k.file_id).collect();
        ids.dedup();
        ids
    }

    /// Highest line with a record in `file_id`
    pub fn max_line(&self, file_id: FileId) -> Option<LineNo> {
        self.file_records(file_id).map(|(line, _)| line).last()
    }

    /// Records of one file in line order
    pub fn file_records(&self, file_id: FileId) -> impl Iterator<Item = (LineNo, &LineRecord)> + '_ {
        self.records
            .range(LineLocation::new(file_id, LineNo::MIN)..=LineLocation::new(file_id, LineNo::MAX))
            .map(|(k, v)| (k.line, v))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(file_id: FileId, line: LineNo) -> LineLocation {
        LineLocation::new(file_id, line)
    }

    #[test]
    fn test_get_untouched_is_zero() {
        let table = LineStatsTable::new();
        assert_eq!(table.get(at(1, 1)), LineRecord::default());
        assert!(table.is_empty());
    }

    #[test]
    fn test_read_is_idempotent() {
        let mut table = LineStatsTable::new();
        table.record_read(at(1, 3));
        table.record_read(at(1, 3));
        assert!(table.get(at(1, 3)).was_read);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_exec_and_ticks_accumulate() {
        let mut table = LineStatsTable::new();
        table.record_exec(at(1, 3), 1);
        table.record_exec(at(1, 3), 4);
        table.add_self_ticks(at(1, 3), 7);
        table.add_self_ticks(at(1, 3), 2);

        let rec = table.get(at(1, 3));
        assert_eq!(rec.exec_count, 5);
        assert_eq!(rec.self_ticks, 9);
    }

    #[test]
    fn test_inclusive_overwrites() {
        let mut table = LineStatsTable::new();
        table.set_inclusive_ticks(at(2, 1), 10);
        table.set_inclusive_ticks(at(2, 1), 4);
        assert_eq!(table.get(at(2, 1)).inclusive_ticks, 4);
    }

    #[test]
    fn test_file_ids_and_max_line() {
        let mut table = LineStatsTable::new();
        table.record_read(at(2, 40));
        table.record_exec(at(1, 7), 1);
        table.record_exec(at(1, 3), 1);
        table.add_self_ticks(at(-1, -1), 1);

        assert_eq!(table.file_ids(), vec![-1, 1, 2]);
        assert_eq!(table.max_line(1), Some(7));
        assert_eq!(table.max_line(2), Some(40));
        assert_eq!(table.max_line(9), None);

        let lines: Vec<LineNo> = table.file_records(1).map(|(l, _)| l).collect();
        assert_eq!(lines, vec![3, 7]);
    }
}
