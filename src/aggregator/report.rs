//! Final report assembly.
//!
//! One pass over every file id that has line statistics. Each file gets a
//! dense line range 1..=max_line (max over the line table and both
//! cross-reference directions), and the call tree is flattened depth-first.

use super::call_tree::CallTree;
use super::cross_ref::CrossReference;
use super::file_table::FileTable;
use super::line_stats::LineStatsTable;
use crate::parser::{
    FileCalls, FileId, FileLines, LineCalls, LineLocation, LineStats, Location, ProfileInfo,
    ProfileReport,
};
use crate::utils::config::NO_FILE;
use log::{debug, warn};
use std::collections::BTreeSet;

/// Owns the tracker's tables once the trace has been consumed
#[derive(Debug)]
pub struct ReportAssembler {
    pub files: FileTable,
    pub lines: LineStatsTable,
    pub xref: CrossReference,
    pub tree: CallTree,
    pub info: ProfileInfo,
}

impl ReportAssembler {
    pub fn assemble(self) -> ProfileReport {
        let mut warnings = Vec::new();
        let mut unresolved_callers: BTreeSet<FileId> = BTreeSet::new();
        let mut line_info = Vec::new();
        let mut line_function_calls = Vec::new();

        for file_id in self.lines.file_ids() {
            if file_id == NO_FILE {
                continue;
            }

            let Some(path) = self.files.resolve(file_id) else {
                let message = format!(
                    "damaged profile, cannot find a filename to match id {}",
                    file_id
                );
                warn!("{}", message);
                warnings.push(message);
                continue;
            };

            let max_line = self
                .lines
                .max_line(file_id)
                .max(self.xref.max_line(file_id))
                .unwrap_or(0);

            let mut lines = Vec::new();
            let mut calls = Vec::new();
            for line in 1..=max_line {
                let at = LineLocation::new(file_id, line);
                lines.push(self.line_stats(at));
                calls.push(self.line_calls(at, &mut unresolved_callers));
            }

            debug!("File {} ({}): {} lines", file_id, path, lines.len());
            line_info.push(FileLines {
                path: path.to_string(),
                lines,
            });
            line_function_calls.push(FileCalls {
                path: path.to_string(),
                lines: calls,
            });
        }

        for file_id in unresolved_callers {
            let message = format!(
                "damaged profile, dropped call sites in unknown file id {}",
                file_id
            );
            warn!("{}", message);
            warnings.push(message);
        }

        let stack_runtimes = self.tree.flatten();
        debug!("Flattened call tree into {} paths", stack_runtimes.len());

        ProfileReport {
            line_info,
            stack_runtimes,
            line_function_calls,
            info: self.info,
            warnings,
        }
    }

    fn line_stats(&self, at: LineLocation) -> LineStats {
        let rec = self.lines.get(at);
        LineStats {
            read: rec.was_read,
            exec_count: rec.exec_count,
            self_ticks: rec.self_ticks,
            inclusive_ticks: rec.inclusive_ticks,
        }
    }

    fn line_calls(&self, at: LineLocation, unresolved: &mut BTreeSet<FileId>) -> LineCalls {
        let called = self.xref.called_at(at).cloned().unwrap_or_default();

        let mut calling = BTreeSet::new();
        for caller in self.xref.callers_of(at).into_iter().flatten() {
            if caller.at.file_id == NO_FILE {
                continue;
            }
            match self.files.resolve(caller.at.file_id) {
                Some(file) => {
                    calling.insert(Location {
                        name: caller.function.clone(),
                        file: file.to_string(),
                        line: caller.at.line,
                    });
                }
                None => {
                    unresolved.insert(caller.at.file_id);
                }
            }
        }

        LineCalls { called, calling }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::cross_ref::CallerSite;
    use crate::parser::FunctionSite;

    fn assembler() -> ReportAssembler {
        ReportAssembler {
            files: FileTable::new(),
            lines: LineStatsTable::new(),
            xref: CrossReference::new(),
            tree: CallTree::new(),
            info: ProfileInfo::default(),
        }
    }

    #[test]
    fn test_empty_report_has_root_only() {
        let report = assembler().assemble();
        assert!(report.line_info.is_empty());
        assert_eq!(report.stack_runtimes.len(), 1);
        assert!(report.stack_runtimes[0].path.is_empty());
    }

    #[test]
    fn test_dense_lines_up_to_max() {
        let mut asm = assembler();
        asm.files.register(1, "a.g").unwrap();
        asm.lines.record_read(LineLocation::new(1, 2));
        asm.lines.record_exec(LineLocation::new(1, 4), 3);

        let report = asm.assemble();
        let lines = report.lines_for("a.g").unwrap();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], LineStats::default());
        assert!(lines[1].read);
        assert_eq!(lines[3].exec_count, 3);
        assert_eq!(report.calls_for("a.g").unwrap().len(), 4);
    }

    #[test]
    fn test_cross_reference_extends_max_line() {
        let mut asm = assembler();
        asm.files.register(1, "a.g").unwrap();
        asm.lines.record_exec(LineLocation::new(1, 2), 1);
        asm.xref.record_call(LineLocation::new(1, 9), FunctionSite::new("f", "a.g", 20, 22));

        let report = asm.assemble();
        assert_eq!(report.lines_for("a.g").unwrap().len(), 9);
        assert!(report.calls_at("a.g", 9).unwrap().called.contains(&FunctionSite::new("f", "a.g", 20, 22)));
    }

    #[test]
    fn test_unresolved_file_dropped_with_warning() {
        let mut asm = assembler();
        asm.files.register(1, "a.g").unwrap();
        asm.lines.record_exec(LineLocation::new(1, 1), 1);
        asm.lines.record_exec(LineLocation::new(5, 1), 1);

        let report = asm.assemble();
        assert_eq!(report.line_info.len(), 1);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("id 5"));
    }

    #[test]
    fn test_no_file_id_is_skipped_silently() {
        let mut asm = assembler();
        asm.lines.add_self_ticks(LineLocation::NOWHERE, 3);

        let report = asm.assemble();
        assert!(report.line_info.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_caller_locations_resolved() {
        let mut asm = assembler();
        asm.files.register(1, "a.g").unwrap();
        asm.files.register(2, "b.g").unwrap();
        asm.lines.record_exec(LineLocation::new(2, 9), 1);
        asm.xref.record_caller(
            LineLocation::new(2, 9),
            CallerSite {
                function: "main".to_string(),
                at: LineLocation::new(1, 3),
            },
        );
        asm.xref.record_caller(
            LineLocation::new(2, 9),
            CallerSite {
                function: "lost".to_string(),
                at: LineLocation::new(8, 1),
            },
        );

        let report = asm.assemble();
        let calling = &report.calls_at("b.g", 9).unwrap().calling;
        assert_eq!(calling.len(), 1);
        assert!(calling.contains(&Location {
            name: "main".to_string(),
            file: "a.g".to_string(),
            line: 3,
        }));
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_caller_without_location_skipped_silently() {
        let mut asm = assembler();
        asm.files.register(1, "a.g").unwrap();
        asm.lines.record_exec(LineLocation::new(1, 4), 1);
        asm.xref.record_caller(
            LineLocation::new(1, 4),
            CallerSite {
                function: "main".to_string(),
                at: LineLocation::NOWHERE,
            },
        );

        let report = asm.assemble();
        assert!(report.calls_at("a.g", 4).unwrap().calling.is_empty());
        assert!(report.warnings.is_empty());
    }
}
