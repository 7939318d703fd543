//! Call-stack reconstruction and timing correction.
//!
//! The tracker consumes events in trace order. It keeps the live call
//! stack, the persistent call tree, and two cursors:
//!
//! - `prev_exec`: the last executed line. Ticks reported on an Exec record
//!   measure the time since the previous Exec, so they are charged to it.
//! - `calling_location`: the line we would say makes the next call. It
//!   tracks `prev_exec` except right after a return, when it goes back to
//!   the line that made the call.
//!
//! On return, the call-site line's inclusive time is corrected with the
//! snapshot taken on entry:
//!
//! ```text
//! inclusive = snap.inclusive + (total - snap.total) - (self_now - snap.self)
//! ```
//!
//! i.e. everything that elapsed during the call, minus what was already
//! charged to the call-site line itself in that window.

use super::call_tree::{CallTree, NodeId};
use super::cross_ref::{CallerSite, CrossReference};
use super::file_table::FileTable;
use super::line_stats::LineStatsTable;
use super::report::ReportAssembler;
use crate::parser::{
    DecodeError, Event, FileId, FunctionSite, LineLocation, ProfileInfo, ProfileReport,
};
use crate::utils::config::{ReduceConfig, NO_FILE};
use crate::utils::error::ProfileError;
use log::{debug, warn};

/// Line and clock values captured when a call is entered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrectionSnapshot {
    pub call_site_self_ticks: u64,
    pub call_site_inclusive_ticks: u64,
    pub total_ticks: u64,
}

/// One open call
#[derive(Debug, Clone)]
struct PendingFrame {
    site: FunctionSite,
    call_site: LineLocation,
    snapshot: CorrectionSnapshot,
}

/// Stateful core of a reduction run
#[derive(Debug)]
pub struct CallStackTracker {
    files: FileTable,
    lines: LineStatsTable,
    xref: CrossReference,
    tree: CallTree,
    current: NodeId,
    frames: Vec<PendingFrame>,
    total_ticks: u64,
    prev_exec: Option<LineLocation>,
    calling_location: LineLocation,
    info: ProfileInfo,
    tolerance: usize,
    malformed_lines: usize,
}

impl Default for CallStackTracker {
    fn default() -> Self {
        Self::new(&ReduceConfig::default())
    }
}

impl CallStackTracker {
    pub fn new(config: &ReduceConfig) -> Self {
        let tree = CallTree::new();
        let current = tree.root();
        Self {
            files: FileTable::new(),
            lines: LineStatsTable::new(),
            xref: CrossReference::new(),
            tree,
            current,
            frames: Vec::new(),
            total_ticks: 0,
            prev_exec: None,
            calling_location: LineLocation::NOWHERE,
            info: ProfileInfo::default(),
            tolerance: config.malformed_line_tolerance,
            malformed_lines: 0,
        }
    }

    /// Apply one event
    ///
    /// # Errors
    /// * `ProfileError::DuplicateFileId` - an `InternFile` reused an id
    pub fn process(&mut self, event: Event) -> Result<(), ProfileError> {
        match event {
            Event::Read { file_id, line } => {
                self.lines.record_read(LineLocation::new(file_id, line));
            }
            Event::Exec {
                file_id,
                line,
                ticks,
                exec_count,
            } => self.on_exec(LineLocation::new(file_id, line), ticks, exec_count),
            Event::EnterFunction {
                name,
                file,
                file_id,
                line,
                end_line,
            } => self.on_enter(FunctionSite::new(name, file, line, end_line), file_id),
            Event::ExitFunction => self.on_exit(),
            Event::InternFile { file_id, path } => self.files.register(file_id, path)?,
            Event::Info {
                is_cover,
                time_type,
                at,
            } => {
                self.info = ProfileInfo {
                    is_cover,
                    time_type,
                };
                self.calling_location = at;
            }
        }
        Ok(())
    }

    /// Count a line that failed to decode. Nothing else changes.
    ///
    /// # Errors
    /// * `ProfileError::Decode` - the failure is fatal (a too-new format)
    /// * `ProfileError::TooManyMalformedLines` - the tolerance is used up
    pub fn record_decode_failure(&mut self, err: DecodeError) -> Result<(), ProfileError> {
        if err.is_fatal() {
            return Err(err.into());
        }

        self.malformed_lines += 1;
        if self.malformed_lines > self.tolerance {
            return Err(ProfileError::TooManyMalformedLines {
                count: self.malformed_lines,
                tolerance: self.tolerance,
                last: err,
            });
        }

        warn!(
            "Skipping malformed trace line ({}/{} tolerated): {}",
            self.malformed_lines, self.tolerance, err
        );
        Ok(())
    }

    fn on_exec(&mut self, here: LineLocation, ticks: u64, exec_count: u64) {
        self.lines.record_exec(here, exec_count);

        // The first Exec has nothing before it to charge.
        if let Some(prev) = self.prev_exec {
            if ticks > 0 {
                self.lines.add_self_ticks(prev, ticks);
                self.tree.node_mut(self.current).self_ticks += ticks;
                self.total_ticks += ticks;
            }
        }

        self.prev_exec = Some(here);
        self.calling_location = here;
    }

    fn on_enter(&mut self, callee: FunctionSite, callee_file_id: FileId) {
        let call_site = self.calling_location;

        self.xref.record_call(call_site, callee.clone());
        if let Some(enclosing) = self.frames.last() {
            if callee_file_id != NO_FILE {
                self.xref.record_caller(
                    LineLocation::new(callee_file_id, callee.line),
                    CallerSite {
                        function: enclosing.site.name.clone(),
                        at: call_site,
                    },
                );
            }
        }

        let at_call_site = self.lines.get(call_site);
        let snapshot = CorrectionSnapshot {
            call_site_self_ticks: at_call_site.self_ticks,
            call_site_inclusive_ticks: at_call_site.inclusive_ticks,
            total_ticks: self.total_ticks,
        };

        self.current = self.tree.child_or_insert(self.current, &callee);
        self.tree.node_mut(self.current).call_count += 1;
        self.frames.push(PendingFrame {
            site: callee,
            call_site,
            snapshot,
        });
    }

    fn on_exit(&mut self) {
        let Some(frame) = self.frames.pop() else {
            debug!("ExitFunction outside any call, trace starts mid-call");
            return;
        };

        self.current = self.tree.parent(self.current).unwrap_or_else(|| self.tree.root());
        self.calling_location = frame.call_site;

        let snap = frame.snapshot;
        let elapsed = self.total_ticks - snap.total_ticks;
        let charged_to_call_site = self
            .lines
            .get(frame.call_site)
            .self_ticks
            .saturating_sub(snap.call_site_self_ticks);
        let inclusive =
            (snap.call_site_inclusive_ticks + elapsed).saturating_sub(charged_to_call_site);

        self.lines.set_inclusive_ticks(frame.call_site, inclusive);
    }

    /// Hand everything to the report assembler. Calls still open are
    /// abandoned: their call sites never get the inclusive correction.
    pub fn into_report(self) -> ProfileReport {
        if !self.frames.is_empty() {
            debug!(
                "Trace ended inside {} open call(s), innermost {}",
                self.frames.len(),
                self.frames.last().map(|f| f.site.name.as_str()).unwrap_or("?")
            );
        }

        ReportAssembler {
            files: self.files,
            lines: self.lines,
            xref: self.xref,
            tree: self.tree,
            info: self.info,
        }
        .assemble()
    }

    pub fn files(&self) -> &FileTable {
        &self.files
    }

    pub fn lines(&self) -> &LineStatsTable {
        &self.lines
    }

    pub fn cross_reference(&self) -> &CrossReference {
        &self.xref
    }

    pub fn call_tree(&self) -> &CallTree {
        &self.tree
    }

    pub fn current_node(&self) -> NodeId {
        self.current
    }

    /// Number of open calls
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    pub fn calling_location(&self) -> LineLocation {
        self.calling_location
    }

    pub fn info(&self) -> &ProfileInfo {
        &self.info
    }

    pub fn malformed_lines(&self) -> usize {
        self.malformed_lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::LineNo;

    fn at(file_id: FileId, line: LineNo) -> LineLocation {
        LineLocation::new(file_id, line)
    }

    fn run(events: Vec<Event>) -> CallStackTracker {
        let mut tracker = CallStackTracker::default();
        for event in events {
            tracker.process(event).unwrap();
        }
        tracker
    }

    #[test]
    fn test_zero_tick_execs_only_count() {
        let tracker = run(vec![
            Event::exec(1, 1, 0),
            Event::exec(1, 2, 0),
            Event::exec(1, 1, 0),
        ]);

        assert_eq!(tracker.lines().get(at(1, 1)).exec_count, 2);
        assert_eq!(tracker.lines().get(at(1, 2)).exec_count, 1);
        assert_eq!(tracker.lines().get(at(1, 1)).self_ticks, 0);
        assert_eq!(tracker.total_ticks(), 0);
    }

    #[test]
    fn test_ticks_charged_to_previous_line() {
        let tracker = run(vec![
            Event::exec(1, 1, 0),
            Event::exec(1, 2, 5),
            Event::exec(1, 3, 7),
        ]);

        assert_eq!(tracker.lines().get(at(1, 1)).self_ticks, 5);
        assert_eq!(tracker.lines().get(at(1, 2)).self_ticks, 7);
        assert_eq!(tracker.lines().get(at(1, 3)).self_ticks, 0);
        assert_eq!(tracker.call_tree().node(tracker.call_tree().root()).self_ticks, 12);
    }

    #[test]
    fn test_first_exec_ticks_are_dropped() {
        let tracker = run(vec![Event::exec(1, 1, 50)]);
        assert_eq!(tracker.total_ticks(), 0);
        assert!(tracker.lines().get(at(1, 1)).self_ticks == 0);
    }

    #[test]
    fn test_exec_count_folds() {
        let tracker = run(vec![Event::Exec {
            file_id: 1,
            line: 4,
            ticks: 0,
            exec_count: 6,
        }]);
        assert_eq!(tracker.lines().get(at(1, 4)).exec_count, 6);
    }

    #[test]
    fn test_enter_and_exit_move_through_tree() {
        let mut tracker = run(vec![Event::exec(1, 1, 0), Event::enter("f", "a.g", 1, 10, 20)]);
        assert_eq!(tracker.depth(), 1);
        assert_ne!(tracker.current_node(), tracker.call_tree().root());

        tracker.process(Event::ExitFunction).unwrap();
        assert_eq!(tracker.depth(), 0);
        assert_eq!(tracker.current_node(), tracker.call_tree().root());
    }

    #[test]
    fn test_exit_on_empty_stack_is_noop() {
        let tracker = run(vec![Event::ExitFunction, Event::exec(1, 1, 0), Event::ExitFunction]);
        assert_eq!(tracker.depth(), 0);
        assert_eq!(tracker.current_node(), tracker.call_tree().root());
        assert_eq!(tracker.calling_location(), at(1, 1));
    }

    #[test]
    fn test_exit_restores_calling_location() {
        let tracker = run(vec![
            Event::exec(1, 3, 0),
            Event::enter("f", "a.g", 1, 10, 20),
            Event::exec(1, 11, 2),
            Event::ExitFunction,
        ]);
        assert_eq!(tracker.calling_location(), at(1, 3));
    }

    #[test]
    fn test_inclusive_correction() {
        // A:1 calls f; f runs B:5 then B:6; back in A:2
        let tracker = run(vec![
            Event::exec(1, 1, 0),
            Event::enter("f", "b.g", 2, 4, 8),
            Event::exec(2, 5, 3),
            Event::exec(2, 6, 7),
            Event::ExitFunction,
            Event::exec(1, 2, 1),
        ]);

        let lines = tracker.lines();
        // 3 ticks before B:5 belong to A:1, the 7 before B:6 to B:5
        assert_eq!(lines.get(at(1, 1)).self_ticks, 3);
        assert_eq!(lines.get(at(2, 5)).self_ticks, 7);
        // 10 elapsed during the call, 3 of them already charged to A:1
        assert_eq!(lines.get(at(1, 1)).inclusive_ticks, 7);
        // the tick after return goes to the last executed line, B:6
        assert_eq!(lines.get(at(2, 6)).self_ticks, 1);
    }

    #[test]
    fn test_inclusive_accumulates_over_calls() {
        let tracker = run(vec![
            Event::exec(1, 1, 0),
            Event::enter("f", "b.g", 2, 4, 8),
            Event::exec(2, 5, 0),
            Event::exec(2, 6, 4),
            Event::ExitFunction,
            Event::enter("f", "b.g", 2, 4, 8),
            Event::exec(2, 5, 0),
            Event::exec(2, 6, 6),
            Event::ExitFunction,
        ]);

        assert_eq!(tracker.lines().get(at(1, 1)).inclusive_ticks, 10);
    }

    #[test]
    fn test_info_sets_location_and_metadata() {
        let tracker = run(vec![Event::Info {
            is_cover: true,
            time_type: "Wall".to_string(),
            at: at(3, 1),
        }]);
        assert!(tracker.info().is_cover);
        assert_eq!(tracker.info().time_type, "Wall");
        assert_eq!(tracker.calling_location(), at(3, 1));
    }

    #[test]
    fn test_duplicate_file_id_is_fatal() {
        let mut tracker = run(vec![Event::InternFile {
            file_id: 1,
            path: "a.g".to_string(),
        }]);
        let err = tracker
            .process(Event::InternFile {
                file_id: 1,
                path: "b.g".to_string(),
            })
            .unwrap_err();
        assert!(matches!(err, ProfileError::DuplicateFileId { .. }));
    }

    #[test]
    fn test_decode_failures_within_tolerance() {
        let mut tracker = CallStackTracker::new(&ReduceConfig::default().with_tolerance(2));
        tracker.record_decode_failure(DecodeError::MissingType).unwrap();
        tracker.record_decode_failure(DecodeError::MissingType).unwrap();
        assert_eq!(tracker.malformed_lines(), 2);

        let err = tracker.record_decode_failure(DecodeError::MissingType).unwrap_err();
        assert!(matches!(
            err,
            ProfileError::TooManyMalformedLines {
                count: 3,
                tolerance: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_version_failure_is_fatal_immediately() {
        let mut tracker = CallStackTracker::default();
        let err = tracker
            .record_decode_failure(DecodeError::UnsupportedVersion {
                found: 3,
                supported: 2,
            })
            .unwrap_err();
        assert!(matches!(
            err,
            ProfileError::Decode(DecodeError::UnsupportedVersion { found: 3, .. })
        ));
        assert_eq!(tracker.malformed_lines(), 0);
    }

    #[test]
    fn test_inverse_xref_needs_enclosing_function_and_file_id() {
        let tracker = run(vec![
            Event::exec(1, 1, 0),
            Event::enter("main", "a.g", 1, 1, 30),
            Event::exec(1, 3, 0),
            Event::enter("g", "b.g", 2, 9, 12),
            Event::enter("h", "c.g", NO_FILE, 4, 5),
        ]);
        let xref = tracker.cross_reference();

        // top-level call: no enclosing function
        assert!(xref.callers_of(at(1, 1)).is_none());

        let callers = xref.callers_of(at(2, 9)).unwrap();
        assert!(callers.contains(&CallerSite {
            function: "main".to_string(),
            at: at(1, 3),
        }));

        // unknown callee file id: forward edge only
        assert!(xref.callers_of(at(NO_FILE, 4)).is_none());
        // both g and h were called while A:3 was the calling line
        assert_eq!(xref.called_at(at(1, 3)).unwrap().len(), 2);
    }
}
