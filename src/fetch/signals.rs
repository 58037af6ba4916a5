//! Translation of libgit2 progress signals into phase events
//!
//! libgit2 reports progress through three unrelated callbacks: server
//! sideband text, transfer statistics and checkout counts. `PhaseTracker`
//! folds them into a strictly sequential stream of BEGIN/update/END events.

use crate::progress::{Operation, PhaseCode, ProgressListener};
use crate::utils::format_size;
use once_cell::sync::Lazy;
use regex::Regex;

/// `Counting objects:  50% (50/100)` or `Counting objects: 5, done.`
static SIDEBAND_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?P<label>[A-Za-z ]+):\s+(?:(?P<pct>\d+)%\s+\((?P<cur>\d+)/(?P<total>\d+)\)|(?P<count>\d+))(?P<rest>.*)$",
    )
    .expect("valid regex")
});

/// Counters copied out of `git2::Progress`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferSnapshot {
    pub total_objects: u64,
    pub received_objects: u64,
    pub received_bytes: u64,
    pub total_deltas: u64,
    pub indexed_deltas: u64,
}

impl From<&git2::Progress<'_>> for TransferSnapshot {
    fn from(stats: &git2::Progress<'_>) -> Self {
        Self {
            total_objects: stats.total_objects() as u64,
            received_objects: stats.received_objects() as u64,
            received_bytes: stats.received_bytes() as u64,
            total_deltas: stats.total_deltas() as u64,
            indexed_deltas: stats.indexed_deltas() as u64,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ActivePhase {
    operation: Operation,
    current: u64,
    total: Option<u64>,
}

pub struct PhaseTracker<'l> {
    listener: &'l mut dyn ProgressListener,
    active: Option<ActivePhase>,
    completed: Vec<Operation>,
    pending_sideband: String,
}

impl<'l> PhaseTracker<'l> {
    pub fn new(listener: &'l mut dyn ProgressListener) -> Self {
        Self { listener, active: None, completed: Vec::new(), pending_sideband: String::new() }
    }

    /// Feed raw sideband bytes. Partial lines are buffered until their
    /// terminating `\r` or `\n` arrives.
    pub fn sideband(&mut self, data: &[u8]) {
        self.pending_sideband.push_str(&String::from_utf8_lossy(data));

        while let Some(idx) = self.pending_sideband.find(['\r', '\n']) {
            let line: String = self.pending_sideband.drain(..=idx).collect();
            self.sideband_line(line.trim_end_matches(['\r', '\n']));
        }
    }

    fn sideband_line(&mut self, line: &str) {
        let line = line.trim().strip_prefix("remote:").unwrap_or(line.trim()).trim();
        let Some(caps) = SIDEBAND_LINE.captures(line) else {
            return;
        };

        let operation = match caps["label"].trim() {
            "Counting objects" => Operation::Counting,
            "Compressing objects" => Operation::Compressing,
            "Finding sources" => Operation::FindingSources,
            _ => return,
        };

        let number = |name: &str| caps.name(name).and_then(|m| m.as_str().parse::<u64>().ok());
        let (current, total) = match number("cur") {
            Some(cur) => (cur, number("total")),
            None => (number("count").unwrap_or(0), None),
        };

        let rest = caps.name("rest").map_or("", |m| m.as_str());
        let done = rest.contains("done");
        let message = rest.trim_start_matches(|c: char| c == ',' || c.is_whitespace()).trim_end();

        self.emit(operation, current, total, message, done);
    }

    pub fn transfer(&mut self, stats: TransferSnapshot) {
        if stats.total_objects == 0 {
            return;
        }

        let received_all = stats.received_objects >= stats.total_objects;
        self.emit(
            Operation::Receiving,
            stats.received_objects,
            Some(stats.total_objects),
            &format_size(stats.received_bytes),
            received_all,
        );

        if received_all && stats.total_deltas > 0 {
            self.emit(
                Operation::Resolving,
                stats.indexed_deltas,
                Some(stats.total_deltas),
                "",
                stats.indexed_deltas >= stats.total_deltas,
            );
        }
    }

    pub fn checkout(&mut self, current: usize, total: usize) {
        if total == 0 {
            return;
        }
        let (current, total) = (current as u64, total as u64);
        self.emit(Operation::CheckingOut, current, Some(total), "", current >= total);
    }

    /// Close the active phase and forget completed ones, ready for the
    /// next repository (a submodule) reusing this tracker.
    pub fn close(&mut self) {
        if let Some(active) = self.active.take() {
            self.listener.on_phase_event(
                PhaseCode::end(active.operation),
                active.current,
                active.total,
                "",
            );
        }
        self.completed.clear();
        self.pending_sideband.clear();
    }

    fn emit(
        &mut self,
        operation: Operation,
        current: u64,
        total: Option<u64>,
        message: &str,
        done: bool,
    ) {
        if self.completed.contains(&operation) {
            return;
        }

        let mut code = PhaseCode::update(operation);
        let previous = self.active;
        match previous {
            Some(active) if active.operation == operation => {}
            Some(active) => {
                self.listener.on_phase_event(
                    PhaseCode::end(active.operation),
                    active.current,
                    active.total,
                    "",
                );
                self.completed.push(active.operation);
                code = code.with_begin();
            }
            None => code = code.with_begin(),
        }

        if done {
            code = code.with_end();
        }
        self.listener.on_phase_event(code, current, total, message);

        if done {
            self.active = None;
            self.completed.push(operation);
        } else {
            self.active = Some(ActivePhase { operation, current, total });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<(u32, u64, Option<u64>, String)>);

    impl ProgressListener for Recorder {
        fn on_phase_event(
            &mut self,
            code: PhaseCode,
            current: u64,
            total: Option<u64>,
            message: &str,
        ) {
            self.0.push((code.0, current, total, message.to_string()));
        }
    }

    const BEGIN: u32 = PhaseCode::BEGIN;
    const END: u32 = PhaseCode::END;

    #[test]
    fn sideband_lines_become_counting_and_compressing_phases() {
        let mut rec = Recorder::default();
        {
            let mut tracker = PhaseTracker::new(&mut rec);
            tracker.sideband(b"Counting objects:  50% (5/10)\r");
            tracker.sideband(b"Counting objects: 100% (10/10), done.\n");
            tracker.sideband(b"Compressing objects: 100% (4/4), done.\n");
        }

        assert_eq!(
            rec.0,
            vec![
                (BEGIN | PhaseCode::COUNTING, 5, Some(10), String::new()),
                (END | PhaseCode::COUNTING, 10, Some(10), "done.".to_string()),
                (BEGIN | END | PhaseCode::COMPRESSING, 4, Some(4), "done.".to_string()),
            ]
        );
    }

    #[test]
    fn partial_sideband_lines_are_buffered() {
        let mut rec = Recorder::default();
        {
            let mut tracker = PhaseTracker::new(&mut rec);
            tracker.sideband(b"Counting obj");
            tracker.sideband(b"ects: 12, done.\nTotal 12 (delta 0)\n");
        }

        assert_eq!(rec.0, vec![(BEGIN | END | PhaseCode::COUNTING, 12, None, "done.".to_string())]);
    }

    #[test]
    fn enumerating_line_does_not_swallow_counting_progress() {
        let mut rec = Recorder::default();
        {
            let mut tracker = PhaseTracker::new(&mut rec);
            tracker.sideband(b"remote: Enumerating objects: 12, done.\n");
            tracker.sideband(b"remote: Counting objects:  50% (6/12)\r");
            tracker.sideband(b"remote: Counting objects: 100% (12/12), done.\n");
            tracker.sideband(b"remote: Compressing objects: 100% (4/4), done.\n");
        }

        assert_eq!(
            rec.0,
            vec![
                (BEGIN | PhaseCode::COUNTING, 6, Some(12), String::new()),
                (END | PhaseCode::COUNTING, 12, Some(12), "done.".to_string()),
                (BEGIN | END | PhaseCode::COMPRESSING, 4, Some(4), "done.".to_string()),
            ]
        );
    }

    #[test]
    fn transfer_moves_from_receiving_to_resolving() {
        let mut rec = Recorder::default();
        {
            let mut tracker = PhaseTracker::new(&mut rec);
            let mut stats = TransferSnapshot { total_objects: 4, total_deltas: 2, ..Default::default() };
            stats.received_objects = 2;
            tracker.transfer(stats);
            stats.received_objects = 4;
            stats.received_bytes = 2048;
            tracker.transfer(stats);
            stats.indexed_deltas = 1;
            tracker.transfer(stats);
            stats.indexed_deltas = 2;
            tracker.transfer(stats);
            // libgit2 repeats the final stats; they must not reopen phases
            tracker.transfer(stats);
        }

        let codes: Vec<u32> = rec.0.iter().map(|e| e.0).collect();
        assert_eq!(
            codes,
            vec![
                BEGIN | PhaseCode::RECEIVING,
                END | PhaseCode::RECEIVING,
                BEGIN | PhaseCode::RESOLVING,
                PhaseCode::RESOLVING,
                END | PhaseCode::RESOLVING,
            ]
        );
        assert_eq!(rec.0[1].3, "2.0 KB");
        assert_eq!(rec.0[4].1, 2);
    }

    #[test]
    fn switching_phase_closes_the_unfinished_one() {
        let mut rec = Recorder::default();
        {
            let mut tracker = PhaseTracker::new(&mut rec);
            tracker.transfer(TransferSnapshot {
                total_objects: 10,
                received_objects: 3,
                ..Default::default()
            });
            tracker.checkout(0, 2);
        }

        let codes: Vec<u32> = rec.0.iter().map(|e| e.0).collect();
        assert_eq!(
            codes,
            vec![
                BEGIN | PhaseCode::RECEIVING,
                END | PhaseCode::RECEIVING,
                BEGIN | PhaseCode::CHECKING_OUT,
            ]
        );
    }

    #[test]
    fn close_allows_phases_to_repeat_for_submodules() {
        let mut rec = Recorder::default();
        {
            let mut tracker = PhaseTracker::new(&mut rec);
            tracker.checkout(1, 1);
            tracker.checkout(1, 1);
            tracker.close();
            tracker.checkout(1, 1);
        }

        assert_eq!(rec.0.len(), 2);
        assert!(rec.0.iter().all(|e| e.0 == BEGIN | END | PhaseCode::CHECKING_OUT));
    }

    #[test]
    fn unrelated_sideband_text_is_ignored() {
        let mut rec = Recorder::default();
        {
            let mut tracker = PhaseTracker::new(&mut rec);
            tracker.sideband(b"remote: Total 3 (delta 0), reused 0 (delta 0)\n");
            tracker.sideband(b"Some hook: 3 warnings\n");
        }
        assert!(rec.0.is_empty());
    }
}
