// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! The run lifecycle as a plain state machine.
//!
//! ```text
//! Idle                 --notification-->  debounce armed (still Idle)
//! Idle                 --debounce fires-> Running
//! Running              --notification-->  RunningPendingRerun
//! Running              --run completes--> Idle
//! RunningPendingRerun  --notification-->  RunningPendingRerun (request merged)
//! RunningPendingRerun  --run completes--> Running (next run starts at once)
//! ```
//!
//! No IO, no timers: the coordinator feeds events in and acts on the
//! returned decisions.

use crate::pipeline::RunKind;
use crate::rules::{ExtensionRules, TriggerKind};
use std::path::PathBuf;

/// Phase of the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run is active.
    Idle,
    /// A run is active and nothing is queued behind it.
    Running,
    /// A run is active and one more run is queued behind it.
    RunningPendingRerun,
}

/// A change reported by the watcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeNotification {
    /// The changed path.
    pub path: PathBuf,
    /// What kind of rebuild it calls for.
    pub kind: TriggerKind,
}

impl ChangeNotification {
    /// Creates a notification.
    pub fn new(path: impl Into<PathBuf>, kind: TriggerKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// Creates a notification, classifying the path with `rules`.
    pub fn classify(path: impl Into<PathBuf>, rules: &ExtensionRules) -> Self {
        let path = path.into();
        let kind = rules.trigger_kind(&path);
        Self { path, kind }
    }

    /// The run this notification asks for on its own.
    pub fn run_kind(&self) -> RunKind {
        match self.kind {
            TriggerKind::FullRebuild => RunKind::Full,
            TriggerKind::SingleFile => RunKind::Single(self.path.clone()),
        }
    }
}

/// What to do with a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationDecision {
    /// Nothing is running: (re)arm the debounce timer for this run.
    Debounce(RunKind),
    /// A run is active: the request was folded into the pending rerun.
    Queued,
}

/// Owns the run state and decides what runs next.
#[derive(Debug)]
pub struct Scheduler {
    state: RunState,
    pending: Option<RunKind>,
    needs_full: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// A scheduler in `Idle` that has not built anything yet.
    pub fn new() -> Self {
        Self {
            state: RunState::Idle,
            pending: None,
            needs_full: true,
        }
    }

    /// Current phase.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// The run queued behind the active one, if any.
    pub fn pending(&self) -> Option<&RunKind> {
        self.pending.as_ref()
    }

    /// True until a full rebuild has completed. While true every run is full.
    pub fn needs_full(&self) -> bool {
        self.needs_full
    }

    /// Starts the startup run. Returns `None` if a run is already active.
    pub fn start_initial(&mut self) -> Option<RunKind> {
        if self.state != RunState::Idle {
            return None;
        }
        self.state = RunState::Running;
        Some(RunKind::Full)
    }

    /// Handles a change notification.
    ///
    /// While idle the caller debounces; while running the request becomes
    /// (or is merged into) the single pending rerun.
    pub fn on_notification(&mut self, notification: &ChangeNotification) -> NotificationDecision {
        let kind = notification.run_kind();
        match self.state {
            RunState::Idle => NotificationDecision::Debounce(kind),
            RunState::Running => {
                self.pending = Some(kind);
                self.state = RunState::RunningPendingRerun;
                NotificationDecision::Queued
            }
            RunState::RunningPendingRerun => {
                self.pending = Some(match self.pending.take() {
                    Some(pending) => pending.merge(kind),
                    None => kind,
                });
                NotificationDecision::Queued
            }
        }
    }

    /// The debounce timer fired with `kind`. Returns the run to start, or
    /// `None` if a run is already active.
    pub fn on_debounce_fired(&mut self, kind: RunKind) -> Option<RunKind> {
        if self.state != RunState::Idle {
            return None;
        }
        self.state = RunState::Running;
        Some(self.effective(kind))
    }

    /// The active run settled. `full_succeeded` is true when it was a full
    /// rebuild that got past the output reset.
    ///
    /// Returns the follow-up run to start immediately, if one was queued.
    pub fn on_run_complete(&mut self, full_succeeded: bool) -> Option<RunKind> {
        if full_succeeded {
            self.needs_full = false;
        }
        match self.state {
            RunState::RunningPendingRerun => {
                self.state = RunState::Running;
                let next = self.pending.take().unwrap_or(RunKind::Full);
                Some(self.effective(next))
            }
            RunState::Running | RunState::Idle => {
                self.state = RunState::Idle;
                self.pending = None;
                None
            }
        }
    }

    fn effective(&self, kind: RunKind) -> RunKind {
        if self.needs_full {
            RunKind::Full
        } else {
            kind
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(path: &str) -> ChangeNotification {
        ChangeNotification::new(path, TriggerKind::SingleFile)
    }

    fn full(path: &str) -> ChangeNotification {
        ChangeNotification::new(path, TriggerKind::FullRebuild)
    }

    /// A scheduler that has finished its startup build.
    fn warmed_up() -> Scheduler {
        let mut s = Scheduler::new();
        assert_eq!(s.start_initial(), Some(RunKind::Full));
        assert_eq!(s.on_run_complete(true), None);
        s
    }

    #[test]
    fn test_initial_state() {
        let s = Scheduler::new();
        assert_eq!(s.state(), RunState::Idle);
        assert!(s.needs_full());
        assert!(s.pending().is_none());
    }

    #[test]
    fn test_idle_notification_debounces_without_state_change() {
        let mut s = warmed_up();
        let decision = s.on_notification(&single("/src/b.txt"));
        assert_eq!(
            decision,
            NotificationDecision::Debounce(RunKind::Single(PathBuf::from("/src/b.txt")))
        );
        assert_eq!(s.state(), RunState::Idle);
    }

    #[test]
    fn test_debounce_fired_starts_run() {
        let mut s = warmed_up();
        let run = s.on_debounce_fired(RunKind::Single(PathBuf::from("/src/b.txt")));
        assert_eq!(run, Some(RunKind::Single(PathBuf::from("/src/b.txt"))));
        assert_eq!(s.state(), RunState::Running);

        // A second firing while running does not start another run
        assert_eq!(s.on_debounce_fired(RunKind::Full), None);
    }

    #[test]
    fn test_first_run_is_always_full() {
        let mut s = Scheduler::new();
        let run = s.on_debounce_fired(RunKind::Single(PathBuf::from("/src/b.txt")));
        assert_eq!(run, Some(RunKind::Full));
    }

    #[test]
    fn test_failed_first_run_keeps_forcing_full() {
        let mut s = Scheduler::new();
        s.start_initial();
        assert_eq!(s.on_run_complete(false), None);
        assert!(s.needs_full());
        let run = s.on_debounce_fired(RunKind::Single(PathBuf::from("/src/b.txt")));
        assert_eq!(run, Some(RunKind::Full));
    }

    #[test]
    fn test_many_notifications_while_running_coalesce_into_one_rerun() {
        let mut s = warmed_up();
        s.on_debounce_fired(RunKind::Full);

        for _ in 0..10 {
            assert_eq!(s.on_notification(&single("/src/a.php")), NotificationDecision::Queued);
        }
        assert_eq!(s.state(), RunState::RunningPendingRerun);

        let next = s.on_run_complete(true);
        assert_eq!(next, Some(RunKind::Single(PathBuf::from("/src/a.php"))));
        assert_eq!(s.state(), RunState::Running);
        assert!(s.pending().is_none());

        // The rerun completes with nothing queued behind it
        assert_eq!(s.on_run_complete(false), None);
        assert_eq!(s.state(), RunState::Idle);
    }

    #[test]
    fn test_run_without_notifications_goes_idle() {
        let mut s = warmed_up();
        s.on_debounce_fired(RunKind::Full);
        assert_eq!(s.on_run_complete(true), None);
        assert_eq!(s.state(), RunState::Idle);
    }

    #[test]
    fn test_pending_full_is_not_downgraded() {
        let mut s = warmed_up();
        s.on_debounce_fired(RunKind::Single(PathBuf::from("/src/b.txt")));
        s.on_notification(&full("/src/header.html"));
        s.on_notification(&single("/src/b.txt"));
        assert_eq!(s.on_run_complete(false), Some(RunKind::Full));
    }

    #[test]
    fn test_pending_distinct_paths_escalate_to_full() {
        let mut s = warmed_up();
        s.on_debounce_fired(RunKind::Single(PathBuf::from("/src/b.txt")));
        s.on_notification(&single("/src/a.php"));
        s.on_notification(&single("/src/b.txt"));
        assert_eq!(s.on_run_complete(false), Some(RunKind::Full));
    }

    #[test]
    fn test_notifications_during_startup_run_rerun_full() {
        let mut s = Scheduler::new();
        s.start_initial();
        s.on_notification(&single("/src/b.txt"));
        // The startup run failed at the reset step, so the rerun is full
        assert_eq!(s.on_run_complete(false), Some(RunKind::Full));
    }

    #[test]
    fn test_start_initial_only_from_idle() {
        let mut s = Scheduler::new();
        assert!(s.start_initial().is_some());
        assert!(s.start_initial().is_none());
    }

    #[test]
    fn test_classify() {
        let rules = ExtensionRules::default();
        assert_eq!(
            ChangeNotification::classify("/src/nav.html", &rules).run_kind(),
            RunKind::Full
        );
        assert_eq!(
            ChangeNotification::classify("/src/a.php", &rules).run_kind(),
            RunKind::Single(PathBuf::from("/src/a.php"))
        );
    }
}
