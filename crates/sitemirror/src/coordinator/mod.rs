// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Run coordination.
//!
//! The [`Coordinator`] is the only thing that starts builds. It guarantees:
//!
//! - at most one run is active at a time
//! - at most one run is queued behind it, however many changes arrive
//! - bursts of changes while idle are absorbed by a debounce timer
//! - the first run after startup is a full rebuild
//!
//! It drives a [`Scheduler`] (pure state) and a [`Debounce`] (the timer)
//! from a single event loop, so re-arming the timer and reading the run
//! state never race.

mod debounce;
mod state;

pub use debounce::{Debounce, DEFAULT_DEBOUNCE};
pub use state::{ChangeNotification, NotificationDecision, RunState, Scheduler};

use crate::error::{BuildError, Result};
use crate::pipeline::{BuildPipeline, RunKind, RunSummary};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

/// A settled run, handed to the report callback.
#[derive(Debug)]
pub struct RunOutcome {
    /// What was requested.
    pub kind: RunKind,
    /// The summary, or the error that stopped the run.
    pub result: Result<RunSummary>,
}

struct InFlight {
    kind: RunKind,
    handle: JoinHandle<Result<RunSummary>>,
}

type Reporter = Box<dyn FnMut(&RunOutcome) + Send>;

/// Serializes rebuilds triggered by change notifications.
pub struct Coordinator<P: BuildPipeline> {
    pipeline: Arc<P>,
    scheduler: Scheduler,
    debounce: Debounce,
    reporter: Reporter,
}

impl<P: BuildPipeline> Coordinator<P> {
    /// Creates a coordinator with the default debounce.
    pub fn new(pipeline: Arc<P>) -> Self {
        Self {
            pipeline,
            scheduler: Scheduler::new(),
            debounce: Debounce::new(DEFAULT_DEBOUNCE),
            reporter: Box::new(log_outcome),
        }
    }

    /// Sets the debounce quiet period.
    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce = Debounce::new(delay);
        self
    }

    /// Sets the callback invoked after every run.
    pub fn on_report<F>(mut self, reporter: F) -> Self
    where
        F: FnMut(&RunOutcome) + Send + 'static,
    {
        self.reporter = Box::new(reporter);
        self
    }

    /// Current run state.
    pub fn state(&self) -> RunState {
        self.scheduler.state()
    }

    /// Runs the startup build, then serves notifications until the channel
    /// closes. Returns once the channel is closed and every started or
    /// queued run has finished.
    pub async fn run(mut self, mut notifications: UnboundedReceiver<ChangeNotification>) {
        let mut in_flight = self.scheduler.start_initial().map(|kind| self.launch(kind));
        let mut open = true;

        while open || in_flight.is_some() || self.debounce.is_armed() {
            tokio::select! {
                received = notifications.recv(), if open => match received {
                    Some(notification) => self.handle_notification(&notification),
                    None => {
                        tracing::debug!("notification channel closed");
                        open = false;
                    }
                },
                Some(kind) = self.debounce.fired() => {
                    if let Some(kind) = self.scheduler.on_debounce_fired(kind) {
                        in_flight = Some(self.launch(kind));
                    }
                }
                Some((kind, result)) = join(&mut in_flight) => {
                    let full_succeeded = kind.is_full() && result.is_ok();
                    (self.reporter)(&RunOutcome { kind, result });
                    if let Some(next) = self.scheduler.on_run_complete(full_succeeded) {
                        tracing::debug!("starting queued run: {:?}", next);
                        in_flight = Some(self.launch(next));
                    }
                }
                else => break,
            }
        }
    }

    fn handle_notification(&mut self, notification: &ChangeNotification) {
        tracing::debug!("change: {} ({:?})", notification.path.display(), notification.kind);
        match self.scheduler.on_notification(notification) {
            NotificationDecision::Debounce(kind) => self.debounce.arm(kind),
            NotificationDecision::Queued => {
                tracing::debug!("run in progress, rerun queued");
            }
        }
    }

    fn launch(&self, kind: RunKind) -> InFlight {
        tracing::debug!("starting run: {:?}", kind);
        let pipeline = Arc::clone(&self.pipeline);
        let run_kind = kind.clone();
        let handle = tokio::spawn(async move { pipeline.run(&run_kind).await });
        InFlight { kind, handle }
    }
}

/// Waits for the active run. Yields `None` at once when nothing is running.
async fn join(in_flight: &mut Option<InFlight>) -> Option<(RunKind, Result<RunSummary>)> {
    let joined = (&mut in_flight.as_mut()?.handle).await;
    let kind = in_flight.take()?.kind;
    let result = joined.unwrap_or_else(|err| Err(BuildError::Task(err.to_string())));
    Some((kind, result))
}

/// The default report callback: one log line per run.
pub fn log_outcome(outcome: &RunOutcome) {
    match &outcome.result {
        Ok(summary) if summary.is_success() => {
            tracing::info!("{:?} finished in {:?}", outcome.kind, summary.elapsed);
        }
        Ok(summary) => {
            for (path, err) in &summary.failures {
                tracing::error!("{}: {}", path.display(), err);
            }
        }
        Err(err) => tracing::error!("{:?} failed: {}", outcome.kind, err),
    }
}
