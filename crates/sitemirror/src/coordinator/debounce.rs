// Copyright 2019-2026 Maravilla Labs, operated by SOLUTAS GmbH, Switzerland
// SPDX-License-Identifier: Apache-2.0
// SPDX-License-Identifier: MIT

//! Cancellable debounce timer owned by the coordinator.

use crate::pipeline::RunKind;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{sleep_until, Instant, Sleep};

/// Default quiet period before a debounced run starts.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

struct Armed {
    sleep: Pin<Box<Sleep>>,
    kind: RunKind,
}

/// A single timer that fires once a configured quiet period has passed
/// since it was last armed.
///
/// Arming an armed timer pushes its deadline back and merges the requested
/// run into the one already waiting.
pub struct Debounce {
    delay: Duration,
    armed: Option<Armed>,
}

impl Debounce {
    /// Creates an unarmed timer.
    pub fn new(delay: Duration) -> Self {
        Self { delay, armed: None }
    }

    /// The quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// True while a run is waiting for the timer.
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// When the timer will fire, if armed.
    pub fn deadline(&self) -> Option<Instant> {
        self.armed.as_ref().map(|armed| armed.sleep.deadline())
    }

    /// Arms the timer, or restarts it if already armed.
    pub fn arm(&mut self, kind: RunKind) {
        let deadline = Instant::now() + self.delay;
        match self.armed.take() {
            Some(mut armed) => {
                armed.sleep.as_mut().reset(deadline);
                armed.kind = armed.kind.merge(kind);
                self.armed = Some(armed);
            }
            None => {
                self.armed = Some(Armed {
                    sleep: Box::pin(sleep_until(deadline)),
                    kind,
                });
            }
        }
    }

    /// Disarms the timer, returning the run that was waiting.
    pub fn cancel(&mut self) -> Option<RunKind> {
        self.armed.take().map(|armed| armed.kind)
    }

    /// Waits for the timer to fire and disarms it.
    ///
    /// Never completes while unarmed. Cancel safe: dropping the future
    /// before it completes leaves the timer armed.
    pub async fn fired(&mut self) -> Option<RunKind> {
        match self.armed.as_mut() {
            Some(armed) => armed.sleep.as_mut().await,
            None => std::future::pending::<()>().await,
        }
        self.cancel()
    }
}
