//! Per-view fixed-interval refresh loop.
//!
//! One poller per mounted view. The loop runs the refresh action
//! immediately on start and then on every tick. Two rules keep a slow or
//! offline backend from piling up work:
//!
//! - ticks that fire while the action is still in flight are skipped,
//!   not queued (the action is awaited inline, so overlap is impossible)
//! - ticks that fire while paused are suppressed; the timer itself keeps
//!   running, so resuming never shifts the tick phase
//!
//! Phase stability matters because views show a "last updated" timestamp
//! that operators expect to step at the configured cadence.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::{CancellationToken, DropGuard};

/// Lifecycle phase of one polling loop.
///
/// There is no explicit Idle value: a loop that has not started yet has
/// no handle, and a stopped loop can only be replaced, never restarted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollPhase {
    Running,
    Paused,
    Stopped,
}

#[derive(Debug, Default)]
struct PollShared {
    pause_until: Mutex<Option<Instant>>,
}

impl PollShared {
    fn pause_deadline(&self) -> Option<Instant> {
        *self
            .pause_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn set_pause_deadline(&self, deadline: Option<Instant>) {
        *self
            .pause_until
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = deadline;
    }

    fn is_gated(&self, now: Instant) -> bool {
        self.pause_deadline().is_some_and(|deadline| deadline > now)
    }
}

/// Cloneable pause/resume view of a running poller.
///
/// Handed to collaborators (the search debouncer) that must gate refresh
/// while the operator types but have no business stopping the loop.
#[derive(Debug, Clone)]
pub struct PollPauser {
    shared: Arc<PollShared>,
}

impl PollPauser {
    /// Suppress ticks until `duration` from now.
    ///
    /// A second call while already paused overwrites the deadline with
    /// `now + duration` - deadlines replace, they never stack.
    pub fn pause(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        self.shared.set_pause_deadline(Some(deadline));
        tracing::debug!(event = "sync.poll.paused", duration_ms = duration.as_millis() as u64);
    }

    /// Clear any pause deadline. The next natural tick runs on schedule;
    /// no immediate re-run is forced.
    pub fn resume(&self) {
        self.shared.set_pause_deadline(None);
        tracing::debug!(event = "sync.poll.resumed");
    }
}

/// Handle to one view's polling loop.
///
/// Dropping the handle cancels the loop, so an unmounted view cannot
/// leak a timer that later fires against torn-down state.
pub struct PollHandle {
    shared: Arc<PollShared>,
    cancel: CancellationToken,
    _guard: DropGuard,
}

impl PollHandle {
    /// See [`PollPauser::pause`].
    pub fn pause(&self, duration: Duration) {
        self.pauser().pause(duration);
    }

    /// See [`PollPauser::resume`].
    pub fn resume(&self) {
        self.pauser().resume();
    }

    /// A pause/resume-only view for collaborators.
    pub fn pauser(&self) -> PollPauser {
        PollPauser {
            shared: self.shared.clone(),
        }
    }

    pub fn phase(&self) -> PollPhase {
        if self.cancel.is_cancelled() {
            PollPhase::Stopped
        } else if self.shared.is_gated(Instant::now()) {
            PollPhase::Paused
        } else {
            PollPhase::Running
        }
    }

    /// Stop the loop permanently. Consumes the handle - a stopped poller
    /// cannot be restarted; mount a new view, start a new poller.
    pub fn stop(self) {
        self.cancel.cancel();
        tracing::debug!(event = "sync.poll.stop_requested");
    }
}

/// Starts polling loops. See [`PollingScheduler::start`].
pub struct PollingScheduler;

impl PollingScheduler {
    /// Start a polling loop: run `action` once immediately, then once per
    /// `interval` until the handle is stopped or dropped.
    ///
    /// The action owns its error handling - a failed refresh logs and the
    /// loop keeps ticking. Only `stop()` or teardown halts the loop.
    pub fn start<F, Fut>(interval: Duration, mut action: F) -> PollHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send,
    {
        let shared = Arc::new(PollShared::default());
        let cancel = CancellationToken::new();

        let task_shared = shared.clone();
        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // Skip (not burst) ticks missed while an action ran long; the
            // next tick stays aligned to the original schedule.
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    tick = ticker.tick() => {
                        if task_shared.is_gated(tick) {
                            tracing::trace!(event = "sync.poll.tick_gated");
                            continue;
                        }
                        action().await;
                    }
                }
            }
            tracing::debug!(event = "sync.poll.stopped");
        });

        PollHandle {
            shared,
            cancel: cancel.clone(),
            _guard: cancel.drop_guard(),
        }
    }
}
