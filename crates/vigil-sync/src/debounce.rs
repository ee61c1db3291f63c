//! Search input debouncer.
//!
//! Rapid keystrokes coalesce into a single filter application that fires
//! one quiet period after the last input. Every keystroke also pauses the
//! view's polling loop for the same quiet period, so a background refresh
//! cannot clobber the list mid-edit. Filtering itself is the caller's
//! synchronous, pure function over already-fetched data - the debouncer
//! never triggers a network call, and the paused poller resumes on its
//! own when the pause deadline lapses.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::{CancellationToken, DropGuard};

use crate::poll::PollPauser;

/// Handle to one searchable view's debouncer task.
///
/// Dropping the handle cancels the task and any pending quiet timer.
pub struct SearchDebouncer {
    input_tx: mpsc::UnboundedSender<String>,
    _guard: DropGuard,
}

impl SearchDebouncer {
    /// Spawn a debouncer.
    ///
    /// `apply` receives the most recent input text exactly once per burst,
    /// `quiet_period` after the last keystroke.
    pub fn spawn<F>(quiet_period: Duration, pauser: PollPauser, mut apply: F) -> Self
    where
        F: FnMut(String) + Send + 'static,
    {
        let (input_tx, mut input_rx) = mpsc::unbounded_channel::<String>();
        let cancel = CancellationToken::new();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            let mut latest: Option<String> = None;
            let mut deadline: Option<Instant> = None;
            loop {
                tokio::select! {
                    _ = task_cancel.cancelled() => break,
                    input = input_rx.recv() => {
                        match input {
                            Some(text) => {
                                latest = Some(text);
                                deadline = Some(Instant::now() + quiet_period);
                                pauser.pause(quiet_period);
                                tracing::trace!(event = "sync.debounce.armed");
                            }
                            None => break,
                        }
                    }
                    _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)),
                        if deadline.is_some() =>
                    {
                        deadline = None;
                        if let Some(text) = latest.take() {
                            tracing::debug!(event = "sync.debounce.applied");
                            apply(text);
                        }
                    }
                }
            }
            tracing::debug!(event = "sync.debounce.stopped");
        });

        Self {
            input_tx,
            _guard: cancel.drop_guard(),
        }
    }

    /// Record a keystroke: remembers the text and re-arms the quiet timer.
    pub fn on_input(&self, text: impl Into<String>) {
        if self.input_tx.send(text.into()).is_err() {
            tracing::warn!(event = "sync.debounce.task_gone");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poll::PollingScheduler;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::sleep;

    const QUIET: Duration = Duration::from_millis(2000);

    #[tokio::test(start_paused = true)]
    async fn test_burst_applies_filter_exactly_once() {
        let applied = Arc::new(std::sync::Mutex::new(Vec::<String>::new()));
        let poll_count = Arc::new(AtomicU32::new(0));

        let c = poll_count.clone();
        let handle = PollingScheduler::start(Duration::from_millis(60_000), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });

        let sink = applied.clone();
        let debouncer = SearchDebouncer::spawn(QUIET, handle.pauser(), move |text| {
            sink.lock().unwrap().push(text);
        });

        // Five keystrokes inside one quiet window.
        for text in ["p", "ph", "phi", "phis", "phish"] {
            debouncer.on_input(text);
            sleep(Duration::from_millis(100)).await;
        }

        sleep(Duration::from_millis(1800)).await;
        assert!(applied.lock().unwrap().is_empty(), "quiet period not over yet");

        // 2000ms after the last keystroke the filter fires once, with the
        // final text.
        sleep(Duration::from_millis(300)).await;
        assert_eq!(applied.lock().unwrap().as_slice(), ["phish".to_string()]);

        // No second application later.
        sleep(Duration::from_millis(3000)).await;
        assert_eq!(applied.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_typing_pauses_polling_until_quiet() {
        let poll_count = Arc::new(AtomicU32::new(0));
        let c = poll_count.clone();
        let handle = PollingScheduler::start(Duration::from_millis(1000), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });
        sleep(Duration::from_millis(10)).await;
        assert_eq!(poll_count.load(Ordering::SeqCst), 1);

        let debouncer = SearchDebouncer::spawn(QUIET, handle.pauser(), |_| {});
        debouncer.on_input("ph");

        // Ticks at 1000 and 2000 fall inside the pause window.
        sleep(Duration::from_millis(1990)).await;
        assert_eq!(
            poll_count.load(Ordering::SeqCst),
            1,
            "refresh must not clobber the list while typing"
        );

        // The poller resumes by deadline expiry, on its own schedule.
        sleep(Duration::from_millis(1100)).await;
        assert_eq!(poll_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_keystroke_extends_the_pause() {
        let poll_count = Arc::new(AtomicU32::new(0));
        let c = poll_count.clone();
        let handle = PollingScheduler::start(Duration::from_millis(1000), move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
            }
        });
        sleep(Duration::from_millis(10)).await;

        let debouncer = SearchDebouncer::spawn(QUIET, handle.pauser(), |_| {});

        // Keystrokes every 1500ms keep re-arming the 2000ms pause, so the
        // poller stays gated the whole time.
        for _ in 0..3 {
            debouncer.on_input("q");
            sleep(Duration::from_millis(1500)).await;
        }
        assert_eq!(poll_count.load(Ordering::SeqCst), 1, "pause extended by typing");
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_apply() {
        let applied = Arc::new(AtomicU32::new(0));
        let handle = PollingScheduler::start(Duration::from_millis(60_000), || async {});
        let sink = applied.clone();
        let debouncer = SearchDebouncer::spawn(QUIET, handle.pauser(), move |_| {
            sink.fetch_add(1, Ordering::SeqCst);
        });

        debouncer.on_input("abc");
        sleep(Duration::from_millis(500)).await;
        drop(debouncer);

        sleep(Duration::from_millis(5000)).await;
        assert_eq!(
            applied.load(Ordering::SeqCst),
            0,
            "torn-down view must not receive a late filter application"
        );
    }
}
