//! Service reachability monitor.
//!
//! One monitor task per client session, shared by every view: reachability
//! is a property of the transport, not of any one screen. The task probes
//! the service on a fixed cadence, flips between Online and Offline, and
//! while offline arms a single backoff retry timer from the
//! [`RetryPolicy`] ladder. In-flight requests feed opportunistic
//! observations into the same task over a command channel, so the monitor
//! remains the only writer of connectivity state.
//!
//! State is published on a `watch` channel (latest snapshot, for banners
//! and countdowns) and transitions on a `broadcast` channel (exactly one
//! event per Online<->Offline edge, never one per probe).

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::backoff::RetryPolicy;

/// Whether the remote service is currently reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Online,
    Offline,
}

/// Snapshot of connectivity state, published on the watch channel.
#[derive(Debug, Clone)]
pub struct ConnectivityState {
    pub reachability: Reachability,
    /// Humanized reason for the most recent failure, if offline.
    pub last_error: Option<String>,
    /// Consecutive-failure counter, clamped to the retry table length.
    /// Resets to zero exactly on recovery or manual retry.
    pub retry_attempt: u32,
    pub last_transition: DateTime<Utc>,
    /// Delay until the pending scheduled retry, if one is armed.
    pub next_retry_in: Option<Duration>,
}

impl ConnectivityState {
    pub fn is_online(&self) -> bool {
        self.reachability == Reachability::Online
    }

    fn initial() -> Self {
        // Optimistic start, same as a fresh page load: the immediate first
        // probe corrects it within one round trip if the service is down.
        Self {
            reachability: Reachability::Online,
            last_error: None,
            retry_attempt: 0,
            last_transition: Utc::now(),
            next_retry_in: None,
        }
    }
}

/// An Online<->Offline transition edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEdge {
    WentOnline,
    WentOffline,
}

/// One lightweight health check against the service.
///
/// Implemented over HTTP (`GET /health`) by vigil-client; tests supply
/// scripted fakes. Implementations must resolve within a bounded timeout;
/// `Err` carries a human-readable reason for the offline banner.
pub trait HealthProbe: Send + Sync {
    fn probe(&self) -> BoxFuture<'_, Result<(), String>>;
}

enum Command {
    RetryNow,
    ObservedReachable,
    ObservedUnreachable { reason: String },
}

/// Cloneable handle to the monitor task.
///
/// All mutation funnels through the command channel; handle holders can
/// only read state or report observations.
#[derive(Clone)]
pub struct ConnectivityHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state_rx: watch::Receiver<ConnectivityState>,
    edge_tx: broadcast::Sender<ConnectivityEdge>,
}

impl ConnectivityHandle {
    /// Latest published state snapshot.
    pub fn state(&self) -> ConnectivityState {
        self.state_rx.borrow().clone()
    }

    pub fn is_online(&self) -> bool {
        self.state_rx.borrow().is_online()
    }

    /// Watch the full state (banner text, retry countdown).
    pub fn watch_state(&self) -> watch::Receiver<ConnectivityState> {
        self.state_rx.clone()
    }

    /// Subscribe to transition edges. Each Online<->Offline flip is
    /// delivered exactly once per subscriber.
    pub fn subscribe_edges(&self) -> broadcast::Receiver<ConnectivityEdge> {
        self.edge_tx.subscribe()
    }

    /// Operator-initiated "retry now": resets the failure counter,
    /// cancels any pending scheduled retry, and probes immediately.
    pub fn retry_now(&self) {
        self.send(Command::RetryNow);
    }

    /// Report that a request received an HTTP response (any status).
    pub fn observe_reachable(&self) {
        self.send(Command::ObservedReachable);
    }

    /// Report that a request failed at the transport level, so the
    /// monitor can go Offline without waiting for its own probe cycle.
    pub fn observe_unreachable(&self, reason: impl Into<String>) {
        self.send(Command::ObservedUnreachable {
            reason: reason.into(),
        });
    }

    fn send(&self, cmd: Command) {
        if self.cmd_tx.send(cmd).is_err() {
            tracing::warn!(event = "sync.connectivity.monitor_gone");
        }
    }
}

/// Periodic health prober with backoff retry while offline.
pub struct ConnectivityMonitor;

impl ConnectivityMonitor {
    /// Spawn the monitor task.
    ///
    /// The first probe fires immediately; afterwards probes run every
    /// `probe_interval` regardless of failures, with offline retries
    /// interleaved on the backoff ladder. Cancelling `shutdown` stops the
    /// task and drops all pending timers.
    pub fn spawn(
        probe: Arc<dyn HealthProbe>,
        policy: RetryPolicy,
        probe_interval: Duration,
        shutdown: CancellationToken,
    ) -> ConnectivityHandle {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(ConnectivityState::initial());
        let (edge_tx, _) = broadcast::channel(16);

        let task = MonitorTask {
            probe,
            policy,
            state: ConnectivityState::initial(),
            state_tx,
            edge_tx: edge_tx.clone(),
            retry_deadline: None,
        };
        tokio::spawn(task.run(cmd_rx, probe_interval, shutdown));

        ConnectivityHandle {
            cmd_tx,
            state_rx,
            edge_tx,
        }
    }
}

struct MonitorTask {
    probe: Arc<dyn HealthProbe>,
    policy: RetryPolicy,
    state: ConnectivityState,
    state_tx: watch::Sender<ConnectivityState>,
    edge_tx: broadcast::Sender<ConnectivityEdge>,
    /// At most one scheduled retry exists; overwriting the deadline is the
    /// idempotent re-arm, clearing it the cancel.
    retry_deadline: Option<Instant>,
}

impl MonitorTask {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<Command>,
        probe_interval: Duration,
        shutdown: CancellationToken,
    ) {
        let mut ticker = tokio::time::interval(probe_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let retry_at = self.retry_deadline;
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::debug!(event = "sync.connectivity.stopped");
                    break;
                }
                _ = ticker.tick() => {
                    self.run_probe().await;
                }
                _ = tokio::time::sleep_until(retry_at.unwrap_or_else(Instant::now)),
                    if retry_at.is_some() =>
                {
                    self.retry_deadline = None;
                    tracing::debug!(
                        event = "sync.connectivity.retry_fired",
                        attempt = self.state.retry_attempt,
                    );
                    self.run_probe().await;
                }
                cmd = cmd_rx.recv() => match cmd {
                    Some(Command::RetryNow) => {
                        tracing::info!(event = "sync.connectivity.manual_retry");
                        self.state.retry_attempt = 0;
                        self.retry_deadline = None;
                        self.run_probe().await;
                    }
                    Some(Command::ObservedReachable) => self.mark_online(),
                    Some(Command::ObservedUnreachable { reason }) => self.mark_offline(reason),
                    None => break,
                },
            }
        }
    }

    async fn run_probe(&mut self) {
        match self.probe.probe().await {
            Ok(()) => self.mark_online(),
            Err(reason) => self.mark_offline(reason),
        }
    }

    fn mark_online(&mut self) {
        let flipped = !self.state.is_online();
        self.state.reachability = Reachability::Online;
        self.state.last_error = None;
        self.state.retry_attempt = 0;
        self.state.next_retry_in = None;
        self.retry_deadline = None;

        if flipped {
            self.state.last_transition = Utc::now();
            tracing::info!(event = "sync.connectivity.online");
            let _ = self.edge_tx.send(ConnectivityEdge::WentOnline);
        }
        self.publish();
    }

    fn mark_offline(&mut self, reason: String) {
        let flipped = self.state.is_online();
        self.state.reachability = Reachability::Offline;
        self.state.last_error = Some(reason);

        if flipped {
            self.state.last_transition = Utc::now();
            tracing::warn!(
                event = "sync.connectivity.offline",
                error = self.state.last_error.as_deref().unwrap_or_default(),
            );
            let _ = self.edge_tx.send(ConnectivityEdge::WentOffline);
        }

        // Arm a retry on the edge or when none is pending. A failure that
        // lands while a retry is already scheduled must not re-arm it, or
        // unlucky interleavings of probe ticks and observations would keep
        // pushing the retry into the future.
        if flipped || self.retry_deadline.is_none() {
            let delay = self.policy.delay_for(self.state.retry_attempt);
            self.retry_deadline = Some(Instant::now() + delay);
            self.state.retry_attempt = self.policy.next_attempt(self.state.retry_attempt);
            tracing::debug!(
                event = "sync.connectivity.retry_scheduled",
                delay_ms = delay.as_millis() as u64,
                attempt = self.state.retry_attempt,
            );
        }
        self.state.next_retry_in = self
            .retry_deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()));
        self.publish();
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::sleep;

    /// Scripted probe: pops outcomes from a queue, repeating the final
    /// entry once exhausted.
    struct ScriptedProbe {
        script: Mutex<VecDeque<Result<(), String>>>,
        last: Mutex<Result<(), String>>,
        calls: AtomicU32,
    }

    impl ScriptedProbe {
        fn new(outcomes: Vec<Result<(), String>>) -> Arc<Self> {
            Arc::new(Self {
                last: Mutex::new(
                    outcomes.last().cloned().unwrap_or(Ok(())),
                ),
                script: Mutex::new(outcomes.into()),
                calls: AtomicU32::new(0),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl HealthProbe for ScriptedProbe {
        fn probe(&self) -> BoxFuture<'_, Result<(), String>> {
            Box::pin(async {
                self.calls.fetch_add(1, Ordering::SeqCst);
                match self.script.lock().unwrap().pop_front() {
                    Some(outcome) => outcome,
                    None => self.last.lock().unwrap().clone(),
                }
            })
        }
    }

    const PROBE_INTERVAL: Duration = Duration::from_secs(30);

    fn fail(msg: &str) -> Result<(), String> {
        Err(msg.to_string())
    }

    fn spawn_monitor(probe: Arc<ScriptedProbe>) -> (ConnectivityHandle, CancellationToken) {
        let shutdown = CancellationToken::new();
        let handle = ConnectivityMonitor::spawn(
            probe,
            RetryPolicy::default(),
            PROBE_INTERVAL,
            shutdown.clone(),
        );
        (handle, shutdown)
    }

    #[tokio::test(start_paused = true)]
    async fn test_healthy_service_stays_online_on_fixed_cadence() {
        let probe = ScriptedProbe::new(vec![Ok(())]);
        let (handle, _shutdown) = spawn_monitor(probe.clone());

        sleep(Duration::from_millis(10)).await;
        assert!(handle.is_online());
        assert_eq!(probe.calls(), 1, "first probe is immediate");

        // Two more 30s cadence probes, no retries in between.
        sleep(Duration::from_secs(61)).await;
        assert_eq!(probe.calls(), 3);
        assert!(handle.is_online());
        assert_eq!(handle.state().retry_attempt, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_ladder_three_failures_then_recovery() {
        // HTTP 500 three times, then 200. Expected walk:
        // Offline(attempt=1, retry in 1s), Offline(2, 2s), Offline(3, 5s),
        // then Online(attempt=0).
        let probe = ScriptedProbe::new(vec![
            fail("HTTP 500"),
            fail("HTTP 500"),
            fail("HTTP 500"),
            Ok(()),
        ]);
        let (handle, _shutdown) = spawn_monitor(probe.clone());
        let mut edges = handle.subscribe_edges();

        sleep(Duration::from_millis(10)).await;
        let state = handle.state();
        assert!(!state.is_online());
        assert_eq!(state.retry_attempt, 1);
        assert_eq!(state.next_retry_in, Some(Duration::from_secs(1)));
        assert_eq!(state.last_error.as_deref(), Some("HTTP 500"));

        // Retry at t=1s fails again.
        sleep(Duration::from_secs(1)).await;
        let state = handle.state();
        assert_eq!(state.retry_attempt, 2);
        assert_eq!(state.next_retry_in, Some(Duration::from_secs(2)));

        // Retry at t=3s fails again.
        sleep(Duration::from_secs(2)).await;
        let state = handle.state();
        assert_eq!(state.retry_attempt, 3);
        assert_eq!(state.next_retry_in, Some(Duration::from_secs(5)));

        // Retry at t=8s succeeds.
        sleep(Duration::from_secs(5)).await;
        let state = handle.state();
        assert!(state.is_online());
        assert_eq!(state.retry_attempt, 0, "recovery resets the counter");
        assert_eq!(state.next_retry_in, None);

        // Exactly one edge per flip despite three failed probes.
        assert_eq!(edges.try_recv().unwrap(), ConnectivityEdge::WentOffline);
        assert_eq!(edges.try_recv().unwrap(), ConnectivityEdge::WentOnline);
        assert!(edges.try_recv().is_err(), "no per-probe edge spam");
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_counter_clamps_during_long_outage() {
        let probe = ScriptedProbe::new(vec![fail("connect refused")]);
        let (handle, _shutdown) = spawn_monitor(probe.clone());

        // Walk well past the ladder: retries at 1,2,5,10,10,10... seconds.
        // (t=119 sits just after the retry armed at t=118.)
        sleep(Duration::from_secs(119)).await;
        let state = handle.state();
        assert!(!state.is_online());
        assert_eq!(
            state.retry_attempt, 3,
            "attempt clamps at min(k, ladder_len - 1)"
        );
        assert_eq!(state.next_retry_in, Some(Duration::from_secs(10)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_retry_resets_counter_and_probes_immediately() {
        let probe = ScriptedProbe::new(vec![fail("down"), fail("down"), fail("still down")]);
        let (handle, _shutdown) = spawn_monitor(probe.clone());

        sleep(Duration::from_millis(1100)).await; // initial failure + retry at 1s
        assert_eq!(handle.state().retry_attempt, 2);
        let calls_before = probe.calls();

        handle.retry_now();
        sleep(Duration::from_millis(10)).await;
        assert_eq!(probe.calls(), calls_before + 1, "manual retry probes now");
        // Counter was reset before the probe; the failed manual probe
        // schedules from the bottom of the ladder again.
        assert_eq!(handle.state().retry_attempt, 1);
        assert_eq!(handle.state().next_retry_in, Some(Duration::from_secs(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreachable_observation_flips_offline_without_probe() {
        let probe = ScriptedProbe::new(vec![Ok(())]);
        let (handle, _shutdown) = spawn_monitor(probe.clone());
        let mut edges = handle.subscribe_edges();
        sleep(Duration::from_millis(10)).await;
        assert!(handle.is_online());

        handle.observe_unreachable("connection reset");
        sleep(Duration::from_millis(10)).await;

        let state = handle.state();
        assert!(!state.is_online());
        assert_eq!(state.last_error.as_deref(), Some("connection reset"));
        assert_eq!(state.retry_attempt, 1, "observation arms the retry ladder");
        assert_eq!(edges.try_recv().unwrap(), ConnectivityEdge::WentOffline);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reachable_observation_recovers_before_probe_cycle() {
        let probe = ScriptedProbe::new(vec![fail("down")]);
        let (handle, _shutdown) = spawn_monitor(probe.clone());
        sleep(Duration::from_millis(10)).await;
        assert!(!handle.is_online());

        // A view's request got an HTTP response: opportunistic recovery,
        // no waiting for the 30s cadence.
        handle.observe_reachable();
        sleep(Duration::from_millis(10)).await;
        assert!(handle.is_online());
        assert_eq!(handle.state().retry_attempt, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_failures_keep_single_retry_timer() {
        let probe = ScriptedProbe::new(vec![fail("down")]);
        let (handle, _shutdown) = spawn_monitor(probe.clone());
        sleep(Duration::from_millis(10)).await;
        assert_eq!(handle.state().retry_attempt, 1);

        // Observations arriving while a retry is already armed must not
        // re-arm (push out) the pending timer or bump the counter.
        handle.observe_unreachable("also down");
        handle.observe_unreachable("yet another caller");
        sleep(Duration::from_millis(10)).await;
        assert_eq!(handle.state().retry_attempt, 1, "pending retry not re-armed");

        // The armed retry still fires at t=1s.
        let calls_before = probe.calls();
        sleep(Duration::from_secs(1)).await;
        assert_eq!(probe.calls(), calls_before + 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_probing() {
        let probe = ScriptedProbe::new(vec![Ok(())]);
        let (_handle, shutdown) = spawn_monitor(probe.clone());
        sleep(Duration::from_millis(10)).await;
        let calls = probe.calls();

        shutdown.cancel();
        sleep(Duration::from_secs(90)).await;
        assert_eq!(probe.calls(), calls, "no probes after teardown");
    }
}
