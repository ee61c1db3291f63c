use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::ArgMatches;
use serde_json::Value;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use vigil_client::{api, HttpHealthProbe, RequestOutcome, SessionEvent, SessionGuard};
use vigil_config::VigilConfig;
use vigil_sync::{
    ConnectivityMonitor, ConnectivityState, ListDiffTracker, PollingScheduler, RetryPolicy,
    SearchDebouncer,
};

use crate::render::{filter_rows, humanize_delay, summarize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WatchView {
    /// Stats summary plus the latest scans.
    Dashboard,
    Scans,
    Reports,
    Notifications,
    Users,
}

impl WatchView {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "dashboard" => Some(Self::Dashboard),
            "scans" => Some(Self::Scans),
            "reports" => Some(Self::Reports),
            "notifications" => Some(Self::Notifications),
            "users" => Some(Self::Users),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Scans => "scans",
            Self::Reports => "reports",
            Self::Notifications => "notifications",
            Self::Users => "users",
        }
    }

    async fn fetch(
        &self,
        guard: &SessionGuard,
        limit: usize,
    ) -> Result<RequestOutcome, vigil_client::ClientError> {
        match self {
            Self::Dashboard | Self::Scans => api::list_scans(guard, limit).await,
            Self::Reports => api::list_reports(guard, limit).await,
            Self::Notifications => api::list_notifications(guard, false).await,
            Self::Users => api::list_users(guard, limit).await,
        }
    }
}

#[derive(Default)]
struct ViewState {
    /// Latest stats payload; only the dashboard view fills this.
    stats: Option<Value>,
    rows: Vec<Value>,
    /// Id of the record that just became the list head, if any. Cleared
    /// on the next refresh that brings no new head.
    highlight: Option<String>,
    query: String,
    notice: Option<String>,
    last_refresh: Option<DateTime<Utc>>,
}

type SharedViewState = Arc<Mutex<ViewState>>;

fn locked(state: &SharedViewState) -> std::sync::MutexGuard<'_, ViewState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) fn handle_watch_command(
    matches: &ArgMatches,
    sub_matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let view_name = sub_matches
        .get_one::<String>("view")
        .ok_or("View argument is required")?;
    let view = WatchView::parse(view_name).ok_or("Unknown view")?;
    let limit = *sub_matches.get_one::<usize>("limit").unwrap_or(&20);

    let config = super::load_config_with_warning();
    let base_url = super::resolve_base_url(matches, &config);
    let credentials = super::resolve_credentials(matches);
    let interval = sub_matches
        .get_one::<u64>("interval-ms")
        .map(|ms| Duration::from_millis(*ms))
        .unwrap_or_else(|| match view {
            WatchView::Dashboard => config.poll.dashboard_interval(),
            WatchView::Notifications => config.poll.badge_interval(),
            WatchView::Scans | WatchView::Reports | WatchView::Users => {
                config.poll.list_interval()
            }
        });

    info!(
        event = "cli.watch_started",
        view = view.name(),
        limit = limit,
        interval_ms = interval.as_millis() as u64,
        base_url = %base_url,
    );

    let runtime = super::build_runtime()?;
    let result = runtime.block_on(run_watch(view, limit, interval, &base_url, &config, credentials));

    match &result {
        Ok(()) => info!(event = "cli.watch_completed", view = view.name()),
        Err(e) => error!(event = "cli.watch_failed", view = view.name(), error = %e),
    }
    result
}

async fn run_watch(
    view: WatchView,
    limit: usize,
    interval: Duration,
    base_url: &str,
    config: &VigilConfig,
    credentials: Arc<vigil_client::MemoryCredentialStore>,
) -> Result<(), Box<dyn std::error::Error>> {
    let shutdown = CancellationToken::new();

    let probe = HttpHealthProbe::new(base_url, config.poll.probe_timeout()).map_err(|e| {
        eprintln!("❌ Invalid service URL '{}': {}", base_url, e);
        Box::new(e) as Box<dyn std::error::Error>
    })?;
    let connectivity = ConnectivityMonitor::spawn(
        Arc::new(probe),
        RetryPolicy::from_millis(&config.retry.delays_ms),
        config.poll.probe_interval(),
        shutdown.clone(),
    );

    let guard = SessionGuard::with_timeout(base_url, credentials, config.poll.request_timeout())
        .map_err(|e| {
            eprintln!("❌ Invalid service URL '{}': {}", base_url, e);
            Box::new(e) as Box<dyn std::error::Error>
        })?
        .with_connectivity(connectivity.clone());
    let mut session_events = guard.subscribe_session_events();

    let state: SharedViewState = Arc::new(Mutex::new(ViewState::default()));
    let (redraw_tx, mut redraw_rx) = mpsc::unbounded_channel::<()>();

    // Poll task: fetch, diff the head, stash rows for the renderer.
    let poller = {
        let guard = guard.clone();
        let connectivity = connectivity.clone();
        let state = state.clone();
        let redraw_tx = redraw_tx.clone();
        let tracker = Arc::new(Mutex::new(ListDiffTracker::<String>::new()));
        PollingScheduler::start(interval, move || {
            let guard = guard.clone();
            let connectivity = connectivity.clone();
            let state = state.clone();
            let redraw_tx = redraw_tx.clone();
            let tracker = tracker.clone();
            async move {
                if !connectivity.is_online() {
                    // The monitor's retry ladder owns recovery; a poll here
                    // would just pile more failures onto the banner.
                    let _ = redraw_tx.send(());
                    return;
                }
                if view == WatchView::Dashboard {
                    match api::dashboard_stats(&guard).await {
                        Ok(outcome) => {
                            if let Some(payload) = outcome.into_payload() {
                                locked(&state).stats = Some(payload);
                            }
                        }
                        Err(e) => {
                            warn!(event = "cli.watch.stats_failed", error = %e);
                        }
                    }
                }
                let outcome = match view.fetch(&guard, limit).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        warn!(event = "cli.watch.fetch_failed", view = view.name(), error = %e);
                        return;
                    }
                };
                apply_outcome(view, outcome, &state, &tracker);
                let _ = redraw_tx.send(());
            }
        })
    };

    // Typing pauses polling for the quiet period; the settled query is
    // applied to the cached rows (the next poll refetches anyway).
    let debouncer = {
        let state = state.clone();
        let redraw_tx = redraw_tx.clone();
        SearchDebouncer::spawn(config.search.quiet_period(), poller.pauser(), move |query| {
            locked(&state).query = query;
            let _ = redraw_tx.send(());
        })
    };

    let mut conn_rx = connectivity.watch_state();
    let mut input_lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    render(view, &locked(&state), &connectivity.state());

    let exit = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                break Ok(());
            }
            event = session_events.recv() => {
                if let Ok(SessionEvent::Expired) = event {
                    eprintln!("❌ Session expired. Sign in again and restart with a fresh token.");
                    break Err("Session expired".into());
                }
            }
            changed = conn_rx.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let snapshot = conn_rx.borrow().clone();
                render(view, &locked(&state), &snapshot);
            }
            _ = redraw_rx.recv() => {
                render(view, &locked(&state), &connectivity.state());
            }
            line = input_lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line == "q" || line == "quit" {
                            break Ok(());
                        }
                        if line.is_empty() && !connectivity.is_online() {
                            connectivity.retry_now();
                            continue;
                        }
                        debouncer.on_input(line);
                    }
                    Ok(None) | Err(_) => break Ok(()),
                }
            }
        }
    };

    poller.stop();
    shutdown.cancel();
    exit
}

fn apply_outcome(
    view: WatchView,
    outcome: RequestOutcome,
    state: &SharedViewState,
    tracker: &Arc<Mutex<ListDiffTracker<String>>>,
) {
    match outcome {
        RequestOutcome::Success(payload) => {
            let rows = api::records(&payload);
            let highlight = head_highlight(
                &mut tracker.lock().unwrap_or_else(PoisonError::into_inner),
                &rows,
            );
            if let Some(id) = &highlight {
                info!(event = "cli.watch.new_head", view = view.name(), id = %id);
            }
            let mut state = locked(state);
            state.rows = rows;
            state.highlight = highlight;
            state.notice = None;
            state.last_refresh = Some(Utc::now());
        }
        RequestOutcome::AuthExpired => {
            // The session event breaks the main loop; nothing to render.
        }
        RequestOutcome::RateLimited => {
            locked(state).notice =
                Some("The service is rate limiting requests; refresh continues on cadence".into());
        }
        RequestOutcome::NetworkFailure { .. } => {
            // The connectivity banner already covers this; keep stale rows.
        }
        RequestOutcome::ServerError { status, .. } => {
            locked(state).notice = Some(format!("Service error (HTTP {}); showing last data", status));
        }
        RequestOutcome::MalformedResponse { message } => {
            warn!(event = "cli.watch.malformed_response", view = view.name(), error = %message);
            locked(state).notice = Some("Unexpected response from service; showing last data".into());
        }
    }
}

/// Feed the newest snapshot to the head tracker.
///
/// A head without an id has no identity to compare, so it neither
/// signals nor disturbs the tracked head; without this gate every
/// id-less head would collapse onto one identity and two different
/// id-less heads could never signal each other.
fn head_highlight(tracker: &mut ListDiffTracker<String>, rows: &[Value]) -> Option<String> {
    if let Some(head) = rows.first()
        && api::record_id(head).is_none()
    {
        return None;
    }
    tracker.update(rows, |row| api::record_id(row).unwrap_or_default())
}

fn render(view: WatchView, state: &ViewState, conn: &ConnectivityState) {
    print!("\x1B[2J\x1B[1;1H");
    let _ = std::io::stdout().flush();

    println!(
        "🛰  vigil watch {}   {}",
        view.name(),
        Utc::now().format("%H:%M:%S")
    );

    if !conn.is_online() {
        let reason = conn.last_error.as_deref().unwrap_or("service unreachable");
        match conn.next_retry_in {
            Some(delay) => println!(
                "⚠️  Offline: {} — retrying in ~{} (attempt {})",
                reason,
                humanize_delay(delay),
                conn.retry_attempt
            ),
            None => println!("⚠️  Offline: {} — retrying…", reason),
        }
    }
    if let Some(notice) = &state.notice {
        println!("⚠️  {}", notice);
    }
    if !state.query.is_empty() {
        println!("🔎 filter: {}", state.query);
    }
    if let Some(stats) = &state.stats {
        println!();
        for line in crate::render::stats_lines(stats) {
            println!("   {}", line);
        }
    }
    println!();

    let rows = filter_rows(&state.rows, &state.query);
    if rows.is_empty() {
        println!("   (no records)");
    }
    for row in rows {
        let is_new = match (&state.highlight, api::record_id(row)) {
            (Some(highlight), Some(id)) => *highlight == id,
            _ => false,
        };
        let marker = if is_new { "● NEW " } else { "      " };
        println!("{}{}", marker, summarize(row));
    }

    println!();
    if let Some(ts) = &state.last_refresh {
        println!("Last refresh: {}", ts.format("%H:%M:%S"));
    }
    println!("Type to filter · empty line clears (or retries while offline) · 'q' quits");
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_watch_view_parse_covers_all_views() {
        assert_eq!(WatchView::parse("dashboard"), Some(WatchView::Dashboard));
        assert_eq!(WatchView::parse("users"), Some(WatchView::Users));
        assert_eq!(WatchView::parse("widgets"), None);
    }

    #[test]
    fn test_head_highlight_signals_on_new_head() {
        let mut tracker = ListDiffTracker::new();
        assert_eq!(head_highlight(&mut tracker, &[json!({"id": 1})]), None);
        assert_eq!(
            head_highlight(&mut tracker, &[json!({"id": 2}), json!({"id": 1})]),
            Some("2".to_string())
        );
    }

    #[test]
    fn test_idless_heads_never_signal() {
        let mut tracker = ListDiffTracker::new();
        assert_eq!(head_highlight(&mut tracker, &[json!({"title": "a"})]), None);
        // A different id-less head has no identity to compare either.
        assert_eq!(head_highlight(&mut tracker, &[json!({"title": "b"})]), None);
    }

    #[test]
    fn test_idless_head_does_not_disturb_tracking() {
        let mut tracker = ListDiffTracker::new();
        head_highlight(&mut tracker, &[json!({"id": 1})]);
        assert_eq!(head_highlight(&mut tracker, &[json!({"note": "interim"})]), None);
        // The id-bearing head from before is still the baseline.
        assert_eq!(
            head_highlight(&mut tracker, &[json!({"id": 3})]),
            Some("3".to_string())
        );
    }
}
