//! vigil-sync: the timer and state-machine core behind vigil's live views.
//!
//! Every view in the console composes the same small set of pieces:
//!
//! - [`connectivity`] - process-wide reachability monitor with backoff retry
//! - [`backoff`] - the pure retry delay table the monitor schedules from
//! - [`poll`] - per-view fixed-interval refresh loop with pause gating
//! - [`debounce`] - search input coalescing that pauses the refresh loop
//! - [`diff`] - head-identity change detection for one-shot row highlights
//!
//! This crate owns no I/O. Health probes enter through the
//! [`connectivity::HealthProbe`] trait and refresh work enters through
//! closures handed to [`poll::PollingScheduler::start`], so everything here
//! is testable with fakes and a paused clock.

pub mod backoff;
pub mod connectivity;
pub mod debounce;
pub mod diff;
pub mod poll;

pub use backoff::RetryPolicy;
pub use connectivity::{
    ConnectivityEdge, ConnectivityHandle, ConnectivityMonitor, ConnectivityState, HealthProbe,
    Reachability,
};
pub use debounce::SearchDebouncer;
pub use diff::ListDiffTracker;
pub use poll::{PollHandle, PollPauser, PollPhase, PollingScheduler};
