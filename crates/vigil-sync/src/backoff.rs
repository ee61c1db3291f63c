//! Retry backoff policy.
//!
//! Pure delay table, kept separate from the timer mechanism that arms
//! retries so the policy itself needs no runtime to test.

use std::time::Duration;

/// Ordered retry delays. Once the table is exhausted the last entry repeats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl Default for RetryPolicy {
    /// The default ladder: 1s, 2s, 5s, 10s.
    fn default() -> Self {
        Self {
            delays: vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(5),
                Duration::from_secs(10),
            ],
        }
    }
}

impl RetryPolicy {
    /// Build a policy from an explicit delay table.
    ///
    /// An empty table falls back to the default ladder - a policy with no
    /// delays cannot schedule anything.
    pub fn new(delays: Vec<Duration>) -> Self {
        if delays.is_empty() {
            tracing::warn!(event = "sync.backoff.empty_policy_defaulted");
            return Self::default();
        }
        Self { delays }
    }

    /// Build a policy from millisecond values (the config-file shape).
    pub fn from_millis(delays_ms: &[u64]) -> Self {
        Self::new(delays_ms.iter().map(|ms| Duration::from_millis(*ms)).collect())
    }

    /// Delay to wait before the retry that follows `attempt` prior failures.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let idx = (attempt as usize).min(self.delays.len() - 1);
        self.delays[idx]
    }

    /// Highest meaningful value of a failure counter under this policy.
    ///
    /// Counters clamp here instead of growing without bound - beyond the
    /// cap every further failure maps to the same (last) delay anyway.
    pub fn attempt_cap(&self) -> u32 {
        (self.delays.len() - 1) as u32
    }

    /// Advance a failure counter by one, clamped to [`Self::attempt_cap`].
    pub fn next_attempt(&self, attempt: u32) -> u32 {
        attempt.saturating_add(1).min(self.attempt_cap())
    }
}
