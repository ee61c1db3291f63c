//! Uniform classification of every service call.
//!
//! All service-originated failures are values a view can render - rate
//! limits get a "slow down" message, auth expiry redirects, network
//! failures feed the offline banner. Nothing here is thrown; a failed
//! refresh must never kill a polling loop.

use serde_json::Value;

/// The classified result of one authenticated request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome {
    /// 2xx with a parseable JSON body.
    Success(Value),
    /// 401 or 403: the credential was cleared and a session-ended event
    /// was signalled; the caller receives no payload.
    AuthExpired,
    /// 429: the caller decides whether to retry; the session layer never
    /// retries these itself.
    RateLimited,
    /// No HTTP response at all (DNS, connect, timeout).
    NetworkFailure { reason: String },
    /// Any other non-2xx; the body, when it parses, is kept for
    /// diagnostic display.
    ServerError { status: u16, body: Option<Value> },
    /// 2xx whose body failed to parse as JSON.
    MalformedResponse { message: String },
}

impl RequestOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Success(_))
    }

    /// The payload, if the call succeeded.
    pub fn into_payload(self) -> Option<Value> {
        match self {
            RequestOutcome::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Short operator-facing description of a non-success outcome.
    pub fn describe(&self) -> String {
        match self {
            RequestOutcome::Success(_) => "ok".to_string(),
            RequestOutcome::AuthExpired => "session expired - please log in again".to_string(),
            RequestOutcome::RateLimited => "rate limit hit - slow down".to_string(),
            RequestOutcome::NetworkFailure { reason } => format!("network error: {}", reason),
            RequestOutcome::ServerError { status, .. } => format!("service returned HTTP {}", status),
            RequestOutcome::MalformedResponse { message } => {
                format!("unexpected response shape: {}", message)
            }
        }
    }
}
