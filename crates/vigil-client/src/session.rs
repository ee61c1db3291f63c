//! Authenticated session layer.
//!
//! Every outbound request flows through [`SessionGuard::call`]: the
//! current credential is attached when present, the response is
//! classified into a [`RequestOutcome`], and side effects fire uniformly -
//! auth loss clears the token and signals the host, transport failures
//! notify the connectivity monitor, and any received response counts as
//! proof the service is reachable.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use tokio::sync::broadcast;

use vigil_sync::ConnectivityHandle;

use crate::credentials::CredentialStore;
use crate::errors::ClientError;
use crate::outcome::RequestOutcome;

/// Session lifecycle events the surrounding application must react to.
///
/// On `Expired` the host is expected to navigate to its re-authentication
/// entry point; the guard has already cleared the stored token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Expired,
}

/// Wraps an HTTP client with credential injection and uniform outcome
/// classification.
#[derive(Clone)]
pub struct SessionGuard {
    http: reqwest::Client,
    base_url: Url,
    credentials: Arc<dyn CredentialStore>,
    connectivity: Option<ConnectivityHandle>,
    session_tx: broadcast::Sender<SessionEvent>,
}

impl std::fmt::Debug for SessionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionGuard")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

/// Per-request deadline applied when the host supplies none.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

impl SessionGuard {
    pub fn new(
        base_url: &str,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, ClientError> {
        Self::with_timeout(base_url, credentials, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Build a guard with an explicit per-request deadline.
    ///
    /// Every call carries a bounded timeout; a hung connection surfaces
    /// as a `NetworkFailure` instead of stalling the refresh loop.
    pub fn with_timeout(
        base_url: &str,
        credentials: Arc<dyn CredentialStore>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let base_url = Url::parse(base_url).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_string(),
            message: e.to_string(),
        })?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::HttpInit {
                message: e.to_string(),
            })?;
        let (session_tx, _) = broadcast::channel(4);
        Ok(Self {
            http,
            base_url,
            credentials,
            connectivity: None,
            session_tx,
        })
    }

    /// Attach the connectivity monitor so calls can feed it observations.
    pub fn with_connectivity(mut self, handle: ConnectivityHandle) -> Self {
        self.connectivity = Some(handle);
        self
    }

    /// Subscribe to session lifecycle events (auth expiry).
    pub fn subscribe_session_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.session_tx.subscribe()
    }

    pub async fn get(&self, path: &str) -> Result<RequestOutcome, ClientError> {
        self.call(Method::GET, path, None).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: &Value,
    ) -> Result<RequestOutcome, ClientError> {
        self.call(Method::POST, path, Some(body)).await
    }

    /// Dispatch one authenticated request and classify the response.
    ///
    /// `Err` only for malformed request construction; everything the
    /// service does comes back as an `Ok(RequestOutcome)`.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<RequestOutcome, ClientError> {
        let url = self
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ClientError::InvalidPath {
                path: path.to_string(),
                message: e.to_string(),
            })?;

        let mut request = self.http.request(method.clone(), url);
        if let Some(token) = self.credentials.get() {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                let reason = describe_transport_error(&e);
                tracing::warn!(
                    event = "client.session.network_failure",
                    method = %method,
                    path,
                    error = %reason,
                );
                if let Some(connectivity) = &self.connectivity {
                    connectivity.observe_unreachable(&reason);
                }
                return Ok(RequestOutcome::NetworkFailure { reason });
            }
        };

        // Any HTTP response, whatever the status, proves the transport
        // works: opportunistic Online without waiting for the probe cycle.
        if let Some(connectivity) = &self.connectivity {
            connectivity.observe_reachable();
        }

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            self.credentials.clear();
            tracing::warn!(
                event = "client.session.expired",
                status = status.as_u16(),
                path,
            );
            let _ = self.session_tx.send(SessionEvent::Expired);
            return Ok(RequestOutcome::AuthExpired);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            // No auto-retry: re-sending into a limiter only amplifies it.
            tracing::warn!(event = "client.session.rate_limited", path);
            return Ok(RequestOutcome::RateLimited);
        }
        if status.is_success() {
            return match response.json::<Value>().await {
                Ok(payload) => Ok(RequestOutcome::Success(payload)),
                Err(e) => {
                    tracing::warn!(
                        event = "client.session.malformed_response",
                        path,
                        error = %e,
                    );
                    Ok(RequestOutcome::MalformedResponse {
                        message: e.to_string(),
                    })
                }
            };
        }

        tracing::warn!(
            event = "client.session.server_error",
            status = status.as_u16(),
            path,
        );
        let body = response.json::<Value>().await.ok();
        Ok(RequestOutcome::ServerError {
            status: status.as_u16(),
            body,
        })
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", source_message(e))
    } else {
        source_message(e)
    }
}

/// Innermost cause message - `reqwest::Error`'s own Display repeats the
/// full URL, which is noise in a banner.
fn source_message(e: &reqwest::Error) -> String {
    let mut cause: &dyn std::error::Error = e;
    while let Some(source) = cause.source() {
        cause = source;
    }
    cause.to_string()
}
