//! Thin typed helpers over the console API.
//!
//! Payloads stay opaque `serde_json::Value`s: near-duplicate deployments
//! disagree on field names (`verdict` vs `threat_level`), so the core
//! only relies on a stable `id` and list order, and leaves the rest to
//! the rendering layer.

use serde_json::Value;

use crate::errors::ClientError;
use crate::outcome::RequestOutcome;
use crate::session::SessionGuard;

pub async fn dashboard_stats(guard: &SessionGuard) -> Result<RequestOutcome, ClientError> {
    guard.get("/dashboard/stats").await
}

pub async fn list_scans(guard: &SessionGuard, limit: usize) -> Result<RequestOutcome, ClientError> {
    guard.get(&format!("/scans?limit={}", limit)).await
}

pub async fn list_reports(
    guard: &SessionGuard,
    limit: usize,
) -> Result<RequestOutcome, ClientError> {
    guard.get(&format!("/reports?limit={}", limit)).await
}

pub async fn list_users(guard: &SessionGuard, limit: usize) -> Result<RequestOutcome, ClientError> {
    guard.get(&format!("/users?limit={}", limit)).await
}

pub async fn list_notifications(
    guard: &SessionGuard,
    unread_only: bool,
) -> Result<RequestOutcome, ClientError> {
    let path = if unread_only {
        "/notifications?unread_only=true"
    } else {
        "/notifications"
    };
    guard.get(path).await
}

/// Extract the record list from a list payload.
///
/// Deployed backends answer either with a bare array or with the array
/// wrapped under `items` or `data`; everything else yields an empty list.
pub fn records(payload: &Value) -> Vec<Value> {
    if let Some(list) = payload.as_array() {
        return list.clone();
    }
    for key in ["items", "data"] {
        if let Some(list) = payload.get(key).and_then(Value::as_array) {
            return list.clone();
        }
    }
    Vec::new()
}

/// The stable identity of one record, used for head-change detection.
///
/// Accepts numeric or string ids; anything else means the record cannot
/// participate in highlight tracking.
pub fn record_id(record: &Value) -> Option<String> {
    match record.get("id") {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) => Some(s.clone()),
        _ => None,
    }
}
