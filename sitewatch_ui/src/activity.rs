use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use sitewatch_core::{
    activity::{ActivityRecord, Severity},
    error::DecodeError,
    feed::RawPayload,
};
use std::sync::Arc;
use tracing::warn;

use crate::state::AppState;

/// Filter parameters for the activity snapshot endpoint
#[derive(Debug, Deserialize)]
pub struct ActivityFilter {
    /// Only records with this severity
    pub severity: Option<Severity>,

    /// Maximum number of records to return, newest first
    pub limit: Option<usize>,
}

/// Accepts one activity message. The body is decoded the same way a push
/// channel payload would be; empty JSON values are rejected outright.
pub async fn post_message(
    State(state): State<Arc<AppState>>,
    body: String,
) -> (StatusCode, Json<Value>) {
    let payload = match serde_json::from_str::<Value>(&body) {
        Ok(payload) => payload,
        Err(_) if body.trim().is_empty() => return no_json_data(),
        Err(e) => return rejected(DecodeError::from(e)),
    };
    if is_empty_payload(&payload) {
        return no_json_data();
    }

    match state.ingest(RawPayload::Structured(payload)).await {
        Ok(activity) => (
            StatusCode::OK,
            Json(json!({ "status": "OK", "activity": activity })),
        ),
        Err(e) => rejected(e),
    }
}

/// Null, false, zero, and empty strings, arrays and objects carry no message.
fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
    }
}

fn no_json_data() -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": "No JSON data" })),
    )
}

fn rejected(error: DecodeError) -> (StatusCode, Json<Value>) {
    warn!(error = %error, "rejected activity message");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "error": error.to_string() })),
    )
}

/// Snapshot of the server's recent activity
pub async fn list_activity(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ActivityFilter>,
) -> Json<Vec<ActivityRecord>> {
    let log = state.activity_log.read().await;
    let limit = filter.limit.unwrap_or(log.capacity());

    let records = log
        .iter()
        .filter(|record| {
            filter
                .severity
                .map(|severity| record.severity == severity)
                .unwrap_or(true)
        })
        .take(limit)
        .cloned()
        .collect();

    Json(records)
}
