use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use super::state::AppState;
use crate::{
    error::WebhookError,
    event::{DELIVERY_HEADER, EVENT_HEADER},
    metrics::{self, EVENTS_REJECTED},
    signature::SIGNATURE_HEADER,
};

pub async fn root() -> &'static str {
    "Welcome to the GitHub webhook server!"
}

/// Report which required config values are missing
pub async fn check_config(State(state): State<AppState>) -> impl IntoResponse {
    let missing = state.config.missing_required();
    if missing.is_empty() {
        (
            StatusCode::OK,
            Json(json!({
                "status": "success",
                "message": "All required configuration values are present.",
            })),
        )
    } else {
        warn!(missing = ?missing, "Required configuration values are missing");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "status": "error",
                "message": "The following configuration values are missing or invalid:",
                "missingConfigs": missing,
            })),
        )
    }
}

/// Serve the rolling web log file as stored on disk
pub async fn logs_json(State(state): State<AppState>) -> impl IntoResponse {
    match state.dispatcher.audit().web_log().read_raw().await {
        Ok(raw) => (StatusCode::OK, [(header::CONTENT_TYPE, "application/json")], raw),
        Err(e) => {
            error!(error = %e, "Failed to read web log");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "application/json")],
                br#"{"status":"error","message":"failed to read logs"}"#.to_vec(),
            )
        }
    }
}

pub async fn metrics() -> impl IntoResponse {
    match metrics::render() {
        Ok(body) => (StatusCode::OK, body),
        Err(e) => {
            error!(error = %e, "Failed to render metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, String::new())
        }
    }
}

/// Verify, classify and dispatch one GitHub delivery.
///
/// The body is taken as raw bytes so the signature is checked over exactly
/// what was received; JSON parsing only happens once it verified.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, WebhookError> {
    let delivery = header_str(&headers, DELIVERY_HEADER).unwrap_or("-");

    if let Err(e) = state.verifier.verify(&body, signature_header(&headers)) {
        warn!(delivery, reason = e.reason(), "Rejected webhook delivery");
        EVENTS_REJECTED.with_label_values(&[e.reason()]).inc();
        return Err(e.into());
    }

    let Some(event) = header_str(&headers, EVENT_HEADER) else {
        EVENTS_REJECTED.with_label_values(&["missing_event"]).inc();
        return Err(WebhookError::MissingEventType);
    };

    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        EVENTS_REJECTED.with_label_values(&["malformed_body"]).inc();
        WebhookError::MalformedBody(e.to_string())
    })?;

    info!(delivery, event, "Webhook received");
    state.dispatcher.handle(event, &payload).await?;

    Ok(Json(json!({ "status": "success", "event": event })))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// A present but non-ASCII signature can never match, so it is passed on as
/// an empty value rather than reported missing
fn signature_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(SIGNATURE_HEADER).map(|v| v.to_str().unwrap_or_default())
}
