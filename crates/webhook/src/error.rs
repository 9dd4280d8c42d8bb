use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::{audit::AuditError, renamer::RenameApiError, signature::SignatureError};

/// Every way a webhook delivery can fail, mapped to one HTTP response
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error("missing x-github-event header")]
    MissingEventType,

    #[error("malformed JSON body: {0}")]
    MalformedBody(String),

    #[error("invalid payload: {0} missing")]
    MissingField(String),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("unhandled event type: {0}")]
    UnhandledEvent(String),

    #[error("unhandled {event} action: {action}")]
    UnhandledAction { event: String, action: String },

    #[error("CI dispatch failed: {0}")]
    CiDispatch(String),

    #[error("audit log write failed: {0}")]
    Audit(#[from] AuditError),

    #[error("repository rename failed: {0}")]
    Rename(#[from] RenameApiError),
}

impl WebhookError {
    /// - Signature problems: 403 Forbidden
    /// - Missing header, bad JSON, missing fields, unhandled events: 400 Bad Request
    /// - Failures while acting on a valid event: 500 Internal Server Error
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Signature(_) => StatusCode::FORBIDDEN,
            Self::MissingEventType |
            Self::MalformedBody(_) |
            Self::MissingField(_) |
            Self::InvalidPayload(_) |
            Self::UnhandledEvent(_) |
            Self::UnhandledAction { .. } => StatusCode::BAD_REQUEST,
            Self::CiDispatch(_) | Self::Audit(_) | Self::Rename(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether the payload itself was at fault, as opposed to the server
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingEventType |
                Self::MalformedBody(_) |
                Self::MissingField(_) |
                Self::InvalidPayload(_)
        )
    }

    /// Known event or action that this service does not act on
    pub const fn is_unhandled(&self) -> bool {
        matches!(self, Self::UnhandledEvent(_) | Self::UnhandledAction { .. })
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        // Only the display text goes out, source chains stay in the logs
        let body = json!({ "status": "error", "message": self.to_string() });
        (self.status_code(), Json(body)).into_response()
    }
}
