//! API error taxonomy.
//!
//! Every failure is converted to a structured JSON response at the handler
//! boundary; no raw error text ever reaches a client.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Webhook request arrived without an X-Hub-Signature-256 header.
    #[error("Missing signature")]
    MissingSignature,

    /// Webhook signature did not match the computed HMAC.
    #[error("Invalid signature")]
    InvalidSignature,

    /// A per-route rate limit was exceeded. Carries the human-readable
    /// description of the violated limit.
    #[error("Rate limit exceeded")]
    RateLimited(String),

    /// A required request field was missing or empty.
    #[error("{0}")]
    Validation(&'static str),

    /// The request targets a feature that is not configured.
    #[error("{0}")]
    NotConfigured(&'static str),

    /// The single outbound notification attempt failed.
    #[error("Failed to send message")]
    SendFailed,

    /// Uncaught server fault.
    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::MissingSignature | ApiError::InvalidSignature => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": self.to_string() }),
            ),
            ApiError::RateLimited(message) => (
                StatusCode::TOO_MANY_REQUESTS,
                json!({
                    "error": "Rate limit exceeded",
                    "message": message,
                }),
            ),
            ApiError::Validation(_) | ApiError::NotConfigured(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": self.to_string() }),
            ),
            ApiError::SendFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": self.to_string() }),
            ),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": "Internal server error",
                    "timestamp": Utc::now().to_rfc3339(),
                }),
            ),
        };

        (status, Json(body)).into_response()
    }
}
