//! API endpoint handlers.
//!
//! Each rate-limited handler checks its route policy before doing any work.
//! The webhook handler verifies the HMAC signature over the raw body bytes
//! and only parses JSON after verification succeeds; its notification is
//! dispatched on a spawned task so the response never waits on Telegram.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::ApiError;
use crate::notify::Notifier;
use crate::ratelimit::{PolicyId, RateLimiter};
use crate::web::signature::verify_signature;
use crate::Config;

const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub limiter: Arc<RateLimiter>,
    pub notifier: Notifier,
}

impl AppState {
    pub fn new(config: Config, limiter: RateLimiter) -> Self {
        let notifier = Notifier::from_config(&config);
        Self {
            config: Arc::new(config),
            limiter: Arc::new(limiter),
            notifier,
        }
    }
}

/// Rate-limit partition key for a request: the peer address, or the first
/// X-Forwarded-For hop when proxy headers are trusted.
///
/// The header is client-supplied; honoring it without a proxy in front
/// would let any caller pick its own quota partition.
fn client_key(trust_proxy: bool, headers: &HeaderMap, addr: Option<SocketAddr>) -> String {
    if trust_proxy {
        if let Some(forwarded) = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
        {
            if let Some(first) = forwarded.split(',').next() {
                let first = first.trim();
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }

    addr.map(|a| a.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Enforce the route policy for this request.
fn check_quota(
    state: &AppState,
    headers: &HeaderMap,
    addr: Option<SocketAddr>,
    id: PolicyId,
) -> Result<(), ApiError> {
    let key = client_key(state.config.trust_proxy, headers, addr);
    state
        .limiter
        .check(&key, id)
        .map_err(|policy| ApiError::RateLimited(policy.to_string()))
}

// =============================================================================
// Health Check
// =============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: String,
    pub version: &'static str,
}

/// Health check endpoint. Never rate limited.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: Utc::now().to_rfc3339(),
        version: env!("CARGO_PKG_VERSION"),
    })
}

// =============================================================================
// API Status
// =============================================================================

#[derive(Serialize)]
pub struct StatusResponse {
    pub api_version: &'static str,
    pub status: &'static str,
    pub features: Vec<&'static str>,
    pub timestamp: String,
}

/// API status endpoint.
pub async fn api_status(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<Json<StatusResponse>, ApiError> {
    check_quota(&state, &headers, addr.map(|ConnectInfo(a)| a), PolicyId::Status)?;

    Ok(Json(StatusResponse {
        api_version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        features: vec!["webhooks", "telegram_bot", "rate_limiting"],
        timestamp: Utc::now().to_rfc3339(),
    }))
}

// =============================================================================
// Data Endpoint
// =============================================================================

/// GET handler for the data endpoint.
pub async fn data_get(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    check_quota(&state, &headers, addr.map(|ConnectInfo(a)| a), PolicyId::Data)?;

    Ok(Json(json!({
        "message": "Data endpoint",
        "method": "GET",
        "timestamp": Utc::now().to_rfc3339(),
    })))
}

/// POST handler for the data endpoint: echoes the received JSON body.
///
/// Takes the raw body so the quota check runs before any parsing.
pub async fn data_post(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    check_quota(&state, &headers, addr.map(|ConnectInfo(a)| a), PolicyId::Data)?;

    let data: Value =
        serde_json::from_slice(&body).map_err(|_| ApiError::Validation("Invalid JSON body"))?;

    info!(data = %data, "data_received");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Data processed successfully",
            "received_data": data,
            "processed_at": Utc::now().to_rfc3339(),
        })),
    ))
}

// =============================================================================
// Webhook
// =============================================================================

#[derive(Serialize)]
pub struct WebhookResponse {
    pub status: &'static str,
}

/// Secure webhook endpoint.
///
/// The signature covers the raw body bytes; JSON parsing happens only after
/// verification. Notification failures never affect the response.
pub async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    let signature = match headers.get(SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) {
        Some(s) => s,
        None => {
            warn!("webhook_missing_signature");
            return Err(ApiError::MissingSignature);
        }
    };

    if !verify_signature(state.config.webhook_secret.as_bytes(), &body, signature) {
        warn!("webhook_invalid_signature");
        return Err(ApiError::InvalidSignature);
    }

    // A verified but non-JSON body is still accepted
    let event = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|v| v.get("event").and_then(|e| e.as_str()).map(String::from))
        .unwrap_or_else(|| "unknown".to_string());

    info!(event = %event, body_length = body.len(), "webhook_verified");

    if state.notifier.is_configured() {
        let notifier = state.notifier.clone();
        let message = format!("Webhook received: {}", event);
        tokio::spawn(async move {
            notifier.send(&message, None).await;
        });
    }

    Ok(Json(WebhookResponse {
        status: "webhook processed",
    }))
}

// =============================================================================
// Telegram Send
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub chat_id: Option<String>,
}

#[derive(Serialize)]
pub struct SendResponse {
    pub status: &'static str,
}

/// Send a message via the Telegram bot.
///
/// Takes the raw body so the quota check runs before any parsing.
pub async fn telegram_send(
    State(state): State<AppState>,
    addr: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<SendResponse>, ApiError> {
    check_quota(&state, &headers, addr.map(|ConnectInfo(a)| a), PolicyId::TelegramSend)?;

    let request: SendRequest =
        serde_json::from_slice(&body).map_err(|_| ApiError::Validation("Invalid JSON body"))?;

    if !state.notifier.is_configured() {
        return Err(ApiError::NotConfigured("Telegram bot not configured"));
    }

    if request.message.is_empty() {
        return Err(ApiError::Validation("Message is required"));
    }

    // Single synchronous attempt; the result maps directly to the response
    if state
        .notifier
        .send(&request.message, request.chat_id.as_deref())
        .await
    {
        Ok(Json(SendResponse {
            status: "message sent",
        }))
    } else {
        Err(ApiError::SendFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn xff(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", value.parse().unwrap());
        headers
    }

    fn peer() -> Option<SocketAddr> {
        Some("192.0.2.1:4242".parse().unwrap())
    }

    #[test]
    fn test_client_key_ignores_forwarded_header_by_default() {
        // A spoofed header must not move the caller into a fresh partition
        let key = client_key(false, &xff("1.2.3.4"), peer());
        assert_eq!(key, "192.0.2.1");
    }

    #[test]
    fn test_client_key_trusted_proxy_uses_first_hop() {
        let key = client_key(true, &xff("1.2.3.4, 10.0.0.1"), peer());
        assert_eq!(key, "1.2.3.4");
    }

    #[test]
    fn test_client_key_trusted_proxy_falls_back_to_peer() {
        let key = client_key(true, &HeaderMap::new(), peer());
        assert_eq!(key, "192.0.2.1");
    }

    #[test]
    fn test_client_key_without_peer_address() {
        let key = client_key(false, &HeaderMap::new(), None);
        assert_eq!(key, "unknown");
    }
}
