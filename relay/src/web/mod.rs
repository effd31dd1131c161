//! Web server module.
//!
//! Routes are registered here along with their rate-limit policies, one
//! explicit policy per limited route. The health and webhook endpoints are
//! not rate limited; the webhook is protected by its signature instead.

pub mod handlers;
pub mod signature;

use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::ratelimit::{PolicyId, RateLimiter, RatePolicy};

pub use handlers::{
    api_status, data_get, data_post, health, telegram_send, webhook, AppState,
    HealthResponse, SendRequest, SendResponse, StatusResponse, WebhookResponse,
};
pub use signature::{compute_signature, verify_signature};

/// The rate-limit policy table for this service.
///
/// Default: 100 requests per hour. Specific routes register stricter
/// limits; exactly one policy governs each route.
pub fn route_policies() -> RateLimiter {
    RateLimiter::new(RatePolicy::new(100, Duration::from_secs(3600)))
        .register(PolicyId::Status, RatePolicy::new(50, Duration::from_secs(60)))
        .register(PolicyId::Data, RatePolicy::new(30, Duration::from_secs(60)))
        .register(
            PolicyId::TelegramSend,
            RatePolicy::new(10, Duration::from_secs(60)),
        )
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/status", get(api_status))
        .route("/api/v1/data", get(data_get).post(data_post))
        .route("/webhook", post(webhook))
        .route("/telegram/send", post(telegram_send))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
