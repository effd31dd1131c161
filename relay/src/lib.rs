//! Relay - small HTTP API with signed webhooks and Telegram notifications.
//!
//! The service exposes health/status/data endpoints, an HMAC-verified
//! webhook receiver, and a rate-limited outbound message endpoint.
//!
//! ## Request flow
//!
//! ```text
//! Request → Rate Limiter → Handler → (webhook only) Signature Verifier
//!         → Notifier (fire-and-forget) → Response
//! ```

pub mod config;
pub mod error;
pub mod notify;
pub mod ratelimit;
pub mod web;

// Re-export commonly used types
pub use config::Config;
pub use error::ApiError;
pub use notify::Notifier;
pub use ratelimit::{PolicyId, RateLimiter, RatePolicy};
pub use web::AppState;
