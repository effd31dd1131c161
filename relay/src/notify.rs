//! Outbound Telegram notifications.
//!
//! Best-effort, fire-and-forget: a failed or timed-out send is logged and
//! reported as `false`, never propagated as an error. When no bot token or
//! chat id is configured the notifier is a no-op, which is a valid runtime
//! mode rather than a failure.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tracing::{debug, error, info};

use crate::Config;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram notification sender.
///
/// Holds a single pooled `reqwest::Client`; clone freely, clones share the
/// underlying connection pool.
#[derive(Clone)]
pub struct Notifier {
    client: Client,
    bot_token: Option<String>,
    default_chat_id: Option<String>,
    timeout: Duration,
    api_base: String,
}

impl Notifier {
    pub fn from_config(config: &Config) -> Self {
        Self {
            client: Client::new(),
            bot_token: config.telegram_bot_token.clone(),
            default_chat_id: config.telegram_chat_id.clone(),
            timeout: Duration::from_millis(config.request_timeout_ms),
            api_base: TELEGRAM_API_BASE.to_string(),
        }
    }

    /// Point the notifier at a different API host. Used by tests.
    #[cfg(test)]
    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = base.trim_end_matches('/').to_string();
        self
    }

    /// Whether a bot token is configured at all.
    pub fn is_configured(&self) -> bool {
        self.bot_token.is_some()
    }

    /// Send `message` to `chat_id`, falling back to the configured default
    /// chat. Returns `true` only on HTTP 200 from the Telegram API.
    ///
    /// A single attempt; no retries, no queueing.
    pub async fn send(&self, message: &str, chat_id: Option<&str>) -> bool {
        let token = match &self.bot_token {
            Some(t) => t,
            None => {
                debug!("telegram_not_configured");
                return false;
            }
        };

        let chat_id = match chat_id.or(self.default_chat_id.as_deref()) {
            Some(c) => c,
            None => {
                debug!("telegram_no_chat_id");
                return false;
            }
        };

        let url = format!("{}/bot{}/sendMessage", self.api_base, token);
        let body = json!({
            "chat_id": chat_id,
            "text": message,
            "parse_mode": "HTML",
        });

        match self
            .client
            .post(&url)
            .json(&body)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(resp) => {
                let status = resp.status().as_u16();
                let sent = status == 200;
                if sent {
                    info!(chat_id = %chat_id, "telegram_message_sent");
                } else {
                    error!(chat_id = %chat_id, status_code = status, "telegram_send_rejected");
                }
                sent
            }
            Err(e) => {
                if e.is_timeout() {
                    error!(
                        chat_id = %chat_id,
                        timeout_seconds = self.timeout.as_secs_f64(),
                        error = %e,
                        "telegram_send_timeout"
                    );
                } else {
                    error!(chat_id = %chat_id, error = %e, "telegram_send_failed");
                }
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notifier(token: Option<&str>, chat: Option<&str>) -> Notifier {
        Notifier {
            client: Client::new(),
            bot_token: token.map(String::from),
            default_chat_id: chat.map(String::from),
            timeout: Duration::from_millis(500),
            api_base: TELEGRAM_API_BASE.to_string(),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_token_is_noop() {
        let n = notifier(None, Some("42"));
        assert!(!n.is_configured());
        assert!(!n.send("hello", None).await);
    }

    #[tokio::test]
    async fn test_no_chat_id_is_noop() {
        let n = notifier(Some("token"), None);
        assert!(n.is_configured());
        assert!(!n.send("hello", None).await);
    }

    #[tokio::test]
    async fn test_unreachable_api_returns_false() {
        // Nothing listens here; the transport error must become `false`
        let n = notifier(Some("token"), Some("42")).with_api_base("http://127.0.0.1:9");
        assert!(!n.send("hello", None).await);
    }

    #[tokio::test]
    async fn test_explicit_chat_id_overrides_default() {
        // Still fails to connect, but exercises the chat id resolution path
        let n = notifier(Some("token"), Some("42")).with_api_base("http://127.0.0.1:9");
        assert!(!n.send("hello", Some("99")).await);
    }
}
