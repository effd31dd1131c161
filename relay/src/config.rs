//! Configuration module for environment variable parsing.
//!
//! All configuration is read once at startup and threaded through
//! constructors; handlers never touch the environment directly.

use std::env;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Shared secret for webhook HMAC signature verification
    pub webhook_secret: String,

    /// Telegram bot token; notifications are disabled when unset
    pub telegram_bot_token: Option<String>,

    /// Default Telegram chat to notify
    pub telegram_chat_id: Option<String>,

    /// Port for the web server to listen on
    pub port: u16,

    /// Trust X-Forwarded-For for rate-limit client keys. Only safe behind
    /// a proxy that overwrites the header.
    pub trust_proxy: bool,

    /// Enable debug-level logging
    pub debug: bool,

    /// Outbound HTTP request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            webhook_secret: env::var("WEBHOOK_SECRET")
                .unwrap_or_else(|_| "default-secret-key".to_string()),

            telegram_bot_token: non_empty("TELEGRAM_BOT_TOKEN"),

            telegram_chat_id: non_empty("TELEGRAM_CHAT_ID"),

            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),

            trust_proxy: env::var("TRUST_PROXY_HEADERS")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),

            debug: env::var("DEBUG")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),

            request_timeout_ms: env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
        }
    }
}

/// Read an environment variable, treating empty or whitespace-only values
/// as unset.
fn non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_unset() {
        assert_eq!(non_empty("RELAY_TEST_NONEXISTENT_VAR"), None);
    }

    #[test]
    fn test_non_empty_blank() {
        env::set_var("RELAY_TEST_BLANK_VAR", "   ");
        assert_eq!(non_empty("RELAY_TEST_BLANK_VAR"), None);
        env::remove_var("RELAY_TEST_BLANK_VAR");
    }

    #[test]
    fn test_non_empty_set() {
        env::set_var("RELAY_TEST_SET_VAR", "token123");
        assert_eq!(non_empty("RELAY_TEST_SET_VAR"), Some("token123".to_string()));
        env::remove_var("RELAY_TEST_SET_VAR");
    }
}
