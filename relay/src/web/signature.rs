//! Webhook signature verification.
//!
//! Inbound webhooks are signed with HMAC-SHA256 over the raw request body,
//! delivered as `sha256=<hex digest>` in the X-Hub-Signature-256 header.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Compute the expected signature header value for a payload:
/// `"sha256=" + hex(HMAC-SHA256(secret, payload))`.
pub fn compute_signature(secret: &[u8], payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret)
        .expect("HMAC accepts keys of any length");
    mac.update(payload);
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

/// Verify a webhook signature against the raw request body.
///
/// Returns `false` for an empty signature. The comparison is constant-time
/// so a mismatch position cannot be recovered from response latency.
pub fn verify_signature(secret: &[u8], payload: &[u8], provided: &str) -> bool {
    if provided.is_empty() {
        warn!("webhook_signature_empty");
        return false;
    }

    let expected = compute_signature(secret, payload);
    let valid = constant_time_compare(&expected, provided);

    if !valid {
        warn!(
            expected_length = expected.len(),
            actual_length = provided.len(),
            "webhook_signature_mismatch"
        );
    }

    valid
}

/// Constant-time string comparison to prevent timing attacks.
///
/// The length check short-circuits, but signature lengths are public.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_signature_format() {
        let sig = compute_signature(b"secret", b"payload");
        assert!(sig.starts_with("sha256="));
        // "sha256=" plus 32 hex-encoded bytes
        assert_eq!(sig.len(), 7 + 64);
    }

    #[test]
    fn test_verify_round_trip() {
        let secret = b"default-secret-key";
        let payload = br#"{"event":"test"}"#;
        let sig = compute_signature(secret, payload);
        assert!(verify_signature(secret, payload, &sig));
    }

    #[test]
    fn test_verify_rejects_tampered_payload() {
        let secret = b"default-secret-key";
        let sig = compute_signature(secret, br#"{"event":"test"}"#);
        assert!(!verify_signature(secret, br#"{"event":"evil"}"#, &sig));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let payload = br#"{"event":"test"}"#;
        let sig = compute_signature(b"other-secret", payload);
        assert!(!verify_signature(b"default-secret-key", payload, &sig));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(!verify_signature(b"secret", b"payload", "sha256=invalid"));
    }

    #[test]
    fn test_verify_rejects_empty() {
        assert!(!verify_signature(b"secret", b"payload", ""));
    }

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("abc", "abc"));
        assert!(!constant_time_compare("abc", "abd"));
        assert!(!constant_time_compare("abc", "abcd"));
    }
}
