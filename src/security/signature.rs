//! HMAC-SHA256 request signatures with a freshness window.
//!
//! A caller signs `"<timestamp>\nGET /obtener-script"` where `<timestamp>` is
//! the exact value sent in the timestamp header (epoch milliseconds). The
//! signature travels hex-encoded.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// The only route a signature can authorize.
pub const SIGNED_ROUTE: &str = "GET /obtener-script";

/// Maximum allowed distance between a signed timestamp and the gate's clock.
pub const FRESHNESS_WINDOW_MS: i64 = 5 * 60 * 1000;

/// Why a signature was not accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureError {
    /// Timestamp unparsable or outside the freshness window.
    Stale,
    /// Signature does not match, or is not valid hex.
    Mismatch,
    /// The secret could not be used as an HMAC key.
    InvalidKey,
}

/// Canonical message for a timestamp.
pub fn canonical_message(timestamp: &str) -> String {
    format!("{}\n{}", timestamp, SIGNED_ROUTE)
}

/// Compute the hex-encoded signature for `timestamp`.
pub fn sign(secret: &str, timestamp: &str) -> Result<String, SignatureError> {
    let mut mac = mac_for(secret)?;
    mac.update(canonical_message(timestamp).as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a presented signature for `timestamp` against `now_ms`.
///
/// Freshness is checked before the MAC so stale requests do no HMAC work.
pub fn verify(
    secret: &str,
    timestamp: &str,
    signature: &str,
    now_ms: i64,
) -> Result<(), SignatureError> {
    let ts: i64 = timestamp.trim().parse().map_err(|_| SignatureError::Stale)?;
    if now_ms.abs_diff(ts) > FRESHNESS_WINDOW_MS as u64 {
        return Err(SignatureError::Stale);
    }

    let presented = hex::decode(signature.trim()).map_err(|_| SignatureError::Mismatch)?;

    let mut mac = mac_for(secret)?;
    mac.update(canonical_message(timestamp).as_bytes());
    mac.verify_slice(&presented).map_err(|_| SignatureError::Mismatch)
}

fn mac_for(secret: &str) -> Result<HmacSha256, SignatureError> {
    HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| SignatureError::InvalidKey)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn signed(secret: &str, ts: &str) -> String {
        sign(secret, ts).unwrap()
    }

    #[test]
    fn test_canonical_message() {
        assert_eq!(canonical_message("123"), "123\nGET /obtener-script");
    }

    #[test]
    fn test_signature_is_lowercase_hex() {
        let sig = signed("secret", "1700000000000");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_fresh_signature_passes() {
        let ts = (NOW - 60_000).to_string();
        let sig = signed("s3cret", &ts);
        assert_eq!(verify("s3cret", &ts, &sig, NOW), Ok(()));
    }

    #[test]
    fn test_window_edges() {
        let edge = (NOW - FRESHNESS_WINDOW_MS).to_string();
        assert!(verify("k", &edge, &signed("k", &edge), NOW).is_ok());

        let future_edge = (NOW + FRESHNESS_WINDOW_MS).to_string();
        assert!(verify("k", &future_edge, &signed("k", &future_edge), NOW).is_ok());

        let past = (NOW - FRESHNESS_WINDOW_MS - 1).to_string();
        assert_eq!(verify("k", &past, &signed("k", &past), NOW), Err(SignatureError::Stale));

        let future = (NOW + FRESHNESS_WINDOW_MS + 1).to_string();
        assert_eq!(verify("k", &future, &signed("k", &future), NOW), Err(SignatureError::Stale));
    }

    #[test]
    fn test_unparsable_timestamp_is_stale() {
        assert_eq!(verify("k", "yesterday", "00", NOW), Err(SignatureError::Stale));
        assert_eq!(verify("k", "", "00", NOW), Err(SignatureError::Stale));
    }

    #[test]
    fn test_single_byte_change_fails() {
        let ts = NOW.to_string();
        let mut bytes = hex::decode(signed("k", &ts)).unwrap();
        bytes[7] ^= 0x01;
        let tampered = hex::encode(bytes);
        assert_eq!(verify("k", &ts, &tampered, NOW), Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_wrong_secret_fails() {
        let ts = NOW.to_string();
        let sig = signed("right", &ts);
        assert_eq!(verify("wrong", &ts, &sig, NOW), Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_invalid_hex_fails() {
        let ts = NOW.to_string();
        assert_eq!(verify("k", &ts, "zz-not-hex", NOW), Err(SignatureError::Mismatch));
    }

    #[test]
    fn test_uppercase_hex_accepted() {
        let ts = NOW.to_string();
        let sig = signed("k", &ts).to_uppercase();
        assert!(verify("k", &ts, &sig, NOW).is_ok());
    }
}
