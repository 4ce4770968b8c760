//! Authorization gate for the script route.
//!
//! # Check Order
//! ```text
//! api key configured?  → no  → Deny(MissingConfig, never disguised)
//! api key matches?     → no  → Deny(BadKey)
//! user agent lock?     → no  → Deny(BadIdentity)      (only if configured)
//! signature headers?   → no  → Deny(MissingSignature) (only if signing secret)
//! timestamp fresh?     → no  → Deny(StaleTimestamp)
//! signature valid?     → no  → Deny(BadSignature)
//!                      → Allow
//! ```

use std::fmt;
use std::sync::Arc;

use axum::http::{header, HeaderMap, HeaderName};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

use crate::config::{Credentials, DenialMode, GateConfig};
use crate::security::clock::Clock;
use crate::security::signature::{self, SignatureError};

/// Internal classification of a refused request. Never shown to callers in
/// disguise mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    MissingConfig,
    BadKey,
    BadIdentity,
    MissingSignature,
    StaleTimestamp,
    BadSignature,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::MissingConfig => "missing_config",
            DenyReason::BadKey => "bad_key",
            DenyReason::BadIdentity => "bad_identity",
            DenyReason::MissingSignature => "missing_signature",
            DenyReason::StaleTimestamp => "stale_timestamp",
            DenyReason::BadSignature => "bad_signature",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Allow,
    Deny { reason: DenyReason, disguise: bool },
}

impl AuthDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthDecision::Allow)
    }
}

/// Errors building a gate from configuration.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("invalid header name '{0}'")]
    HeaderName(String),
}

/// Decides whether a request may trigger the upstream fetch.
pub struct AuthorizationGate {
    api_key_digest: Option<Vec<u8>>,
    signing_secret: Option<SecretString>,
    user_agent_lock: Option<String>,
    api_key_header: HeaderName,
    timestamp_header: HeaderName,
    signature_header: HeaderName,
    mode: DenialMode,
    clock: Arc<dyn Clock>,
}

impl AuthorizationGate {
    pub fn new(
        config: &GateConfig,
        credentials: &Credentials,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, GateError> {
        Ok(Self {
            api_key_digest: credentials
                .api_key
                .as_ref()
                .map(|key| digest(key.expose_secret())),
            signing_secret: credentials.signing_secret.clone(),
            user_agent_lock: credentials.user_agent_lock.clone(),
            api_key_header: header_name(&config.api_key_header)?,
            timestamp_header: header_name(&config.timestamp_header)?,
            signature_header: header_name(&config.signature_header)?,
            mode: config.denial_mode,
            clock,
        })
    }

    /// Denial rendering policy this gate was built with.
    pub fn mode(&self) -> DenialMode {
        self.mode
    }

    /// Whether timestamp/signature headers are required.
    pub fn signature_enabled(&self) -> bool {
        self.signing_secret.is_some()
    }

    /// Evaluate request headers at the current clock reading.
    pub fn evaluate(&self, headers: &HeaderMap) -> AuthDecision {
        match self.check(headers) {
            Ok(()) => AuthDecision::Allow,
            Err(reason) => AuthDecision::Deny {
                reason,
                disguise: self.mode == DenialMode::Disguise && reason != DenyReason::MissingConfig,
            },
        }
    }

    fn check(&self, headers: &HeaderMap) -> Result<(), DenyReason> {
        let expected = self
            .api_key_digest
            .as_ref()
            .ok_or(DenyReason::MissingConfig)?;

        let presented = header_str(headers, &self.api_key_header).ok_or(DenyReason::BadKey)?;
        // Digests have equal length, so the comparison time is independent of the key.
        if !bool::from(expected.as_slice().ct_eq(digest(presented).as_slice())) {
            return Err(DenyReason::BadKey);
        }

        if let Some(prefix) = &self.user_agent_lock {
            let agent = header_str(headers, &header::USER_AGENT).unwrap_or_default();
            if !agent.starts_with(prefix.as_str()) {
                return Err(DenyReason::BadIdentity);
            }
        }

        if let Some(secret) = &self.signing_secret {
            let timestamp = header_str(headers, &self.timestamp_header);
            let sig = header_str(headers, &self.signature_header);
            let (Some(timestamp), Some(sig)) = (timestamp, sig) else {
                return Err(DenyReason::MissingSignature);
            };

            signature::verify(secret.expose_secret(), timestamp, sig, self.clock.now_millis())
                .map_err(|e| match e {
                    SignatureError::Stale => DenyReason::StaleTimestamp,
                    SignatureError::Mismatch | SignatureError::InvalidKey => DenyReason::BadSignature,
                })?;
        }

        Ok(())
    }
}

impl fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationGate")
            .field("api_key_configured", &self.api_key_digest.is_some())
            .field("signature_enabled", &self.signature_enabled())
            .field("user_agent_lock", &self.user_agent_lock)
            .field("mode", &self.mode)
            .finish()
    }
}

fn digest(value: &str) -> Vec<u8> {
    Sha256::digest(value.as_bytes()).to_vec()
}

fn header_name(name: &str) -> Result<HeaderName, GateError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| GateError::HeaderName(name.to_string()))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProxyConfig;
    use crate::security::clock::FixedClock;
    use axum::http::HeaderValue;

    const NOW: i64 = 1_700_000_000_000;

    fn gate_with(edit: impl FnOnce(&mut ProxyConfig)) -> AuthorizationGate {
        let mut config = ProxyConfig::default();
        config.gate.api_key = Some("k1".into());
        edit(&mut config);
        let credentials = Credentials::from_config(&config);
        AuthorizationGate::new(&config.gate, &credentials, Arc::new(FixedClock(NOW))).unwrap()
    }

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    fn denied(reason: DenyReason) -> AuthDecision {
        AuthDecision::Deny { reason, disguise: true }
    }

    #[test]
    fn test_missing_api_key_config_is_never_disguised() {
        let gate = gate_with(|c| c.gate.api_key = None);
        assert_eq!(
            gate.evaluate(&headers(&[("x-api-key", "anything")])),
            AuthDecision::Deny { reason: DenyReason::MissingConfig, disguise: false }
        );
    }

    #[test]
    fn test_api_key() {
        let gate = gate_with(|_| {});
        assert_eq!(gate.evaluate(&headers(&[("x-api-key", "k1")])), AuthDecision::Allow);
        assert_eq!(gate.evaluate(&headers(&[("x-api-key", "wrong")])), denied(DenyReason::BadKey));
        assert_eq!(gate.evaluate(&headers(&[("x-api-key", "k1 ")])), denied(DenyReason::BadKey));
        assert_eq!(gate.evaluate(&headers(&[("x-api-key", "k")])), denied(DenyReason::BadKey));
        assert_eq!(gate.evaluate(&HeaderMap::new()), denied(DenyReason::BadKey));
    }

    #[test]
    fn test_custom_key_header_is_case_insensitive() {
        let gate = gate_with(|c| c.gate.api_key_header = "X-Client-Key".into());
        assert!(gate.evaluate(&headers(&[("x-client-key", "k1")])).is_allowed());
        assert_eq!(gate.evaluate(&headers(&[("x-api-key", "k1")])), denied(DenyReason::BadKey));
    }

    #[test]
    fn test_user_agent_lock() {
        let gate = gate_with(|c| c.gate.user_agent_lock = Some("Roblox/".into()));
        assert!(gate
            .evaluate(&headers(&[("x-api-key", "k1"), ("user-agent", "Roblox/WinInet")]))
            .is_allowed());
        assert_eq!(
            gate.evaluate(&headers(&[("x-api-key", "k1"), ("user-agent", "curl/8.0")])),
            denied(DenyReason::BadIdentity)
        );
        assert_eq!(
            gate.evaluate(&headers(&[("x-api-key", "k1")])),
            denied(DenyReason::BadIdentity)
        );
    }

    #[test]
    fn test_key_checked_before_identity() {
        let gate = gate_with(|c| c.gate.user_agent_lock = Some("Roblox/".into()));
        assert_eq!(
            gate.evaluate(&headers(&[("x-api-key", "nope"), ("user-agent", "curl/8.0")])),
            denied(DenyReason::BadKey)
        );
    }

    #[test]
    fn test_signature_checks() {
        let gate = gate_with(|c| c.gate.signing_secret = Some("s3".into()));
        let ts = (NOW - 1_000).to_string();
        let sig = signature::sign("s3", &ts).unwrap();

        assert!(gate
            .evaluate(&headers(&[("x-api-key", "k1"), ("x-timestamp", ts.as_str()), ("x-signature", sig.as_str())]))
            .is_allowed());

        assert_eq!(
            gate.evaluate(&headers(&[("x-api-key", "k1"), ("x-timestamp", ts.as_str())])),
            denied(DenyReason::MissingSignature)
        );
        assert_eq!(
            gate.evaluate(&headers(&[("x-api-key", "k1"), ("x-signature", sig.as_str())])),
            denied(DenyReason::MissingSignature)
        );

        let old = (NOW - 6 * 60 * 1000).to_string();
        let old_sig = signature::sign("s3", &old).unwrap();
        assert_eq!(
            gate.evaluate(&headers(&[("x-api-key", "k1"), ("x-timestamp", old.as_str()), ("x-signature", old_sig.as_str())])),
            denied(DenyReason::StaleTimestamp)
        );

        let mut tampered = sig.clone().into_bytes();
        tampered[0] = if tampered[0] == b'0' { b'1' } else { b'0' };
        let tampered = String::from_utf8(tampered).unwrap();
        assert_eq!(
            gate.evaluate(&headers(&[("x-api-key", "k1"), ("x-timestamp", ts.as_str()), ("x-signature", tampered.as_str())])),
            denied(DenyReason::BadSignature)
        );
    }

    #[test]
    fn test_signature_not_required_without_secret() {
        let gate = gate_with(|_| {});
        assert!(!gate.signature_enabled());
        assert!(gate.evaluate(&headers(&[("x-api-key", "k1")])).is_allowed());
    }

    #[test]
    fn test_explicit_mode_does_not_disguise() {
        let gate = gate_with(|c| c.gate.denial_mode = DenialMode::Explicit);
        assert_eq!(
            gate.evaluate(&headers(&[("x-api-key", "wrong")])),
            AuthDecision::Deny { reason: DenyReason::BadKey, disguise: false }
        );
    }

    #[test]
    fn test_invalid_header_name_rejected() {
        let mut config = ProxyConfig::default();
        config.gate.signature_header = "bad header".into();
        let err = AuthorizationGate::new(
            &config.gate,
            &Credentials::from_config(&config),
            Arc::new(FixedClock(NOW)),
        )
        .unwrap_err();
        assert!(matches!(err, GateError::HeaderName(_)));
    }

    #[test]
    fn test_debug_hides_key() {
        let rendered = format!("{:?}", gate_with(|_| {}));
        assert!(!rendered.contains("k1"));
    }
}
