//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Header carrying the caller's shared API key unless configured otherwise.
pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

/// Header carrying the millisecond epoch timestamp of a signed request.
pub const DEFAULT_TIMESTAMP_HEADER: &str = "x-timestamp";

/// Header carrying the hex-encoded HMAC-SHA256 signature.
pub const DEFAULT_SIGNATURE_HEADER: &str = "x-signature";

/// Root configuration for the gate.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Authorization pipeline settings.
    pub gate: GateConfig,

    /// Protected upstream resource and the credentials forwarded to it.
    pub upstream: UpstreamConfig,

    /// Shape of successful responses.
    pub response: ResponseConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Auxiliary introspection routes.
    pub debug: DebugConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// How authorization failures are rendered to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenialMode {
    /// Every denial looks exactly like a route that does not exist.
    #[default]
    Disguise,
    /// Each denial reason gets its own status and body.
    Explicit,
}

impl DenialMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenialMode::Disguise => "disguise",
            DenialMode::Explicit => "explicit",
        }
    }
}

impl FromStr for DenialMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disguise" => Ok(DenialMode::Disguise),
            "explicit" => Ok(DenialMode::Explicit),
            other => Err(format!("unknown denial mode '{}'", other)),
        }
    }
}

/// Authorization pipeline configuration.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Shared secret callers must present. Unset means every request is refused.
    pub api_key: Option<String>,

    /// Header the API key is read from.
    pub api_key_header: String,

    /// HMAC key; presence enables signature checking.
    pub signing_secret: Option<String>,

    /// Header carrying the signed timestamp.
    pub timestamp_header: String,

    /// Header carrying the signature.
    pub signature_header: String,

    /// Required `User-Agent` prefix.
    pub user_agent_lock: Option<String>,

    /// Denial rendering policy.
    pub denial_mode: DenialMode,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
            signing_secret: None,
            timestamp_header: DEFAULT_TIMESTAMP_HEADER.to_string(),
            signature_header: DEFAULT_SIGNATURE_HEADER.to_string(),
            user_agent_lock: None,
            denial_mode: DenialMode::Disguise,
        }
    }
}

impl fmt::Debug for GateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GateConfig")
            .field("api_key", &redacted(&self.api_key))
            .field("api_key_header", &self.api_key_header)
            .field("signing_secret", &redacted(&self.signing_secret))
            .field("timestamp_header", &self.timestamp_header)
            .field("signature_header", &self.signature_header)
            .field("user_agent_lock", &self.user_agent_lock)
            .field("denial_mode", &self.denial_mode)
            .finish()
    }
}

/// Upstream resource configuration.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Absolute URL of the protected resource.
    pub url: Option<String>,

    /// Bearer token sent as `Authorization` upstream.
    pub auth_token: Option<String>,

    /// Secondary credential sent as `x-api-key` upstream.
    pub api_key: Option<String>,

    /// Optional `Accept` header for the upstream request.
    pub accept: Option<String>,

    /// Total upstream request timeout in milliseconds.
    pub timeout_ms: u64,

    /// Largest upstream body relayed to callers.
    pub max_body_bytes: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: None,
            auth_token: None,
            api_key: None,
            accept: None,
            timeout_ms: 15_000,
            max_body_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

impl fmt::Debug for UpstreamConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamConfig")
            .field("url", &self.url)
            .field("auth_token", &redacted(&self.auth_token))
            .field("api_key", &redacted(&self.api_key))
            .field("accept", &self.accept)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_body_bytes", &self.max_body_bytes)
            .finish()
    }
}

fn redacted(value: &Option<String>) -> Option<&'static str> {
    value.as_ref().map(|_| "[REDACTED]")
}

/// Successful response shaping.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Content type used when the upstream sends none.
    pub fallback_content_type: String,

    /// Always use `fallback_content_type`, ignoring the upstream's.
    pub force_content_type: bool,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            fallback_content_type: "text/plain; charset=utf-8".to_string(),
            force_content_type: false,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Pretty for development, JSON for production.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

/// Debug route configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DebugConfig {
    /// Expose `/debug/*` routes. Off unless explicitly enabled.
    pub enabled: bool,
}
