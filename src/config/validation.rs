//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, body limits > 0)
//! - Check header names and the upstream URL are well formed
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Missing secrets are not errors: the gate refuses traffic instead

use std::net::SocketAddr;

use axum::http::{HeaderName, HeaderValue};
use thiserror::Error;
use url::Url;

use crate::config::schema::ProxyConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("upstream url is not an absolute http(s) url: {0}")]
    UpstreamUrl(String),

    #[error("invalid header name for {field}: '{value}'")]
    HeaderName { field: &'static str, value: String },

    #[error("invalid header value for {0}")]
    HeaderValue(&'static str),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("request timeout ({request_secs}s) must exceed upstream timeout ({upstream_ms}ms)")]
    TimeoutOrdering { request_secs: u64, upstream_ms: u64 },
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if let Some(raw) = &config.upstream.url {
        if let Err(reason) = parse_upstream_url(raw) {
            errors.push(ValidationError::UpstreamUrl(reason));
        }
    }

    let headers = [
        ("gate.api_key_header", &config.gate.api_key_header),
        ("gate.timestamp_header", &config.gate.timestamp_header),
        ("gate.signature_header", &config.gate.signature_header),
    ];
    for (field, value) in headers {
        if HeaderName::from_bytes(value.as_bytes()).is_err() {
            errors.push(ValidationError::HeaderName {
                field,
                value: value.clone(),
            });
        }
    }

    let values = [
        ("upstream.auth_token", config.upstream.auth_token.as_deref()),
        ("upstream.api_key", config.upstream.api_key.as_deref()),
        ("upstream.accept", config.upstream.accept.as_deref()),
        ("response.fallback_content_type", Some(config.response.fallback_content_type.as_str())),
    ];
    for (field, value) in values {
        if let Some(v) = value {
            if HeaderValue::from_str(v).is_err() {
                errors.push(ValidationError::HeaderValue(field));
            }
        }
    }

    if config.upstream.timeout_ms == 0 {
        errors.push(ValidationError::Zero("upstream.timeout_ms"));
    }
    if config.upstream.max_body_bytes == 0 {
        errors.push(ValidationError::Zero("upstream.max_body_bytes"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.request_secs"));
    } else if config.timeouts.request_secs.saturating_mul(1000) <= config.upstream.timeout_ms {
        errors.push(ValidationError::TimeoutOrdering {
            request_secs: config.timeouts.request_secs,
            upstream_ms: config.upstream.timeout_ms,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Parse the upstream URL, accepting only absolute http and https URLs.
pub fn parse_upstream_url(raw: &str) -> Result<Url, String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" if url.has_host() => Ok(url),
        "http" | "https" => Err("missing host".to_string()),
        other => Err(format!("unsupported scheme '{}'", other)),
    }
}
