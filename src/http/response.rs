//! Caller-facing response shapes.
//!
//! # Responsibilities
//! - Render gate denials per the configured policy
//! - Map upstream outcomes to 200 / 502 without leaking upstream detail
//! - Provide the "not found" shape shared by disguised denials and unknown routes
//!
//! # Design Decisions
//! - Upstream failure and transport failure render identically
//! - Disguised denials are byte-identical to the router fallback
//! - Successful bodies are relayed as-is and marked `no-store`

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::config::ResponseConfig;
use crate::security::DenyReason;
use crate::upstream::UpstreamOutcome;

/// Body of every "not found" response.
pub const NOT_FOUND_BODY: &str = "Not Found";

const PLAIN_TEXT: &str = "text/plain; charset=utf-8";

/// The response for unknown routes and disguised denials.
pub fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [(header::CONTENT_TYPE, PLAIN_TEXT)],
        NOT_FOUND_BODY,
    )
        .into_response()
}

/// Router and method fallback handler.
pub async fn fallback() -> Response {
    not_found()
}

/// Operator-facing fault: a required secret or the upstream URL is missing.
pub fn misconfigured() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "server misconfigured" })),
    )
        .into_response()
}

/// The single opaque failure for anything that went wrong upstream.
pub fn upstream_unavailable() -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Json(json!({ "error": "upstream unavailable" })),
    )
        .into_response()
}

/// Render a gate denial.
pub fn render_denial(reason: DenyReason, disguise: bool) -> Response {
    let (status, message) = match reason {
        DenyReason::MissingConfig => return misconfigured(),
        _ if disguise => return not_found(),
        DenyReason::BadKey => (StatusCode::UNAUTHORIZED, "invalid api key"),
        DenyReason::BadIdentity => (StatusCode::FORBIDDEN, "client not allowed"),
        DenyReason::MissingSignature => (StatusCode::UNAUTHORIZED, "missing signature"),
        DenyReason::StaleTimestamp => (StatusCode::UNAUTHORIZED, "stale timestamp"),
        DenyReason::BadSignature => (StatusCode::UNAUTHORIZED, "invalid signature"),
    };
    (status, Json(json!({ "error": message }))).into_response()
}

/// How successful upstream bodies are labelled.
#[derive(Debug, Clone)]
pub struct ResponseShape {
    fallback_content_type: HeaderValue,
    force_content_type: bool,
}

impl ResponseShape {
    pub fn from_config(config: &ResponseConfig) -> Self {
        Self {
            fallback_content_type: HeaderValue::from_str(&config.fallback_content_type)
                .unwrap_or_else(|_| HeaderValue::from_static(PLAIN_TEXT)),
            force_content_type: config.force_content_type,
        }
    }

    /// Map an upstream outcome to the caller response.
    pub fn render(&self, outcome: UpstreamOutcome) -> Response {
        match outcome {
            UpstreamOutcome::Success { body, content_type } => {
                let content_type = match content_type {
                    Some(ct) if !self.force_content_type => ct,
                    _ => self.fallback_content_type.clone(),
                };
                (
                    StatusCode::OK,
                    [
                        (header::CONTENT_TYPE, content_type),
                        (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
                    ],
                    body,
                )
                    .into_response()
            }
            UpstreamOutcome::UpstreamFailure { .. } | UpstreamOutcome::TransportFailure(_) => {
                upstream_unavailable()
            }
        }
    }
}

impl Default for ResponseShape {
    fn default() -> Self {
        Self::from_config(&ResponseConfig::default())
    }
}
