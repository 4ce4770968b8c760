//! Upstream outcome and error definitions.

use axum::body::Bytes;
use axum::http::{HeaderValue, StatusCode};
use thiserror::Error;

/// Coarse class of a non-2xx upstream status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    Informational,
    Redirection,
    ClientError,
    ServerError,
}

impl StatusClass {
    /// Classify a status. Returns `None` for 2xx.
    pub fn of(status: StatusCode) -> Option<Self> {
        match status.as_u16() {
            100..=199 => Some(StatusClass::Informational),
            200..=299 => None,
            300..=399 => Some(StatusClass::Redirection),
            400..=499 => Some(StatusClass::ClientError),
            _ => Some(StatusClass::ServerError),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusClass::Informational => "1xx",
            StatusClass::Redirection => "3xx",
            StatusClass::ClientError => "4xx",
            StatusClass::ServerError => "5xx",
        }
    }
}

/// What went wrong below the HTTP layer. Diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Timeout,
    Connect,
    Body,
    TooLarge,
    Other,
}

impl TransportKind {
    pub fn from_error(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportKind::Timeout
        } else if err.is_connect() {
            TransportKind::Connect
        } else if err.is_body() || err.is_decode() {
            TransportKind::Body
        } else {
            TransportKind::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Timeout => "timeout",
            TransportKind::Connect => "connect",
            TransportKind::Body => "body",
            TransportKind::TooLarge => "too_large",
            TransportKind::Other => "other",
        }
    }
}

/// Exactly one of these is produced per forwarded request.
#[derive(Debug, Clone, PartialEq)]
pub enum UpstreamOutcome {
    /// 2xx with the full body and the upstream content type, if any.
    Success {
        body: Bytes,
        content_type: Option<HeaderValue>,
    },
    /// The upstream answered outside 2xx.
    UpstreamFailure {
        status_class: StatusClass,
        status: StatusCode,
    },
    /// No usable answer: DNS, connect, timeout, body read, size cap.
    TransportFailure(TransportKind),
}

impl UpstreamOutcome {
    /// Stable label for logs and the debug probe.
    pub fn label(&self) -> &'static str {
        match self {
            UpstreamOutcome::Success { .. } => "success",
            UpstreamOutcome::UpstreamFailure { .. } => "upstream_failure",
            UpstreamOutcome::TransportFailure(_) => "transport_failure",
        }
    }
}

/// The route cannot be served because configuration is incomplete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("upstream url is not configured")]
    MissingUpstreamUrl,
}

/// Errors building the upstream client at startup.
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid header value for {0}")]
    HeaderValue(&'static str),

    #[error("failed to build upstream client: {0}")]
    Client(#[from] reqwest::Error),
}
