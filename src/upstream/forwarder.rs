//! Single-target upstream fetch.
//!
//! # Responsibilities
//! - Issue one GET to the configured upstream with injected credentials
//! - Bound the whole exchange with the client timeout
//! - Classify the result into an [`UpstreamOutcome`]
//!
//! # Design Decisions
//! - URL, method and headers come only from configuration, never the caller
//! - No retries: a failure is reported immediately
//! - Non-2xx is an outcome, not an error; redirects are never followed

use std::time::Duration;

use axum::body::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::redirect::Policy;
use secrecy::ExposeSecret;
use url::Url;

use crate::config::{Credentials, UpstreamConfig};
use crate::upstream::types::{
    ClientBuildError, ConfigurationError, StatusClass, TransportKind, UpstreamOutcome,
};

/// User agent presented to the upstream.
pub const USER_AGENT: &str = concat!("script-gate/", env!("CARGO_PKG_VERSION"));

/// Fetches the protected resource.
#[derive(Debug, Clone)]
pub struct UpstreamForwarder {
    client: reqwest::Client,
    url: Option<Url>,
    max_body_bytes: usize,
}

impl UpstreamForwarder {
    pub fn new(config: &UpstreamConfig, credentials: &Credentials) -> Result<Self, ClientBuildError> {
        let mut headers = HeaderMap::new();

        if let Some(token) = &credentials.upstream_auth_token {
            let value = format!("Bearer {}", token.expose_secret());
            headers.insert(AUTHORIZATION, sensitive(&value, "upstream.auth_token")?);
        }
        if let Some(key) = &credentials.upstream_api_key {
            headers.insert("x-api-key", sensitive(key.expose_secret(), "upstream.api_key")?);
        }
        if let Some(accept) = &config.accept {
            let value = HeaderValue::from_str(accept)
                .map_err(|_| ClientBuildError::HeaderValue("upstream.accept"))?;
            headers.insert(ACCEPT, value);
        }

        // A 3xx is an upstream failure; following it would also carry the
        // injected headers to another host.
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .redirect(Policy::none())
            .referer(false)
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            url: credentials.upstream_url.clone(),
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Perform the upstream fetch.
    ///
    /// Only a missing upstream URL is an error; every network result maps to
    /// an [`UpstreamOutcome`].
    pub async fn fetch(&self) -> Result<UpstreamOutcome, ConfigurationError> {
        let url = self.url.as_ref().ok_or(ConfigurationError::MissingUpstreamUrl)?;
        let host = url.host_str().unwrap_or("unknown");

        let response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => {
                let kind = TransportKind::from_error(&e);
                tracing::error!(
                    upstream_host = %host,
                    kind = kind.as_str(),
                    error = %e.without_url(),
                    "Upstream request failed"
                );
                return Ok(UpstreamOutcome::TransportFailure(kind));
            }
        };

        let status = response.status();
        if let Some(status_class) = StatusClass::of(status) {
            tracing::warn!(
                upstream_host = %host,
                status = status.as_u16(),
                "Upstream returned non-success status"
            );
            return Ok(UpstreamOutcome::UpstreamFailure {
                status_class,
                status,
            });
        }

        let content_type = response.headers().get(CONTENT_TYPE).cloned();
        match read_body(response, self.max_body_bytes).await {
            Ok(body) => {
                tracing::debug!(
                    upstream_host = %host,
                    status = status.as_u16(),
                    bytes = body.len(),
                    "Upstream fetch succeeded"
                );
                Ok(UpstreamOutcome::Success { body, content_type })
            }
            Err(kind) => {
                tracing::error!(
                    upstream_host = %host,
                    kind = kind.as_str(),
                    limit = self.max_body_bytes,
                    "Failed to read upstream body"
                );
                Ok(UpstreamOutcome::TransportFailure(kind))
            }
        }
    }
}

fn sensitive(value: &str, field: &'static str) -> Result<HeaderValue, ClientBuildError> {
    let mut value = HeaderValue::from_str(value).map_err(|_| ClientBuildError::HeaderValue(field))?;
    value.set_sensitive(true);
    Ok(value)
}

/// Read the body, refusing anything larger than `limit` bytes.
async fn read_body(mut response: reqwest::Response, limit: usize) -> Result<Bytes, TransportKind> {
    if response.content_length().is_some_and(|len| len > limit as u64) {
        return Err(TransportKind::TooLarge);
    }

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| TransportKind::from_error(&e))?
    {
        if body.len() + chunk.len() > limit {
            return Err(TransportKind::TooLarge);
        }
        body.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(body))
}
