use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::http::server::AppState;
use crate::upstream::UpstreamOutcome;

#[derive(Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ConfigSummary {
    pub api_key_configured: bool,
    pub signature_enabled: bool,
    pub user_agent_lock_configured: bool,
    pub upstream_url_configured: bool,
    pub upstream_host: Option<String>,
    pub upstream_auth_token_configured: bool,
    pub upstream_api_key_configured: bool,
    pub denial_mode: &'static str,
}

#[derive(Serialize)]
pub struct UpstreamProbe {
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transport: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<usize>,
}

pub async fn get_health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub async fn get_config(State(state): State<AppState>) -> Json<ConfigSummary> {
    let creds = &state.credentials;
    Json(ConfigSummary {
        api_key_configured: creds.api_key.is_some(),
        signature_enabled: state.gate.signature_enabled(),
        user_agent_lock_configured: creds.user_agent_lock.is_some(),
        upstream_url_configured: creds.upstream_url.is_some(),
        upstream_host: creds.upstream_host().map(str::to_string),
        upstream_auth_token_configured: creds.upstream_auth_token.is_some(),
        upstream_api_key_configured: creds.upstream_api_key.is_some(),
        denial_mode: state.gate.mode().as_str(),
    })
}

/// Fetch the upstream once and report only its classification.
pub async fn get_upstream(State(state): State<AppState>) -> Response {
    let outcome = match state.forwarder.fetch().await {
        Ok(outcome) => outcome,
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "outcome": "misconfigured", "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let probe = match &outcome {
        UpstreamOutcome::Success { body, .. } => UpstreamProbe {
            outcome: outcome.label(),
            status: None,
            status_class: None,
            transport: None,
            bytes: Some(body.len()),
        },
        UpstreamOutcome::UpstreamFailure { status_class, status } => UpstreamProbe {
            outcome: outcome.label(),
            status: Some(status.as_u16()),
            status_class: Some(status_class.as_str()),
            transport: None,
            bytes: None,
        },
        UpstreamOutcome::TransportFailure(kind) => UpstreamProbe {
            outcome: outcome.label(),
            status: None,
            status_class: None,
            transport: Some(kind.as_str()),
            bytes: None,
        },
    };

    Json(probe).into_response()
}
