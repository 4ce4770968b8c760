//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once at startup
//! - Pick pretty or JSON output from configuration
//! - Honor `RUST_LOG` over the configured level
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - JSON format for production, pretty format for development
//! - Secrets are never passed to log macros; only presence flags are

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Credentials, LogFormat, ObservabilityConfig, ProxyConfig};

/// Default filter directive for a configured level.
pub fn default_directive(level: &str) -> String {
    format!("script_gate={level},tower_http={level}")
}

/// Install the global subscriber.
pub fn init(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(&config.log_level).into());

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).init(),
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
    }
}

/// Log what is configured without revealing any secret.
pub fn log_startup(config: &ProxyConfig, credentials: &Credentials) {
    tracing::info!(
        bind_address = %config.listener.bind_address,
        upstream_host = credentials.upstream_host().unwrap_or("(not set)"),
        api_key_configured = credentials.api_key.is_some(),
        signature_enabled = credentials.signing_secret.is_some(),
        user_agent_lock = credentials.user_agent_lock.is_some(),
        upstream_auth_token = credentials.upstream_auth_token.is_some(),
        upstream_api_key = credentials.upstream_api_key.is_some(),
        denial_mode = config.gate.denial_mode.as_str(),
        debug_routes = config.debug.enabled,
        "Configuration loaded"
    );

    if credentials.api_key.is_none() {
        tracing::warn!("No API key configured; every request will be refused");
    }
    if credentials.upstream_url.is_none() {
        tracing::warn!("No upstream URL configured; authorized requests will fail");
    }
}
