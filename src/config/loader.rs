//! Configuration loading from disk and the process environment.

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::ProxyConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {var}: {reason}")]
    Env { var: &'static str, reason: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the startup configuration: optional file, then environment, then validation.
pub fn load<E>(path: Option<&Path>, env: E) -> ConfigResult<ProxyConfig>
where
    E: Fn(&str) -> Option<String>,
{
    let mut config: ProxyConfig = match path {
        Some(path) => toml::from_str(&fs::read_to_string(path)?)?,
        None => ProxyConfig::default(),
    };

    apply_env_overrides(&mut config, env)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto `config`. Empty values count as unset.
pub fn apply_env_overrides<E>(config: &mut ProxyConfig, env: E) -> ConfigResult<()>
where
    E: Fn(&str) -> Option<String>,
{
    let var = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    if let Some(url) = var("UPSTREAM_URL").or_else(|| var("TARGET_URL")) {
        config.upstream.url = Some(url);
    }
    if let Some(key) = var("PROXY_API_KEY") {
        config.gate.api_key = Some(key);
    }
    if let Some(secret) = var("SIGNING_SECRET") {
        config.gate.signing_secret = Some(secret);
    }
    if let Some(prefix) = var("USER_AGENT_LOCK") {
        config.gate.user_agent_lock = Some(prefix);
    }
    if let Some(token) = var("UPSTREAM_AUTH_TOKEN").or_else(|| var("GITHUB_TOKEN")) {
        config.upstream.auth_token = Some(token);
    }
    if let Some(key) = var("UPSTREAM_API_KEY").or_else(|| var("API_KEY")) {
        config.upstream.api_key = Some(key);
    }
    if let Some(mode) = var("DENIAL_MODE") {
        config.gate.denial_mode = mode.parse().map_err(|reason| ConfigError::Env {
            var: "DENIAL_MODE",
            reason,
        })?;
    }
    if let Some(flag) = var("DEBUG_ROUTES") {
        config.debug.enabled = parse_bool(&flag).ok_or_else(|| ConfigError::Env {
            var: "DEBUG_ROUTES",
            reason: format!("expected a boolean, got '{}'", flag),
        })?;
    }
    if let Some(addr) = var("BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }
    if let Some(port) = var("PORT") {
        let port: u16 = port.trim().parse().map_err(|_| ConfigError::Env {
            var: "PORT",
            reason: format!("expected a port number, got '{}'", port),
        })?;
        let mut addr: SocketAddr = config
            .listener
            .bind_address
            .parse()
            .map_err(|_| ConfigError::Env {
                var: "PORT",
                reason: format!("bind address '{}' is not a socket address", config.listener.bind_address),
            })?;
        addr.set_port(port);
        config.listener.bind_address = addr.to_string();
    }
    if let Some(level) = var("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    if let Some(format) = var("LOG_FORMAT") {
        config.observability.log_format = format.parse().map_err(|reason| ConfigError::Env {
            var: "LOG_FORMAT",
            reason,
        })?;
    }

    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
