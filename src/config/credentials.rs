//! Process-wide credentials, fixed at startup.

use std::fmt;

use secrecy::SecretString;
use url::Url;

use crate::config::schema::ProxyConfig;
use crate::config::validation::parse_upstream_url;

/// Secrets and the upstream target, read once from [`ProxyConfig`].
///
/// `Debug` never prints secret values; use `secrecy::ExposeSecret` at the
/// point of use.
#[derive(Clone, Default)]
pub struct Credentials {
    pub api_key: Option<SecretString>,
    pub signing_secret: Option<SecretString>,
    pub user_agent_lock: Option<String>,
    pub upstream_url: Option<Url>,
    pub upstream_auth_token: Option<SecretString>,
    pub upstream_api_key: Option<SecretString>,
}

impl Credentials {
    /// Extract credentials from a validated configuration.
    ///
    /// An upstream URL that fails to parse is treated as absent.
    pub fn from_config(config: &ProxyConfig) -> Self {
        Self {
            api_key: secret(&config.gate.api_key),
            signing_secret: secret(&config.gate.signing_secret),
            user_agent_lock: config.gate.user_agent_lock.clone(),
            upstream_url: config
                .upstream
                .url
                .as_deref()
                .and_then(|raw| parse_upstream_url(raw).ok()),
            upstream_auth_token: secret(&config.upstream.auth_token),
            upstream_api_key: secret(&config.upstream.api_key),
        }
    }

    /// Host of the upstream URL, safe to log.
    pub fn upstream_host(&self) -> Option<&str> {
        self.upstream_url.as_ref().and_then(Url::host_str)
    }
}

fn secret(value: &Option<String>) -> Option<SecretString> {
    value.clone().map(SecretString::from)
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key.is_some())
            .field("signing_secret", &self.signing_secret.is_some())
            .field("user_agent_lock", &self.user_agent_lock)
            .field("upstream_host", &self.upstream_host())
            .field("upstream_auth_token", &self.upstream_auth_token.is_some())
            .field("upstream_api_key", &self.upstream_api_key.is_some())
            .finish()
    }
}
