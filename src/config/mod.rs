//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (environment overrides)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → credentials.rs (secrets extracted once)
//!     → injected into the gate and the forwarder
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod credentials;
pub mod loader;
pub mod schema;
pub mod validation;

pub use credentials::Credentials;
pub use loader::{load, ConfigError, ConfigResult};
pub use schema::{
    DebugConfig, DenialMode, GateConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    ProxyConfig, ResponseConfig, TimeoutConfig, UpstreamConfig,
};
