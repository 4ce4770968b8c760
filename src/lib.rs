//! Single-route gate in front of one upstream script.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ─────────▶ http::server ──▶ http::middleware ──▶ security::gate
//!                (request id,     (authorization)       (key, identity,
//!                 trace, timeout)        │               signature)
//!                                        │ deny
//!                                        ▼
//!                                 http::response ◀── upstream::forwarder ◀── allow
//!     Client Response                (404 / 401 / 500 / 502 / 200)       (GET upstream)
//!     ◀─────────
//! ```

pub mod config;
pub mod debug;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod security;
pub mod upstream;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
