//! Upstream subsystem.
//!
//! # Data Flow
//! ```text
//! Authorized request
//!     → forwarder.rs (GET upstream with injected credentials, bounded timeout)
//!     → types.rs (Success / UpstreamFailure / TransportFailure)
//!     → http::response maps the outcome to the caller contract
//! ```
//!
//! # Design Decisions
//! - Upstream status, headers and errors stay inside this process
//! - Timeouts are transport failures, never left pending

pub mod forwarder;
pub mod types;

pub use forwarder::UpstreamForwarder;
pub use types::{
    ClientBuildError, ConfigurationError, StatusClass, TransportKind, UpstreamOutcome,
};
