//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (script or debug route):
//!     → gate.rs (api key, identity lock, signature)
//!     → signature.rs (HMAC + freshness window, via gate)
//!     → clock.rs (time source for the freshness window)
//!     → AuthDecision handed to the HTTP layer for rendering
//! ```
//!
//! # Design Decisions
//! - Fail closed: a missing api key refuses every request
//! - Secret comparisons are constant time
//! - No secret material in logs or Debug output

pub mod clock;
pub mod gate;
pub mod signature;

pub use clock::{Clock, FixedClock, SystemClock};
pub use gate::{AuthDecision, AuthorizationGate, DenyReason, GateError};
