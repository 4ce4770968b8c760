//! Auxiliary introspection routes, off by default.
//!
//! Mounted behind the same authorization gate as the script route. Nothing
//! here reveals secret values.

pub mod handlers;

use axum::{routing::get, Router};

use self::handlers::*;
use crate::http::server::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/debug/health", get(get_health))
        .route("/debug/config", get(get_config))
        .route("/debug/upstream", get(get_upstream))
}
