//! Authorization middleware.
//! Runs the gate before any protected handler and renders denials.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::http::request::request_id;
use crate::http::response::render_denial;
use crate::security::{AuthDecision, AuthorizationGate, DenyReason};

pub async fn authorization_middleware(
    State(gate): State<Arc<AuthorizationGate>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    match gate.evaluate(request.headers()) {
        AuthDecision::Allow => next.run(request).await,
        AuthDecision::Deny { reason, disguise } => {
            let request_id = request_id(request.headers());
            let path = request.uri().path();
            if reason == DenyReason::MissingConfig {
                tracing::error!(request_id = %request_id, path = %path, "No API key configured, refusing request");
            } else {
                tracing::warn!(request_id = %request_id, path = %path, reason = %reason, "Request denied");
            }
            render_denial(reason, disguise)
        }
    }
}
