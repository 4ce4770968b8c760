//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the script route and optional debug routes
//! - Wire up middleware (request ID, tracing, timeout, authorization)
//! - Bind server to listener with graceful shutdown
//! - Forward authorized requests to the upstream

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    middleware,
    response::Response,
    routing::get,
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{Credentials, ProxyConfig};
use crate::debug;
use crate::http::middleware::authorization_middleware;
use crate::http::request::{request_id, MakeRequestUuid};
use crate::http::response::{self, ResponseShape};
use crate::security::{AuthorizationGate, Clock, GateError, SystemClock};
use crate::upstream::{ClientBuildError, UpstreamForwarder};

/// Path of the protected resource.
pub const SCRIPT_PATH: &str = "/obtener-script";

/// Errors assembling the server from configuration.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Upstream(#[from] ClientBuildError),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<AuthorizationGate>,
    pub forwarder: Arc<UpstreamForwarder>,
    pub shape: Arc<ResponseShape>,
    pub credentials: Arc<Credentials>,
}

/// HTTP server for the gate.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: ProxyConfig) -> Result<Self, ServerError> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a server whose signature freshness checks read `clock`.
    pub fn with_clock(config: ProxyConfig, clock: Arc<dyn Clock>) -> Result<Self, ServerError> {
        let credentials = Credentials::from_config(&config);
        let gate = AuthorizationGate::new(&config.gate, &credentials, clock)?;
        let forwarder = UpstreamForwarder::new(&config.upstream, &credentials)?;

        let state = AppState {
            gate: Arc::new(gate),
            forwarder: Arc::new(forwarder),
            shape: Arc::new(ResponseShape::from_config(&config.response)),
            credentials: Arc::new(credentials),
        };

        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ProxyConfig, state: AppState) -> Router {
        let mut routes = Router::new()
            .route(
            SCRIPT_PATH,
            get(obtain_script)
                .head(response::fallback)
                .fallback(response::fallback),
        );

        if config.debug.enabled {
            routes = routes.merge(debug::routes());
        }

        routes
            .route_layer(middleware::from_fn_with_state(
                state.gate.clone(),
                authorization_middleware,
            ))
            .fallback(response::fallback)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
            )
    }

    /// Run the server until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            route = SCRIPT_PATH,
            debug_routes = self.config.debug.enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// The assembled router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}

/// Forward an authorized request and shape the reply.
async fn obtain_script(State(state): State<AppState>, headers: axum::http::HeaderMap) -> Response {
    let request_id = request_id(&headers);

    match state.forwarder.fetch().await {
        Ok(outcome) => {
            tracing::info!(request_id = %request_id, outcome = outcome.label(), "Script request served");
            state.shape.render(outcome)
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, error = %e, "Script route misconfigured");
            response::misconfigured()
        }
    }
}
