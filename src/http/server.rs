//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with a single catch-all handler
//! - Wire up middleware (tracing, timeouts, body limits, request ID)
//! - Own the session registry and reaper for the server's lifetime
//! - Serve until shutdown, then release every session

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::command::Services;
use crate::config::HubConfig;
use crate::driver::{DriverFactory, InMemoryDriverFactory};
use crate::http::dispatcher::Dispatcher;
use crate::http::request::IncomingRequest;
use crate::http::routes::build_route_tables;
use crate::routing::{RouteTables, TemplateError};
use crate::session::{SessionReaper, SessionRegistry};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub max_body_bytes: usize,
}

/// The command server.
pub struct HubServer {
    config: HubConfig,
    dispatcher: Arc<Dispatcher>,
    registry: SessionRegistry,
}

impl HubServer {
    /// Server with the default command table and simulated browsers.
    pub fn new(config: HubConfig) -> Result<Self, TemplateError> {
        Self::with_driver_factory(config, Arc::new(InMemoryDriverFactory::new()))
    }

    pub fn with_driver_factory(
        config: HubConfig,
        factory: Arc<dyn DriverFactory>,
    ) -> Result<Self, TemplateError> {
        Ok(Self::with_routes(config, factory, build_route_tables()?))
    }

    /// Server with caller-supplied tables, e.g. the defaults plus extra
    /// bindings. The tables are frozen from here on.
    pub fn with_routes(
        config: HubConfig,
        factory: Arc<dyn DriverFactory>,
        tables: RouteTables,
    ) -> Self {
        let registry = SessionRegistry::new(factory);
        let services = Services::new(registry.clone(), config.resources.static_dir.clone());
        let dispatcher = Arc::new(Dispatcher::new(
            tables,
            services,
            config.listener.base_path.clone(),
        ));
        Self {
            config,
            dispatcher,
            registry,
        }
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// The Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        let state = AppState {
            dispatcher: Arc::clone(&self.dispatcher),
            max_body_bytes: self.config.listener.max_body_bytes,
        };
        Router::new()
            .route("/{*path}", any(dispatch_handler))
            .route("/", any(dispatch_handler))
            .with_state(state)
            .layer(RequestBodyLimitLayer::new(self.config.listener.max_body_bytes))
            .layer(TimeoutLayer::new(Duration::from_secs(self.config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown");
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id,
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Serve on `listener` until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            base_path = %self.config.listener.base_path,
            "HTTP server starting"
        );

        let reaper = SessionReaper::new(self.registry.clone(), &self.config.session);
        reaper.start(shutdown.resubscribe());

        let served = axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        reaper.stop().await;
        let released = self.registry.clear().await;
        tracing::info!(released, "HTTP server stopped");
        served
    }
}

/// Hands every request to the dispatcher.
async fn dispatch_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read request body");
            return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
        }
    };

    let request = IncomingRequest::new(parts.method, &parts.uri, parts.headers, body);
    state.dispatcher.handle(&request).await
}
