//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID, headers)
//! - Route `GET /` through the bucket router (HEAD included)
//! - Serve bucket pages and the reset action
//! - Bind server to listener and stop on the shutdown signal

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Map;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{set_header::SetResponseHeaderLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::decision::{DecisionContext, DecisionGateway, FlushHandle};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::identity::{cookie_value, VisitorId};
use crate::pages::{pages_router, PageStore};
use crate::routing::{BucketRouter, RequestSignals};

/// Event logged when a visitor asks for a new bucket.
pub const RESET_EVENT: &str = "reset-bucket";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub router: Arc<BucketRouter>,
    pub pages: Router,
    pub flush: FlushHandle,
    pub config: Arc<AppConfig>,
}

/// HTTP server for the edge bucket router.
pub struct HttpServer {
    app: Router,
    config: Arc<AppConfig>,
}

impl HttpServer {
    /// Create a new HTTP server from its collaborators.
    pub fn new(
        config: Arc<AppConfig>,
        gateway: Arc<DecisionGateway>,
        store: Arc<PageStore>,
        flush: FlushHandle,
    ) -> Self {
        let router = Arc::new(BucketRouter::new(gateway, config.clone()));
        let pages = pages_router(store, config.experiment.clone());

        let state = AppState {
            router,
            pages,
            flush,
            config: config.clone(),
        };

        let app = Self::build_router(&config, state);
        Self { app, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let pages = state.pages.clone();

        Router::new()
            .route("/", get(route_root))
            .route("/reset", post(reset_bucket))
            .route("/healthz", get(health))
            .fallback_service(pages)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(SetResponseHeaderLayer::if_not_present(
                header::X_CONTENT_TYPE_OPTIONS,
                HeaderValue::from_static("nosniff"),
            ))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id(req.headers()),
                )
            }))
            .layer(set_request_id_layer())
    }

    /// The complete application, for embedding or in-process testing.
    pub fn app(&self) -> Router {
        self.app.clone()
    }

    /// Run the server, accepting connections until shutdown is signalled.
    pub async fn run(self, listener: TcpListener, mut shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            experiment = %self.config.experiment.name,
            tier = self.config.deployment.tier.as_str(),
            "HTTP server starting"
        );

        axum::serve(listener, self.app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Site root: classify the visitor and redirect or rewrite to their bucket.
async fn route_root(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let (parts, body) = request.into_parts();

    let outcome = state.router.route(&parts).await;
    let action = outcome.action.label();
    let bucket = outcome.bucket.clone();

    let request = Request::from_parts(parts, body);
    let response = outcome
        .into_response(request, state.pages.clone(), state.router.cookie())
        .await;

    // Exposure events go out in the background; the response is already built.
    state.flush.schedule();

    tracing::info!(
        action,
        bucket = %bucket,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Routed request"
    );
    response
}

/// Forget the visitor's identity so the next visit gets a fresh assignment.
async fn reset_bucket(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let cookie = state.router.cookie();

    let current = cookie_value(&headers, cookie.name()).and_then(|v| VisitorId::from_trusted(&v));
    if let Some(id) = current {
        let signals = RequestSignals::from_headers(&headers, &state.config.geo, cookie.name());
        let context = DecisionContext::new(&id, signals.country, signals.ip, state.config.deployment.tier);

        match state.router.gateway().log_event(&context, RESET_EVENT, Map::new()).await {
            Ok(()) => state.flush.schedule(),
            Err(e) => tracing::warn!(error = %e, "Failed to log reset event"),
        }
    }

    (
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, HeaderValue::from_static("/")),
            (header::SET_COOKIE, cookie.expire()),
            (header::CACHE_CONTROL, HeaderValue::from_static("private, no-store")),
        ],
    )
        .into_response()
}

#[derive(Serialize)]
struct HealthStatus {
    status: &'static str,
    version: &'static str,
    decision_initialized: bool,
}

async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        decision_initialized: state.router.gateway().is_initialized(),
    })
}
