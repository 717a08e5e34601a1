//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (login throttle, metrics, timeout, request ID, tracing)
//! - Forward requests to the upstream application
//! - Apply configuration updates without restarting
//! - Serve until the shutdown signal fires

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use arc_swap::ArcSwap;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GateConfig;
use crate::http::middleware::{metrics_middleware, rate_limit_middleware};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::security::rate_limit::FixedWindowRateLimiter;

/// Configuration together with the limiter built from it.
pub struct GateState {
    pub config: GateConfig,
    pub limiter: Arc<Mutex<FixedWindowRateLimiter>>,
}

impl GateState {
    pub fn new(config: GateConfig) -> Self {
        let limiter = FixedWindowRateLimiter::new(config.rate_limit.limiter_options());
        Self {
            config,
            limiter: Arc::new(Mutex::new(limiter)),
        }
    }

    /// Build the state for `config`, keeping the current limiter (and its
    /// counters) when the limiter parameters did not change.
    pub fn reload(&self, config: GateConfig) -> Self {
        if config.rate_limit.limiter_options() == self.config.rate_limit.limiter_options() {
            Self {
                config,
                limiter: self.limiter.clone(),
            }
        } else {
            Self::new(config)
        }
    }

    /// Number of clients the limiter currently tracks.
    pub fn tracked_clients(&self) -> usize {
        self.limiter.lock().expect("rate limiter mutex poisoned").size()
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<GateState>>,
    pub client: Client<HttpConnector, Body>,
}

impl AppState {
    pub fn new(config: GateConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            inner: Arc::new(ArcSwap::from_pointee(GateState::new(config))),
            client,
        }
    }

    /// Swap in a new configuration.
    pub fn apply_config(&self, config: GateConfig) {
        let next = self.inner.load().reload(config);
        self.inner.store(Arc::new(next));
    }
}

/// HTTP server for the login gate.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: GateConfig) -> Self {
        let state = AppState::new(config.clone());
        let router = Self::build_router(&config, state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &GateConfig, state: AppState) -> Router {
        Router::new()
            .route("/healthz", get(health_handler))
            .fallback(proxy_handler)
            .layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(middleware::from_fn(metrics_middleware))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<GateConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let reload_state = self.state.clone();
        tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                reload_state.apply_config(config);
                tracing::info!("Configuration reloaded");
            }
        });

        let app = self.router.into_make_service();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub version: &'static str,
    pub limiter_keys: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        limiter_keys: state.inner.load().tracked_clients(),
    })
}

/// Forward a request to the upstream application unchanged.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let request_id = request_id(&request);
    let method = request.method().to_string();
    let upstream = state.inner.load().config.upstream.address.clone();

    let (mut parts, body) = request.into_parts();
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    parts.uri = match format!("http://{upstream}{path_and_query}").parse::<Uri>() {
        Ok(uri) => uri,
        Err(e) => {
            tracing::error!(request_id = %request_id, upstream = %upstream, error = %e, "Invalid upstream URI");
            return (StatusCode::BAD_GATEWAY, "Invalid upstream address").into_response();
        }
    };

    tracing::debug!(request_id = %request_id, method = %method, uri = %parts.uri, "Proxying request");

    match state.client.request(Request::from_parts(parts, body)).await {
        Ok(response) => {
            let (parts, body): (_, hyper::body::Incoming) = response.into_parts();
            Response::from_parts(parts, Body::new(body))
        }
        Err(e) => {
            tracing::error!(request_id = %request_id, upstream = %upstream, error = %e, "Upstream error");
            (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
        }
    }
}
