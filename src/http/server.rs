//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with a catch-all dispatch handler
//! - Wire up middleware (tracing, timeout, concurrency limit, request ID)
//! - Dispatch request paths through the route registry
//! - Fall back to static files, then to 404 or echo
//! - Swap in a new registry when the config is reloaded

use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{header, Method, Request, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{FallbackMode, RouterConfig};
use crate::http::echo;
use crate::http::files::StaticFiles;
use crate::http::request::{
    decoded_path, propagate_request_id_layer, set_request_id_layer, RequestIdExt,
};
use crate::observability::metrics;
use crate::routing::{RouteRegistry, NOT_FOUND};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Everything a request needs; replaced as a whole on reload.
pub struct InnerState {
    pub registry: Arc<RouteRegistry>,
    pub fallback: FallbackMode,
    pub files: Option<StaticFiles>,
}

impl InnerState {
    /// Config routes layered over the code-registered `base` routes.
    pub fn build(config: &RouterConfig, base: &RouteRegistry) -> Self {
        let mut registry = base.clone();
        registry.register_config(&config.routes);
        Self {
            registry: Arc::new(registry),
            fallback: config.fallback.mode,
            files: StaticFiles::from_config(&config.files),
        }
    }
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub inner: Arc<ArcSwap<InnerState>>,
}

/// HTTP front for a route registry.
pub struct HttpServer {
    router: Router,
    config: RouterConfig,
    state: AppState,
    base: Arc<RouteRegistry>,
}

impl HttpServer {
    /// Create a server whose registry is built from `config.routes`.
    pub fn new(config: RouterConfig) -> Self {
        Self::with_registry(config, RouteRegistry::new())
    }

    /// Create a server around a registry built in code.
    ///
    /// `config.routes` are registered over `registry`, and again over the
    /// same `registry` on every reload, so code-registered handlers survive
    /// config changes unless a config route replaces their path.
    pub fn with_registry(config: RouterConfig, registry: RouteRegistry) -> Self {
        let inner = InnerState::build(&config, &registry);
        let state = AppState {
            inner: Arc::new(ArcSwap::from_pointee(inner)),
        };
        let router = Self::build_router(&config, state.clone());
        Self {
            router,
            config,
            state,
            base: Arc::new(registry),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, state: AppState) -> Router {
        Router::new()
            .route("/", any(dispatch_handler))
            .route("/{*path}", any(dispatch_handler))
            .with_state(state)
            .layer(GlobalConcurrencyLimitLayer::new(config.listener.max_connections))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = %req.request_id(),
                )
            }))
            .layer(propagate_request_id_layer())
            .layer(set_request_id_layer())
    }

    /// Router with all layers, for driving the server without a socket.
    pub fn app(&self) -> Router {
        self.router.clone()
    }

    /// The registry currently being served.
    pub fn registry(&self) -> Arc<RouteRegistry> {
        self.state.inner.load().registry.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Serve until `shutdown` fires. Each config received on
    /// `config_updates` replaces the served routes.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<RouterConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.registry().len(),
            "HTTP server starting"
        );

        let inner = self.state.inner.clone();
        let base = self.base.clone();
        let reloader = tokio::spawn(async move {
            while let Some(config) = config_updates.recv().await {
                let next = InnerState::build(&config, &base);
                tracing::info!(routes = next.registry.len(), "Routes reloaded");
                inner.store(Arc::new(next));
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Catch-all handler: registry, then static files, then fallback.
async fn dispatch_handler(State(state): State<AppState>, method: Method, uri: Uri) -> Response {
    let start_time = Instant::now();
    let inner = state.inner.load_full();
    let path = decoded_path(&uri);

    let response = if inner.registry.contains(&path) {
        let body = inner.registry.dispatch(&path);
        (StatusCode::OK, [(header::CONTENT_TYPE, TEXT_PLAIN)], body).into_response()
    } else {
        let file = match &inner.files {
            Some(files) => files.serve(&path).await,
            None => None,
        };
        match file {
            Some(response) => response,
            None => fallback_response(inner.fallback, &uri),
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response
}

fn fallback_response(mode: FallbackMode, uri: &Uri) -> Response {
    match mode {
        FallbackMode::NotFound => {
            tracing::debug!(path = %uri.path(), "No route matched");
            (
                StatusCode::NOT_FOUND,
                [(header::CONTENT_TYPE, TEXT_PLAIN)],
                NOT_FOUND,
            )
                .into_response()
        }
        FallbackMode::Echo => {
            let target = uri
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or_else(|| uri.path());
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, TEXT_PLAIN)],
                echo::describe(target),
            )
                .into_response()
        }
    }
}
