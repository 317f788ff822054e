//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (tracing, limits, request ID, rate limits, headers)
//! - Bind server to listener
//! - Apply hot-reloaded configuration
//! - Graceful shutdown on the lifecycle broadcast

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{MatchedPath, State},
    http::Request,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::setup_admin_router;
use crate::config::RegistryConfig;
use crate::http::request::{make_request_span, propagate_request_id_layer, set_request_id_layer};
use crate::http::{event, gifts, pix};
use crate::observability::metrics;
use crate::registry::RegistryBackend;
use crate::security::headers::apply_security_headers;
use crate::security::limits::apply_body_limit;
use crate::security::rate_limit::{rate_limit_middleware, RateLimiterState};

/// Buckets idle this long are dropped by the background pruner.
const RATE_LIMIT_IDLE: Duration = Duration::from_secs(600);

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Live configuration, swapped on reload.
    pub config: Arc<ArcSwap<RegistryConfig>>,
    pub backend: Arc<dyn RegistryBackend>,
    pub rate_limiter: Arc<RateLimiterState>,
}

impl AppState {
    pub fn new(config: RegistryConfig, backend: Arc<dyn RegistryBackend>) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            backend,
            rate_limiter: Arc::new(RateLimiterState::new()),
        }
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> Arc<RegistryConfig> {
        self.config.load_full()
    }

    /// Install a reloaded configuration. Settings read at startup only are
    /// reported and left as they were.
    pub fn apply_config(&self, new_config: RegistryConfig) {
        for setting in restart_required(&self.config.load(), &new_config) {
            tracing::warn!(setting, "Setting changed; restart required to apply");
        }
        self.config.store(Arc::new(new_config));
        tracing::info!("Configuration reloaded");
    }
}

/// Settings that differ between `current` and `new` but only take effect on
/// startup: the listener, the router layers and the backend client.
pub fn restart_required(current: &RegistryConfig, new: &RegistryConfig) -> Vec<&'static str> {
    let mut changed = Vec::new();
    if current.listener.bind_address != new.listener.bind_address {
        changed.push("listener.bind_address");
    }
    if current.timeouts.request_secs != new.timeouts.request_secs {
        changed.push("timeouts.request_secs");
    }
    if current.security.enable_headers != new.security.enable_headers {
        changed.push("security.enable_headers");
    }
    if current.security.max_body_size != new.security.max_body_size {
        changed.push("security.max_body_size");
    }
    if current.admin.enabled != new.admin.enabled {
        changed.push("admin.enabled");
    }
    if current.backend.kind != new.backend.kind || current.backend.url != new.backend.url {
        changed.push("backend");
    }
    if current.backend.admin_secret != new.backend.admin_secret {
        changed.push("backend.admin_secret");
    }
    changed
}

/// HTTP server for the gift registry.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and backend.
    pub fn new(config: RegistryConfig, backend: Arc<dyn RegistryBackend>) -> Self {
        let state = AppState::new(config, backend);
        let router = Self::build_router(&state.config(), state.clone());
        Self { router, state }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RegistryConfig, state: AppState) -> Router {
        let guest_mutations = Router::new()
            .route(
                "/api/v1/gifts/{id}/reservations",
                post(gifts::reserve_gift).delete(gifts::cancel_reservation),
            )
            .route("/api/v1/pix/contributions", post(pix::create_contribution))
            .route("/api/v1/rsvps", post(event::create_rsvp))
            .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit_middleware));

        let mut router = Router::new()
            .route("/health", get(health))
            .route("/api/v1/gifts", get(gifts::list_gifts))
            .route("/api/v1/gifts/{id}", get(gifts::get_gift))
            .route("/api/v1/categories", get(gifts::list_categories))
            .route("/api/v1/pix/payload", get(pix::get_payload))
            .route("/api/v1/pix/decode", post(pix::decode_payload))
            .route("/api/v1/event", get(event::get_event))
            .merge(guest_mutations);

        if config.admin.enabled {
            router = router.merge(setup_admin_router(state.clone()));
        }

        let router = router
            .route_layer(middleware::from_fn(track_metrics))
            .with_state(state);

        let router = apply_body_limit(router, config.security.max_body_size);
        let router = if config.security.enable_headers {
            apply_security_headers(router)
        } else {
            router
        };

        router.layer(
            ServiceBuilder::new()
                .layer(set_request_id_layer())
                .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
                .layer(propagate_request_id_layer())
                .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs))),
        )
    }

    /// Shared state, for tests and embedding.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires. Configs received on `config_updates` are applied live.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<RegistryConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            backend = self.state.backend.name(),
            "HTTP server starting"
        );

        let reload_state = self.state.clone();
        tokio::spawn(async move {
            while let Some(new_config) = config_updates.recv().await {
                reload_state.apply_config(new_config);
            }
        });

        let limiter = self.state.rate_limiter.clone();
        let mut pruner_shutdown = shutdown.resubscribe();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(RATE_LIMIT_IDLE);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let pruned = limiter.prune(RATE_LIMIT_IDLE);
                        if pruned > 0 {
                            tracing::debug!(pruned, "Pruned idle rate limit buckets");
                        }
                    }
                    _ = pruner_shutdown.recv() => break,
                }
            }
        });

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    backend: &'static str,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    Json(Health {
        status: "ok",
        backend: state.backend.name(),
    })
}

async fn track_metrics(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    metrics::record_request(&method, &route, response.status().as_u16(), start);
    response
}
