//! HTTP server implementation using Axum.

use crate::auth::TokenRegistry;
use crate::handlers::{add_medication, health, list_medications, remove_medication, search_drugs};
use axum::routing::get;
use axum::Router;
use rxlist_core::config::ServerConfig;
use rxlist_core::{CacheBackend, DrugService, MedicationList, RateLimitStore, RateLimiter};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Application state shared across handlers.
pub struct AppState {
    /// Cached RxNorm lookups
    pub drugs: DrugService,
    /// Per-user medication lists
    pub medications: MedicationList,
    /// Limits `/drugs/search` per client address
    pub search_limiter: RateLimiter,
    /// Bearer tokens accepted on the medication routes
    pub tokens: TokenRegistry,
}

/// Build the application router.
///
/// Handlers read the client address from `ConnectInfo<SocketAddr>`; serve
/// the router with `into_make_service_with_connect_info`.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/drugs/search", get(search_drugs))
        .route(
            "/medications",
            get(list_medications)
                .post(add_medication)
                .delete(remove_medication),
        )
        .layer(TimeoutLayer::new(ServerConfig::REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server.
///
/// Returns the actual address the server is bound to (useful when port=0).
pub async fn start_server(state: Arc<AppState>, host: &str, port: u16) -> anyhow::Result<SocketAddr> {
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    info!("Server listening on {}", actual_addr);

    tokio::spawn(async move {
        let service = app.into_make_service_with_connect_info::<SocketAddr>();
        if let Err(e) = axum::serve(listener, service).await {
            error!("Server error: {}", e);
        }
    });

    Ok(actual_addr)
}

/// Periodically delete expired cache entries and rate limit windows.
///
/// Rows are otherwise only reclaimed when their key is touched again or on
/// the stores' write-count sweeps, which never fire on an idle server.
pub fn spawn_expiry_sweep(
    cache: Arc<dyn CacheBackend>,
    rates: Arc<dyn RateLimitStore>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticks = tokio::time::interval(period);
        loop {
            ticks.tick().await;
            match cache.cleanup_expired() {
                Ok(removed) => debug!("Expiry sweep removed {} cache entries", removed),
                Err(e) => warn!("Cache expiry sweep failed: {}", e),
            }
            match rates.cleanup_expired() {
                Ok(removed) => debug!("Expiry sweep removed {} rate limit windows", removed),
                Err(e) => warn!("Rate limit expiry sweep failed: {}", e),
            }
        }
    })
}
