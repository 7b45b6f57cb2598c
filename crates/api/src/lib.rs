//! Transaction Ingestion API
//!
//! REST service that validates incoming transaction payloads, assigns ids
//! and timestamps, keeps a short per-user audit list, and forwards each
//! record onto the transaction stream.

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use event_stream::StreamPublisher;
use serde::Serialize;
use state_store::MemoryStateStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod rate_limit;
mod routes;

pub use self::config::{ApiConfig, ConfigurationError};
pub use self::rate_limit::RateLimitConfig;

/// Application state shared across handlers
pub struct AppState {
    /// Per-user recent-transactions audit storage
    pub store: MemoryStateStore,
    /// Producer for the transaction stream
    pub publisher: StreamPublisher,
    /// Bound on each user's audit list
    pub audit_capacity: usize,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub metrics: SystemMetrics,
}

/// System metrics
#[derive(Debug, Serialize)]
pub struct SystemMetrics {
    pub tracked_users: usize,
}

/// Create the application router
pub fn create_router(state: Arc<AppState>, rate_limit: &RateLimitConfig) -> Router {
    let governor = rate_limit::create_governor_config(rate_limit);

    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/transactions", post(routes::transactions::create))
        .route(
            "/api/v1/transactions/recent",
            get(routes::transactions::recent),
        )
        .layer(GovernorLayer { config: governor })
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        metrics: SystemMetrics {
            tracked_users: state.store.user_count(),
        },
    })
}

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Run the server
pub async fn run_server(config: ApiConfig) -> anyhow::Result<()> {
    let publisher = StreamPublisher::connect(&config.stream).await?;

    let state = Arc::new(AppState {
        store: MemoryStateStore::new(config.max_tracked_users),
        publisher,
        audit_capacity: config.audit_capacity,
        version: env!("CARGO_PKG_VERSION").to_string(),
        start_time: std::time::Instant::now(),
    });
    let app = create_router(state, &config.rate_limit);

    info!("Transaction API listening on {}", config.listen_addr);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
