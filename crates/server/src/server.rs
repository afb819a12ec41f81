//! Server initialization and routing
//!
//! This module handles the Axum server setup including:
//! - Router configuration with all endpoints
//! - Middleware stack (logging, timeout, compression, etc.)
//! - Graceful shutdown handling

use crate::config::ServerConfig;
use crate::middleware::{log_requests, request_id};
use crate::routes::{api_info, not_found};
use crate::routes::{export, health, ingest, results};
use crate::state::ServerState;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::middleware::from_fn;
use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Build the Axum router with all routes and middleware
///
/// The delivery endpoint (`POST /ingest`) authenticates itself via the
/// webhook gate, so there is no bearer-auth middleware; operator-facing
/// routes under `/api/v1` are expected to sit behind the platform's own
/// access layer. The timeout returns a 5xx so the upstream gateway retries
/// a stalled delivery; the replay cache makes that retry idempotent.
pub fn build_router(state: Arc<ServerState>) -> Router {
    // CORS layer
    let cors = if state.config.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
    };

    Router::new()
        .route("/", get(api_info))
        .route("/health", get(health::health_check))
        .route("/ready", get(health::readiness_check))
        .route("/metrics", get(health::metrics))
        // Delivery ingestion
        .route("/ingest", post(ingest::ingest_message))
        // Export (reverse path)
        .route("/api/v1/export", post(export::export_results))
        // Review queue + admin reassignment
        .route("/api/v1/results/unassigned", get(results::list_unassigned))
        .route(
            "/api/v1/results/{result_id}/reassign",
            post(results::reassign_result),
        )
        // Metadata
        .route("/api/v1/metadata", get(health::server_metadata))
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(state.config.max_body_size()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::SERVICE_UNAVAILABLE,
            Duration::from_secs(state.config.timeout_secs),
        ))
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(from_fn(request_id))
        .layer(from_fn(log_requests))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the LDTflow HTTP server
///
/// Initializes the server with the provided configuration and starts
/// listening for deliveries. Blocks until shut down via SIGTERM or Ctrl+C.
pub async fn start_server(config: ServerConfig) -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(&config.log_level)
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .init();

    // Create server state
    let state = Arc::new(ServerState::new(config.clone())?);

    // Build router
    let app = build_router(state);

    // Parse bind address
    let addr: SocketAddr = config.socket_addr()?;

    tracing::info!("Starting LDTflow server on {}", addr);
    tracing::info!(
        "Timeout: {}s, Max body: {}MB, Rate limit: {} deliveries/minute",
        config.timeout_secs,
        config.max_body_size_mb,
        config.rate_limit_per_minute
    );
    tracing::info!(
        "Timestamp tolerance: {}s, Replay TTL: {}s",
        config.timestamp_tolerance_secs,
        config.replay_ttl_secs
    );

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}
