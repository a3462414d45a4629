//! Axum server setup
//!
//! Server skeleton with:
//! - Any-origin CORS by default, or an explicit origin list
//! - Tracing middleware
//! - JSON body limit sized for canvas payloads
//! - Graceful shutdown on SIGTERM/Ctrl+C, which also stops the liveness task

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::routes;
use crate::connection::{ConnectionManager, DEFAULT_HEALTH_INTERVAL};

/// Default request body limit (2 MiB)
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (default: 0.0.0.0:3000)
    pub bind_addr: SocketAddr,

    /// Allowed CORS origins; empty allows any origin
    pub cors_origins: Vec<String>,

    /// Maximum accepted request body, in bytes
    pub body_limit: usize,

    /// Interval of the background liveness check
    pub health_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            cors_origins: Vec::new(),
            body_limit: DEFAULT_BODY_LIMIT,
            health_interval: DEFAULT_HEALTH_INTERVAL,
        }
    }
}

/// Shared application state
#[derive(Debug)]
pub struct AppState {
    pub connections: ConnectionManager,
}

impl AppState {
    pub fn new(connections: ConnectionManager) -> Self {
        Self { connections }
    }
}

fn cors_layer(origins: &[String]) -> Result<CorsLayer, ServerError> {
    if origins.is_empty() {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let parsed = origins
        .iter()
        .map(|o| {
            o.parse::<HeaderValue>()
                .map_err(|_| ServerError::InvalidOrigin(o.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods(Any)
        .allow_headers(Any))
}

/// Build the application router.
pub fn build_router(state: Arc<AppState>, config: &ServerConfig) -> Result<Router, ServerError> {
    let cors = cors_layer(&config.cors_origins)?;

    Ok(Router::new()
        .merge(routes::health::router())
        .merge(routes::canvas::router(state.clone()))
        .layer(DefaultBodyLimit::max(config.body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Run the HTTP server.
///
/// Starts the first connection attempt and the liveness task, then serves
/// until a shutdown signal arrives. A database that is down at startup is
/// not fatal: requests fail with 500 until a reconnect succeeds.
///
/// # Example
///
/// ```ignore
/// let connector = Arc::new(PgConnector::new(database_url, PoolSettings::default()));
/// let manager = ConnectionManager::new(connector, Duration::from_secs(3));
/// run_server(manager, ServerConfig::default()).await?;
/// ```
pub async fn run_server(
    connections: ConnectionManager,
    config: ServerConfig,
) -> Result<(), ServerError> {
    let state = Arc::new(AppState::new(connections.clone()));
    let app = build_router(state, &config)?;

    // Bind listener
    let listener = TcpListener::bind(config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    connections.warm_up();
    let health = connections.spawn_health_check(config.health_interval);

    // Run with graceful shutdown
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    health.shutdown().await;
    served?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, starting shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting shutdown");
        }
    }
}

/// Server error type
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid CORS origin: {0}")]
    InvalidOrigin(String),
}
