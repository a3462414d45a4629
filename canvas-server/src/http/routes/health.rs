//! Liveness and health endpoints
//!
//! Both only read the connection state. Neither forces a connection attempt.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

use crate::connection::ConnectionState;
use crate::http::server::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: DatabaseHealth,
}

#[derive(Debug, Serialize)]
pub struct DatabaseHealth {
    pub backend: &'static str,
    pub state: ConnectionState,
}

/// GET / - plain-text liveness
async fn liveness(State(state): State<Arc<AppState>>) -> &'static str {
    if state.connections.is_connected() {
        "API connected to database"
    } else {
        "Connection pending"
    }
}

/// GET /health
async fn health(State(state): State<Arc<AppState>>) -> (StatusCode, Json<HealthResponse>) {
    let connection = state.connections.state();
    let (status_code, status) = match connection {
        ConnectionState::Connected => (StatusCode::OK, "ok"),
        _ => (StatusCode::SERVICE_UNAVAILABLE, "degraded"),
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database: DatabaseHealth {
                backend: state.connections.backend(),
                state: connection,
            },
        }),
    )
}

/// Health routes
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(liveness))
        .route("/health", get(health))
}
