//! HTTP server layer
//!
//! Axum server with:
//! - Connection guard in front of every canvas route
//! - CORS (any origin unless configured)
//! - Request tracing
//! - Graceful shutdown
//! - JSON error responses

pub mod error;
pub mod extractors;
pub mod routes;
pub mod server;

pub use error::ApiError;
pub use server::{build_router, run_server, AppState, ServerConfig, ServerError};
