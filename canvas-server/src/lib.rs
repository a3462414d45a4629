//! canvas-server: persistence API for named canvas drawings
//!
//! Upsert, list-by-owner and fetch-by-name over a single collection of
//! drawing records, served over HTTP. The store connection is established
//! lazily, memoized for the life of the process, and health-checked in the
//! background.

pub mod connection;
pub mod db;
pub mod http;
pub mod models;

pub use connection::{ConnectionError, ConnectionManager, ConnectionState};
pub use db::{CanvasStore, StoreError};
pub use http::{build_router, run_server, AppState, ServerConfig, ServerError};
