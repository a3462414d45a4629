//! Record store - connection pool, schema bootstrap and store implementations
//!
//! # Design Principles
//!
//! - One store trait, handed out as `Arc<dyn CanvasStore>` by the connection manager
//! - Upsert is a single statement keyed on the unique drawing name - no check-then-insert
//! - `created_at` and `id` are written once, never by the update path

use async_trait::async_trait;
use serde_json::Value;

use crate::models::{CanvasRecord, CanvasSummary, DrawingName, Email, Upserted};

pub mod memory;
pub mod pool;
pub mod repos;
pub mod schema;

pub use memory::MemoryCanvasStore;
pub use pool::{create_pool, create_pool_with_options, PoolSettings};
pub use repos::PgCanvasStore;

/// Store error type
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence operations over the drawing collection
#[async_trait]
pub trait CanvasStore: Send + Sync {
    /// Create the record for `name`, or replace its email and canvas data.
    async fn upsert(
        &self,
        email: &Email,
        name: &DrawingName,
        canvas_data: Value,
    ) -> Result<Upserted, StoreError>;

    /// All drawings owned by `email`, newest first.
    async fn list_by_email(&self, email: &str) -> Result<Vec<CanvasSummary>, StoreError>;

    /// The drawing matching both owner and name.
    async fn find(&self, email: &str, name: &str) -> Result<Option<CanvasRecord>, StoreError>;

    /// Cheap round trip used by the background liveness check.
    async fn ping(&self) -> Result<(), StoreError>;
}
