//! Connectors - how the manager obtains a store handle

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::{ConnectionError, StoreHandle};
use crate::db::{create_pool_with_options, schema, MemoryCanvasStore, PgCanvasStore, PoolSettings};

/// Produces a fresh store handle
///
/// The manager bounds every call with its own timeout and never calls
/// `connect` concurrently with itself.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self) -> Result<StoreHandle, ConnectionError>;

    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;
}

/// Connects to PostgreSQL and bootstraps the canvases table
pub struct PgConnector {
    database_url: String,
    settings: PoolSettings,
}

impl PgConnector {
    pub fn new(database_url: impl Into<String>, settings: PoolSettings) -> Self {
        Self {
            database_url: database_url.into(),
            settings,
        }
    }
}

// Connection strings carry credentials; keep them out of Debug output.
impl fmt::Debug for PgConnector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgConnector")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self) -> Result<StoreHandle, ConnectionError> {
        let pool = create_pool_with_options(&self.database_url, self.settings).await?;
        schema::ensure(&pool).await?;
        Ok(Arc::new(PgCanvasStore::new(pool)))
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}

/// Hands out one shared in-memory store
#[derive(Default, Clone)]
pub struct MemoryConnector {
    store: Arc<MemoryCanvasStore>,
}

impl MemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing store, so callers can inspect it afterwards
    pub fn with_store(store: Arc<MemoryCanvasStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<MemoryCanvasStore> {
        &self.store
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self) -> Result<StoreHandle, ConnectionError> {
        Ok(self.store.clone())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
