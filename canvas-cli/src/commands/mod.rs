//! Command implementations for canvasctl

pub mod ping;
pub mod serve;

pub use ping::{run_ping, PingArgs};
pub use serve::{run_serve, ServeArgs};

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use canvas_server::connection::{ConnectionManager, PgConnector};
use canvas_server::db::PoolSettings;
use clap::Args;

/// Database connection flags shared by `serve` and `ping`
#[derive(Args, Debug, Clone)]
pub struct DatabaseArgs {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Seconds to wait for the database before a connection attempt fails
    #[arg(long, default_value_t = 3)]
    pub connect_timeout_secs: u64,

    /// Maximum pooled connections
    #[arg(long, default_value_t = 5)]
    pub max_connections: u32,
}

impl DatabaseArgs {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Connection manager for the configured PostgreSQL database
    pub fn postgres_manager(&self) -> Result<ConnectionManager> {
        let database_url = self
            .database_url
            .clone()
            .context("DATABASE_URL not set. Set via --database-url, DATABASE_URL env, or .env")?;

        let settings = PoolSettings {
            max_connections: self.max_connections,
            connect_timeout: self.connect_timeout(),
        };

        Ok(ConnectionManager::new(
            Arc::new(PgConnector::new(database_url, settings)),
            self.connect_timeout(),
        ))
    }
}
