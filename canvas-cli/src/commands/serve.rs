//! HTTP server command for the canvas API

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use canvas_server::connection::{ConnectionManager, MemoryConnector};
use canvas_server::http::server::DEFAULT_BODY_LIMIT;
use canvas_server::{run_server, ServerConfig};
use clap::Parser;

use super::DatabaseArgs;

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(long, short = 'p', env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Address to bind to
    #[arg(long, short = 'b', default_value = "0.0.0.0")]
    pub bind: IpAddr,

    #[command(flatten)]
    pub database: DatabaseArgs,

    /// Keep drawings in process memory instead of PostgreSQL (lost on exit)
    #[arg(long)]
    pub in_memory: bool,

    /// Seconds between background database liveness checks
    #[arg(long, default_value_t = 45)]
    pub health_interval_secs: u64,

    /// Allowed CORS origin (repeatable); any origin when omitted
    #[arg(long = "cors-origin", value_name = "ORIGIN")]
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes
    #[arg(long, default_value_t = DEFAULT_BODY_LIMIT)]
    pub body_limit: usize,
}

impl ServeArgs {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: SocketAddr::new(self.bind, self.port),
            cors_origins: self.cors_origins.clone(),
            body_limit: self.body_limit,
            health_interval: Duration::from_secs(self.health_interval_secs),
        }
    }

    fn connection_manager(&self) -> Result<ConnectionManager> {
        if self.in_memory {
            if self.database.database_url.is_some() {
                tracing::warn!("--in-memory set; ignoring DATABASE_URL");
            }
            return Ok(ConnectionManager::new(
                Arc::new(MemoryConnector::new()),
                self.database.connect_timeout(),
            ));
        }

        self.database.postgres_manager()
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let connections = args.connection_manager()?;
    let config = args.server_config();

    tracing::info!(
        backend = connections.backend(),
        health_interval_secs = args.health_interval_secs,
        "Starting canvas server on {}",
        config.bind_addr
    );

    // Run server (blocks until shutdown)
    run_server(connections, config)
        .await
        .context("Server error")?;

    Ok(())
}
