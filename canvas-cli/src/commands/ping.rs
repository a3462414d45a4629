//! Database reachability check

use anyhow::{anyhow, Result};
use clap::Parser;

use super::DatabaseArgs;

/// Arguments for the ping command
#[derive(Parser, Debug)]
pub struct PingArgs {
    #[command(flatten)]
    pub database: DatabaseArgs,
}

/// Connect once, round-trip a query, and report the outcome
pub async fn run_ping(args: PingArgs) -> Result<()> {
    let connections = args.database.postgres_manager()?;

    let store = match connections.acquire().await {
        Ok(store) => store,
        Err(err) => {
            println!("❌ Database unreachable: {err}");
            return Err(anyhow!(err).context("ping failed"));
        }
    };

    match store.ping().await {
        Ok(()) => {
            println!(
                "✅ Database reachable ({} backend, timeout {}s)",
                connections.backend(),
                connections.connect_timeout().as_secs()
            );
            Ok(())
        }
        Err(err) => {
            println!("❌ Database connected but query failed: {err}");
            Err(anyhow!(err).context("ping failed"))
        }
    }
}
