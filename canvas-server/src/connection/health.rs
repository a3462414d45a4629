//! Background liveness check
//!
//! Every interval: ping the cached handle if there is one, drop it if the
//! ping fails, and reconnect whenever the manager is not connected. Failures
//! are logged and retried on the next tick.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use super::{ConnectionManager, ConnectionState};

/// Default check interval
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(45);

/// Owns the running liveness task
#[derive(Debug)]
pub struct HealthCheckHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl HealthCheckHandle {
    /// Stop the task and wait for it to exit
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Health check task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl ConnectionManager {
    /// Spawn the periodic liveness check. The first check runs one full
    /// `every` after the call.
    pub fn spawn_health_check(&self, every: Duration) -> HealthCheckHandle {
        let (shutdown, mut stop) = watch::channel(false);
        let manager = self.clone();

        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => manager.check_liveness().await,
                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }
                }
            }

            tracing::debug!("Health check stopped");
        });

        HealthCheckHandle { shutdown, task }
    }

    /// Run one liveness check.
    pub async fn check_liveness(&self) {
        if let Some((attempt, handle)) = self.current() {
            match handle.ping().await {
                Ok(()) => {
                    tracing::trace!(attempt, "Database ping ok");
                    return;
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Database ping failed, dropping connection");
                    self.mark_disconnected(attempt);
                }
            }
        }

        if self.state() != ConnectionState::Connected {
            tracing::info!("Reconnecting...");
            if let Err(e) = self.acquire().await {
                tracing::error!(error = %e, "Reconnect attempt failed");
            }
        }
    }
}
