//! Connection manager - one lazily established, memoized store handle
//!
//! The manager moves between three states:
//!
//! - `Disconnected`: no handle, no attempt running
//! - `Connecting`: exactly one attempt in flight; every caller of
//!   [`ConnectionManager::acquire`] awaits that same attempt
//! - `Connected`: handle cached and handed out without touching the backend
//!
//! A failed attempt drops back to `Disconnected` so the next caller retries.
//! The background liveness check in [`health`] demotes a `Connected` handle
//! that stops answering pings.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;

use crate::db::{CanvasStore, StoreError};

pub mod connectors;
pub mod health;

pub use connectors::{Connector, MemoryConnector, PgConnector};
pub use health::{HealthCheckHandle, DEFAULT_HEALTH_INTERVAL};

/// Shared handle to the record store
pub type StoreHandle = Arc<dyn CanvasStore>;

type PendingConnect = Shared<BoxFuture<'static, Result<StoreHandle, ConnectionError>>>;

/// Connection error type
///
/// `Clone` because every caller sharing an attempt receives the same outcome.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnectionError {
    #[error("timed out after {}ms waiting for the database", .after.as_millis())]
    Timeout { after: Duration },

    #[error("connection failed: {0}")]
    Failed(String),
}

impl From<sqlx::Error> for ConnectionError {
    fn from(e: sqlx::Error) -> Self {
        Self::Failed(e.to_string())
    }
}

impl From<StoreError> for ConnectionError {
    fn from(e: StoreError) -> Self {
        Self::Failed(e.to_string())
    }
}

/// Observable connection state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
        };
        f.write_str(s)
    }
}

enum Slot {
    Disconnected,
    Connecting { attempt: u64, pending: PendingConnect },
    Connected { attempt: u64, handle: StoreHandle },
}

struct Inner {
    connector: Arc<dyn Connector>,
    connect_timeout: Duration,
    slot: Mutex<Slot>,
    attempts: AtomicU64,
}

impl Inner {
    fn lock_slot(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Process-scoped owner of the store connection
///
/// Cheap to clone; all clones share the same cached handle.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    /// Create a manager. Nothing connects until [`acquire`](Self::acquire)
    /// or [`warm_up`](Self::warm_up) is called.
    pub fn new(connector: Arc<dyn Connector>, connect_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                connector,
                connect_timeout,
                slot: Mutex::new(Slot::Disconnected),
                attempts: AtomicU64::new(0),
            }),
        }
    }

    /// Return the cached handle, joining or starting a connection attempt
    /// if there is none.
    pub async fn acquire(&self) -> Result<StoreHandle, ConnectionError> {
        let pending = {
            let mut slot = self.inner.lock_slot();
            let in_flight = match &*slot {
                Slot::Connected { handle, .. } => return Ok(Arc::clone(handle)),
                Slot::Connecting { pending, .. } => Some(pending.clone()),
                Slot::Disconnected => None,
            };
            match in_flight {
                Some(pending) => pending,
                None => self.start_attempt(&mut slot),
            }
        };

        pending.await
    }

    /// Kick off a connection attempt without waiting for it.
    ///
    /// Used at startup; the outcome is logged by the attempt itself.
    pub fn warm_up(&self) {
        let mut slot = self.inner.lock_slot();
        if matches!(&*slot, Slot::Disconnected) {
            drop(self.start_attempt(&mut slot));
        }
    }

    /// Current state, without side effects
    pub fn state(&self) -> ConnectionState {
        match &*self.inner.lock_slot() {
            Slot::Disconnected => ConnectionState::Disconnected,
            Slot::Connecting { .. } => ConnectionState::Connecting,
            Slot::Connected { .. } => ConnectionState::Connected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Number of connection attempts started since creation
    pub fn attempts(&self) -> u64 {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Backend name of the underlying connector
    pub fn backend(&self) -> &'static str {
        self.inner.connector.backend()
    }

    pub fn connect_timeout(&self) -> Duration {
        self.inner.connect_timeout
    }

    /// Cached handle and the attempt that produced it, if connected
    fn current(&self) -> Option<(u64, StoreHandle)> {
        match &*self.inner.lock_slot() {
            Slot::Connected { attempt, handle } => Some((*attempt, Arc::clone(handle))),
            _ => None,
        }
    }

    /// Drop the cached handle produced by `attempt`.
    ///
    /// A newer handle, or an attempt already in flight, is left alone.
    fn mark_disconnected(&self, attempt: u64) {
        let mut slot = self.inner.lock_slot();
        if matches!(&*slot, Slot::Connected { attempt: a, .. } if *a == attempt) {
            *slot = Slot::Disconnected;
        }
    }

    /// Spawn a connection attempt and park it in `slot`.
    ///
    /// The attempt runs as its own task so it completes (and updates the
    /// state) even if every caller waiting on it goes away.
    fn start_attempt(&self, slot: &mut MutexGuard<'_, Slot>) -> PendingConnect {
        let attempt = self.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let inner = Arc::clone(&self.inner);

        let task = tokio::spawn(async move {
            tracing::debug!(attempt, backend = inner.connector.backend(), "Connecting to database");

            let result =
                match tokio::time::timeout(inner.connect_timeout, inner.connector.connect()).await {
                    Ok(result) => result,
                    Err(_) => Err(ConnectionError::Timeout {
                        after: inner.connect_timeout,
                    }),
                };

            let mut slot = inner.lock_slot();
            let current = matches!(&*slot, Slot::Connecting { attempt: a, .. } if *a == attempt);

            match &result {
                Ok(handle) => {
                    tracing::info!(attempt, backend = inner.connector.backend(), "Database connected");
                    if current {
                        *slot = Slot::Connected {
                            attempt,
                            handle: Arc::clone(handle),
                        };
                    }
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Database connection attempt failed");
                    if current {
                        *slot = Slot::Disconnected;
                    }
                }
            }

            result
        });

        let pending = async move {
            task.await.unwrap_or_else(|e| {
                Err(ConnectionError::Failed(format!(
                    "connection task ended unexpectedly: {}",
                    e
                )))
            })
        }
        .boxed()
        .shared();

        **slot = Slot::Connecting {
            attempt,
            pending: pending.clone(),
        };

        pending
    }
}

impl fmt::Debug for ConnectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("backend", &self.backend())
            .field("state", &self.state())
            .field("attempts", &self.attempts())
            .finish()
    }
}
