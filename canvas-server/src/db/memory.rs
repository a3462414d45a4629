//! In-memory canvas store
//!
//! Same semantics as the PostgreSQL store, kept in a map keyed by drawing
//! name. Backs `--in-memory` local runs and the router tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CanvasStore, StoreError};
use crate::models::{CanvasRecord, CanvasSummary, DrawingName, Email, Upserted};

struct Entry {
    record: CanvasRecord,
    /// Insertion order, breaks `created_at` ties in listings
    seq: u64,
}

#[derive(Default)]
struct Inner {
    records: HashMap<String, Entry>,
    next_seq: u64,
}

/// Canvas store held entirely in process memory
#[derive(Default)]
pub struct MemoryCanvasStore {
    inner: RwLock<Inner>,
    offline: AtomicBool,
}

impl MemoryCanvasStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored drawings
    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Make every operation fail with [`StoreError::Unavailable`], or undo it.
    ///
    /// Lets tests exercise the store-failure paths of the router and the
    /// reconnect path of the liveness check.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store is offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl CanvasStore for MemoryCanvasStore {
    async fn upsert(
        &self,
        email: &Email,
        name: &DrawingName,
        canvas_data: Value,
    ) -> Result<Upserted, StoreError> {
        self.check_online()?;

        let mut inner = self.inner.write().await;

        if let Some(entry) = inner.records.get_mut(name.as_str()) {
            entry.record.email = email.as_str().to_owned();
            entry.record.canvas_data = canvas_data;
            return Ok(Upserted {
                record: entry.record.clone(),
                created: false,
            });
        }

        let record = CanvasRecord {
            id: Uuid::new_v4(),
            email: email.as_str().to_owned(),
            drawing_name: name.as_str().to_owned(),
            canvas_data,
            created_at: Utc::now(),
        };
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.records.insert(
            name.as_str().to_owned(),
            Entry {
                record: record.clone(),
                seq,
            },
        );

        Ok(Upserted {
            record,
            created: true,
        })
    }

    async fn list_by_email(&self, email: &str) -> Result<Vec<CanvasSummary>, StoreError> {
        self.check_online()?;

        let inner = self.inner.read().await;
        let mut owned: Vec<&Entry> = inner
            .records
            .values()
            .filter(|e| e.record.email == email)
            .collect();

        owned.sort_by(|a, b| {
            b.record
                .created_at
                .cmp(&a.record.created_at)
                .then(b.seq.cmp(&a.seq))
        });

        Ok(owned
            .into_iter()
            .map(|e| CanvasSummary::from(&e.record))
            .collect())
    }

    async fn find(&self, email: &str, name: &str) -> Result<Option<CanvasRecord>, StoreError> {
        self.check_online()?;

        let inner = self.inner.read().await;
        Ok(inner
            .records
            .get(name)
            .filter(|e| e.record.email == email)
            .map(|e| e.record.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }
}
