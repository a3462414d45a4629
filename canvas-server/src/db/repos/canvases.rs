//! Canvas repository backed by PostgreSQL
//!
//! - upsert: INSERT ... ON CONFLICT (drawing_name) DO UPDATE
//! - list: index-backed scan on (email, created_at DESC)
//! - canvas data is bound as text and cast to `json` so key order is kept

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::db::{CanvasStore, StoreError};
use crate::models::{CanvasRecord, CanvasSummary, DrawingName, Email, Upserted};

/// Canvas store over a connection pool
#[derive(Debug, Clone)]
pub struct PgCanvasStore {
    pool: PgPool,
}

impl PgCanvasStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn record_from_row(row: &PgRow) -> CanvasRecord {
    CanvasRecord {
        id: row.get("id"),
        email: row.get("email"),
        drawing_name: row.get("drawing_name"),
        canvas_data: row.get("canvas_data"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl CanvasStore for PgCanvasStore {
    /// `xmax = 0` only holds for a freshly inserted tuple, which tells the
    /// caller whether the row was created or updated in the same round trip.
    async fn upsert(
        &self,
        email: &Email,
        name: &DrawingName,
        canvas_data: Value,
    ) -> Result<Upserted, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO canvases (id, email, drawing_name, canvas_data)
            VALUES ($1, $2, $3, $4::json)
            ON CONFLICT (drawing_name) DO UPDATE
            SET email = EXCLUDED.email,
                canvas_data = EXCLUDED.canvas_data
            RETURNING id, email, drawing_name, canvas_data, created_at, (xmax = 0) AS inserted
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(email.as_str())
        .bind(name.as_str())
        .bind(canvas_data.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(Upserted {
            record: record_from_row(&row),
            created: row.get("inserted"),
        })
    }

    async fn list_by_email(&self, email: &str) -> Result<Vec<CanvasSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT drawing_name, created_at
            FROM canvases
            WHERE email = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| CanvasSummary {
                drawing_name: r.get("drawing_name"),
                created_at: r.get("created_at"),
            })
            .collect())
    }

    async fn find(&self, email: &str, name: &str) -> Result<Option<CanvasRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, email, drawing_name, canvas_data, created_at
            FROM canvases
            WHERE email = $1 AND drawing_name = $2
            "#,
        )
        .bind(email)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(record_from_row))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        if self.pool.is_closed() {
            return Err(StoreError::Unavailable("pool is closed".into()));
        }

        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
