//! Schema bootstrap for the canvases table
//!
//! Idempotent: every statement is `IF NOT EXISTS`, so it runs on every
//! (re)connect.
//!
//! `canvas_data` is `JSON`, not `JSONB`: the text is stored as sent, so key
//! order and duplicate keys survive the round trip.

use sqlx::PgPool;

use super::StoreError;

/// Create the canvases table and its indexes if missing
pub async fn ensure(pool: &PgPool) -> Result<(), StoreError> {
    tracing::debug!("Ensuring canvases schema");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS canvases (
            id UUID PRIMARY KEY,
            email TEXT NOT NULL,
            drawing_name TEXT NOT NULL UNIQUE,
            canvas_data JSON NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_canvases_email_created
            ON canvases (email, created_at DESC)
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
