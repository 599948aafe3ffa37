//! PostgreSQL implementation of the click store.
//!
//! Expects a `urls` table managed outside this crate:
//!
//! ```sql
//! CREATE TABLE urls (
//!     id            BIGSERIAL PRIMARY KEY,
//!     short_id      TEXT NOT NULL UNIQUE,
//!     original_url  TEXT NOT NULL,
//!     total_clicks  BIGINT NOT NULL DEFAULT 0,
//!     unique_clicks BIGINT NOT NULL DEFAULT 0,
//!     created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use std::sync::Arc;

use crate::domain::click_delta::PendingDelta;
use crate::domain::entities::UrlRecord;
use crate::domain::repositories::ClickStore;
use crate::error::StoreError;

/// PostgreSQL click store.
///
/// A batch of deltas is applied inside one transaction, so either every
/// counter in the batch moves or none does.
pub struct PgClickStore {
    pool: Arc<PgPool>,
}

impl PgClickStore {
    /// Creates a new store with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

fn record_from_row(row: &PgRow) -> Result<UrlRecord, sqlx::Error> {
    Ok(UrlRecord::new(
        row.try_get("id")?,
        row.try_get("short_id")?,
        row.try_get("original_url")?,
        row.try_get("total_clicks")?,
        row.try_get("unique_clicks")?,
        row.try_get("created_at")?,
        row.try_get("updated_at")?,
    ))
}

#[async_trait]
impl ClickStore for PgClickStore {
    async fn fetch_record(&self, key: &str) -> Result<Option<UrlRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, short_id, original_url, total_clicks, unique_clicks, created_at, updated_at
            FROM urls
            WHERE short_id = $1
            "#,
        )
        .bind(key)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.as_ref().map(record_from_row).transpose()?)
    }

    async fn apply_batched_deltas(&self, deltas: Vec<PendingDelta>) -> Result<(), StoreError> {
        if deltas.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for delta in &deltas {
            let result = sqlx::query(
                r#"
                UPDATE urls
                SET total_clicks = total_clicks + $1,
                    unique_clicks = unique_clicks + $2,
                    updated_at = NOW()
                WHERE short_id = $3
                "#,
            )
            .bind(delta.total_delta)
            .bind(delta.unique_delta)
            .bind(&delta.key)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                tracing::warn!("Dropping clicks for unknown short id {}", delta.key);
            }
        }

        tx.commit().await?;

        tracing::debug!("Applied {} click deltas", deltas.len());
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(self.pool.as_ref())
            .await?;
        Ok(())
    }
}
