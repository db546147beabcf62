//! Run record repository: the SQLite-backed [`RunRecordStore`].
//!
//! Each mutation is one statement, so flags change atomically. A CHECK constraint keeps
//! `posted` from being set on a day that was never exported.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use crate::error::StorageError;
use crate::models::{RunRecord, RunRecordRow, DAY_FORMAT};
use crate::repository::RunRecordStore;
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct RunRecordRepository {
    pool_manager: SqlitePoolManager,
}

fn day_key(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

impl RunRecordRepository {
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        Self::with_pool(pool_manager).await
    }

    pub async fn with_pool(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        info!("Creating run_records table if not exist");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS run_records (
                day TEXT PRIMARY KEY,
                exported INTEGER NOT NULL DEFAULT 0,
                posted INTEGER NOT NULL DEFAULT 0,
                exported_at_ms INTEGER,
                posted_at_ms INTEGER,
                CHECK (posted = 0 OR exported = 1)
            )
            "#,
        )
        .execute(self.pool_manager.pool())
        .await?;

        Ok(())
    }
}

#[async_trait]
impl RunRecordStore for RunRecordRepository {
    async fn get(&self, day: NaiveDate) -> Result<Option<RunRecord>, StorageError> {
        let row = sqlx::query_as::<_, RunRecordRow>(
            "SELECT day, exported, posted, exported_at_ms, posted_at_ms FROM run_records WHERE day = ?",
        )
        .bind(day_key(day))
        .fetch_optional(self.pool_manager.pool())
        .await?;
        row.map(RunRecord::try_from).transpose()
    }

    async fn load_since(&self, first_day: NaiveDate) -> Result<Vec<RunRecord>, StorageError> {
        // ISO dates sort lexicographically.
        let rows = sqlx::query_as::<_, RunRecordRow>(
            "SELECT day, exported, posted, exported_at_ms, posted_at_ms FROM run_records \
             WHERE day >= ? ORDER BY day ASC",
        )
        .bind(day_key(first_day))
        .fetch_all(self.pool_manager.pool())
        .await?;
        rows.into_iter().map(RunRecord::try_from).collect()
    }

    async fn mark_exported(&self, day: NaiveDate) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            INSERT INTO run_records (day, exported, posted, exported_at_ms)
            VALUES (?, 1, 0, ?)
            ON CONFLICT(day) DO UPDATE SET exported = 1, exported_at_ms = excluded.exported_at_ms
            "#,
        )
        .bind(day_key(day))
        .bind(Utc::now().timestamp_millis())
        .execute(self.pool_manager.pool())
        .await?;

        debug!(day = %day, "Recorded export");
        Ok(())
    }

    async fn mark_posted(&self, day: NaiveDate) -> Result<(), StorageError> {
        let result = sqlx::query(
            "UPDATE run_records SET posted = 1, posted_at_ms = ? WHERE day = ? AND exported = 1",
        )
        .bind(Utc::now().timestamp_millis())
        .bind(day_key(day))
        .execute(self.pool_manager.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Invariant(format!(
                "cannot mark {} posted before it is exported",
                day
            )));
        }

        debug!(day = %day, "Recorded post");
        Ok(())
    }
}
