//! Message repository: the SQLite-backed [`MessageStore`].
//!
//! Rows are only ever inserted. Range reads are a single SELECT, so a concurrent append is
//! either fully visible or not visible at all.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::StorageError;
use crate::models::{MessageRecord, MessageRow};
use crate::repository::MessageStore;
use crate::sqlite_pool::SqlitePoolManager;

#[derive(Clone)]
pub struct MessageRepository {
    pool_manager: SqlitePoolManager,
}

impl MessageRepository {
    /// Opens the database and creates the table if missing.
    pub async fn new(database_url: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        Self::with_pool(pool_manager).await
    }

    /// Uses an existing pool (shared with other repositories).
    pub async fn with_pool(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        info!("Creating messages table if not exist");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                message_id INTEGER PRIMARY KEY,
                chat_id INTEGER NOT NULL,
                thread_id INTEGER,
                author TEXT NOT NULL,
                body TEXT NOT NULL,
                sent_at_ms INTEGER NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_messages_sent_at ON messages(sent_at_ms, message_id);
            CREATE INDEX IF NOT EXISTS idx_messages_thread_id ON messages(thread_id);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Number of archived messages.
    pub async fn count(&self) -> Result<i64, StorageError> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM messages")
            .fetch_one(self.pool_manager.pool())
            .await?;
        Ok(total)
    }

    /// Most recent message by timestamp, if any.
    pub async fn latest(&self) -> Result<Option<MessageRecord>, StorageError> {
        let row = sqlx::query_as::<_, MessageRow>(
            "SELECT message_id, chat_id, thread_id, author, body, sent_at_ms FROM messages \
             ORDER BY sent_at_ms DESC, message_id DESC LIMIT 1",
        )
        .fetch_optional(self.pool_manager.pool())
        .await?;
        row.map(MessageRecord::try_from).transpose()
    }
}

#[async_trait]
impl MessageStore for MessageRepository {
    async fn append(&self, message: &MessageRecord) -> Result<(), StorageError> {
        let result = sqlx::query(
            r#"
            INSERT INTO messages (message_id, chat_id, thread_id, author, body, sent_at_ms)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(message.message_id)
        .bind(message.chat_id)
        .bind(message.thread_id)
        .bind(&message.author)
        .bind(&message.body)
        .bind(message.sent_at.timestamp_millis())
        .execute(self.pool_manager.pool())
        .await;

        match result {
            Ok(_) => {
                debug!(message_id = message.message_id, "Archived message");
                Ok(())
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(
                StorageError::AlreadyExists(format!("message {}", message.message_id)),
            ),
            Err(e) => Err(e.into()),
        }
    }

    async fn query_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MessageRecord>, StorageError> {
        if end <= start {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, MessageRow>(
            r#"
            SELECT message_id, chat_id, thread_id, author, body, sent_at_ms
            FROM messages
            WHERE sent_at_ms >= ? AND sent_at_ms < ?
            ORDER BY sent_at_ms ASC, message_id ASC
            "#,
        )
        .bind(start.timestamp_millis())
        .bind(end.timestamp_millis())
        .fetch_all(self.pool_manager.pool())
        .await?;

        debug!(count = rows.len(), start = %start, end = %end, "Queried message range");
        rows.into_iter().map(MessageRecord::try_from).collect()
    }
}
