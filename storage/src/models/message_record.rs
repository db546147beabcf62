//! Archived message model.
//!
//! Maps to the `messages` table; timestamps are stored as UTC unix milliseconds.

use chrono::{DateTime, Utc};

use crate::error::StorageError;

/// One archived chat message. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRecord {
    /// Transport-assigned id; unique in the store.
    pub message_id: i64,
    pub chat_id: i64,
    pub thread_id: Option<i64>,
    /// Display label of the sender.
    pub author: String,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

impl MessageRecord {
    pub fn new(
        message_id: i64,
        chat_id: i64,
        thread_id: Option<i64>,
        author: impl Into<String>,
        body: impl Into<String>,
        sent_at: DateTime<Utc>,
    ) -> Self {
        Self {
            message_id,
            chat_id,
            thread_id,
            author: author.into(),
            body: body.into(),
            sent_at,
        }
    }
}

/// Raw row as stored.
#[derive(sqlx::FromRow)]
pub(crate) struct MessageRow {
    pub message_id: i64,
    pub chat_id: i64,
    pub thread_id: Option<i64>,
    pub author: String,
    pub body: String,
    pub sent_at_ms: i64,
}

impl TryFrom<MessageRow> for MessageRecord {
    type Error = StorageError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let sent_at = DateTime::<Utc>::from_timestamp_millis(row.sent_at_ms).ok_or_else(|| {
            StorageError::Invariant(format!(
                "message {} has out-of-range timestamp {}",
                row.message_id, row.sent_at_ms
            ))
        })?;
        Ok(Self {
            message_id: row.message_id,
            chat_id: row.chat_id,
            thread_id: row.thread_id,
            author: row.author,
            body: row.body,
            sent_at,
        })
    }
}
