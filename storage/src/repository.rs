//! Store traits. Callers depend on these so tests can swap in other implementations.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::StorageError;
use crate::models::{MessageRecord, RunRecord};

/// Append-only archive of chat messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Durably stores a message. Fails with `AlreadyExists` if the id is taken.
    async fn append(&self, message: &MessageRecord) -> Result<(), StorageError>;

    /// Messages with `start <= sent_at < end`, ordered by timestamp then id.
    /// An empty range yields an empty vec.
    async fn query_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MessageRecord>, StorageError>;
}

/// Durable export/post flags per day.
#[async_trait]
pub trait RunRecordStore: Send + Sync {
    async fn get(&self, day: NaiveDate) -> Result<Option<RunRecord>, StorageError>;

    /// Records for `first_day` and later, ascending by day.
    async fn load_since(&self, first_day: NaiveDate) -> Result<Vec<RunRecord>, StorageError>;

    /// Sets `exported`, creating the record if needed. Leaves `posted` untouched.
    async fn mark_exported(&self, day: NaiveDate) -> Result<(), StorageError>;

    /// Sets `posted`. Fails with `Invariant` unless the day is already exported.
    async fn mark_posted(&self, day: NaiveDate) -> Result<(), StorageError>;
}
