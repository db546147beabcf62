//! Integration tests for [`storage::MessageRepository`].
//!
//! Covers append (including duplicate suppression), `query_range` bounds and ordering, and
//! durability across reopening a file database.

use chrono::{DateTime, Duration, TimeZone, Utc};
use storage::{MessageRecord, MessageRepository, MessageStore, StorageError};

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, hour, minute, 0).unwrap()
}

fn record(id: i64, sent_at: DateTime<Utc>) -> MessageRecord {
    MessageRecord::new(id, -100, Some(7), "alice", format!("message {}", id), sent_at)
}

/// **Test: Appended message comes back from a covering range with every field intact.**
#[tokio::test]
async fn test_append_and_query_round_trip() {
    let repo = MessageRepository::new("sqlite::memory:")
        .await
        .expect("Failed to create repository");

    let original = MessageRecord::new(42, -100, None, "bob", "line one\nline two", at(10, 30));
    repo.append(&original).await.expect("Failed to save message");

    let found = repo
        .query_range(at(0, 0), at(23, 59))
        .await
        .expect("Failed to query");

    assert_eq!(found, vec![original]);
}

/// **Test: Appending an id twice fails with AlreadyExists and keeps the first copy.**
#[tokio::test]
async fn test_append_duplicate_id_is_rejected() {
    let repo = MessageRepository::new("sqlite::memory:")
        .await
        .expect("Failed to create repository");

    repo.append(&record(1, at(9, 0))).await.unwrap();

    let mut duplicate = record(1, at(11, 0));
    duplicate.body = "changed".to_string();
    let err = repo.append(&duplicate).await.unwrap_err();
    assert!(matches!(err, StorageError::AlreadyExists(_)));

    let found = repo.query_range(at(0, 0), at(23, 0)).await.unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].body, "message 1");
}

/// **Test: Range is half-open and ordered by timestamp then id.**
///
/// **Setup:** Messages at the start bound, inside (two sharing a timestamp, inserted out of id
/// order), and exactly at the end bound.
/// **Action:** `query_range(start, end)`.
/// **Expected:** Start included, end excluded, ties ordered by id.
#[tokio::test]
async fn test_query_range_bounds_and_order() {
    let repo = MessageRepository::new("sqlite::memory:")
        .await
        .expect("Failed to create repository");

    let start = at(0, 0);
    let end = start + Duration::days(1);

    for rec in [
        record(5, at(12, 0)),
        record(3, at(12, 0)),
        record(1, start),
        record(9, end),
        record(2, start - Duration::seconds(1)),
        record(4, at(18, 0)),
    ] {
        repo.append(&rec).await.unwrap();
    }

    let ids: Vec<i64> = repo
        .query_range(start, end)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.message_id)
        .collect();

    assert_eq!(ids, vec![1, 3, 5, 4]);
}

/// **Test: Empty and inverted ranges yield an empty vec, not an error.**
#[tokio::test]
async fn test_query_range_empty() {
    let repo = MessageRepository::new("sqlite::memory:")
        .await
        .expect("Failed to create repository");

    repo.append(&record(1, at(9, 0))).await.unwrap();

    assert!(repo.query_range(at(10, 0), at(11, 0)).await.unwrap().is_empty());
    assert!(repo.query_range(at(9, 0), at(9, 0)).await.unwrap().is_empty());
    assert!(repo.query_range(at(11, 0), at(9, 0)).await.unwrap().is_empty());
}

/// **Test: Appended messages survive closing and reopening a file database.**
#[tokio::test]
async fn test_append_is_durable_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("messages.db");
    let path = path.to_str().unwrap();

    {
        let repo = MessageRepository::new(path).await.unwrap();
        repo.append(&record(1, at(9, 0))).await.unwrap();
        repo.append(&record(2, at(9, 5))).await.unwrap();
    }

    let reopened = MessageRepository::new(path).await.unwrap();
    let found = reopened.query_range(at(0, 0), at(23, 0)).await.unwrap();
    assert_eq!(found.len(), 2);
}
