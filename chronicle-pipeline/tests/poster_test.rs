//! Integration tests for [`chronicle_pipeline::SummaryPoster`].
//!
//! The summary file is dropped into a temp artifact root; a mock bot records what was sent.

mod common;

use std::sync::Arc;

use chronicle_core::Destination;
use chronicle_pipeline::{DayPoster, PipelineError, PostResult, SummaryPoster, SUMMARY_FILE_NAME};
use common::{day, MockBot};
use tempfile::TempDir;

const CHAT: i64 = -1001234;
const TOPIC: i32 = 77;

fn write_summary(root: &TempDir, bytes: &[u8]) {
    let dir = root.path().join("01.03.2025");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(SUMMARY_FILE_NAME), bytes).unwrap();
}

fn poster(bot: &MockBot, root: &TempDir, max: usize) -> SummaryPoster {
    SummaryPoster::new(
        Arc::new(bot.clone()),
        root.path(),
        Destination::new(CHAT, Some(TOPIC)),
        max,
    )
}

/// **Test: No summary file means NotReady and nothing is sent.**
#[tokio::test]
async fn test_missing_summary_is_not_ready() {
    let root = TempDir::new().unwrap();
    let bot = MockBot::new();

    let result = poster(&bot, &root, 4000).post(day(2025, 3, 1)).await.unwrap();

    assert_eq!(result, PostResult::NotReady);
    assert!(bot.sent().is_empty());
}

/// **Test: Empty and non-UTF-8 summaries are reported invalid and not sent.**
#[tokio::test]
async fn test_unusable_summary_is_invalid() {
    let root = TempDir::new().unwrap();
    let bot = MockBot::new();

    write_summary(&root, b"  \n\n");
    let result = poster(&bot, &root, 4000).post(day(2025, 3, 1)).await.unwrap();
    assert!(matches!(result, PostResult::Invalid { .. }));

    write_summary(&root, &[0xff, 0xfe, 0x00]);
    let result = poster(&bot, &root, 4000).post(day(2025, 3, 1)).await.unwrap();
    assert!(matches!(result, PostResult::Invalid { .. }));

    assert!(bot.sent().is_empty());
}

/// **Test: A 9000 byte summary with a 4000 byte limit goes out as three chunks, in order, to the summary topic.**
#[tokio::test]
async fn test_long_summary_is_chunked_in_order() {
    let root = TempDir::new().unwrap();
    let bot = MockBot::new();
    let line = "s".repeat(99) + "\n";
    let summary = line.repeat(90);
    write_summary(&root, summary.as_bytes());

    let result = poster(&bot, &root, 4000).post(day(2025, 3, 1)).await.unwrap();

    assert_eq!(result, PostResult::Posted { chunks: 3 });
    let sent = bot.sent();
    let sizes: Vec<usize> = sent.iter().map(|(_, text)| text.len()).collect();
    assert_eq!(sizes, vec![4000, 4000, 1000]);
    assert!(sent
        .iter()
        .all(|(dest, _)| *dest == Destination::new(CHAT, Some(TOPIC))));
    let joined: String = sent.iter().map(|(_, t)| t.as_str()).collect();
    assert_eq!(joined, summary);
}

/// **Test: The header line is sent ahead of the summary with the date filled in.**
#[tokio::test]
async fn test_header_precedes_summary() {
    let root = TempDir::new().unwrap();
    let bot = MockBot::new();
    write_summary(&root, "Topics: releases".as_bytes());

    let result = poster(&bot, &root, 4000)
        .with_header(Some("Discussed on {date}:".to_string()))
        .post(day(2025, 3, 1))
        .await
        .unwrap();

    assert_eq!(result, PostResult::Posted { chunks: 1 });
    assert_eq!(bot.sent()[0].1, "Discussed on 01.03:\nTopics: releases");
}

/// **Test: A transport failure mid-way is an error, not a post.**
#[tokio::test]
async fn test_transport_failure_is_error() {
    let root = TempDir::new().unwrap();
    let bot = MockBot::failing_from(1);
    let summary = ("x".repeat(9) + "\n").repeat(3);
    write_summary(&root, summary.as_bytes());

    let result = poster(&bot, &root, 10).post(day(2025, 3, 1)).await;

    assert!(matches!(result, Err(PipelineError::Transport(_))));
    assert_eq!(bot.sent().len(), 1);
}
