//! Ingestion: decides which incoming messages are archived and appends them to the store.
//!
//! [`IngestFilter`] rejects in `before`, so the chain stops early for anything not worth keeping;
//! [`ArchiveHandler`] persists what passes.

use std::sync::Arc;

use async_trait::async_trait;
use chronicle_core::{AppConfig, ChronicleError, Handler, HandlerResponse, Message};
use handler_chain::HandlerChain;
use storage::{MessageRecord, MessageStore, StorageError};
use tracing::{debug, instrument};

/// Why a message was not archived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    OtherChat,
    NotGroup,
    ChannelForward,
    Command,
    IgnoredTopic,
    Blank,
}

/// Only group messages from the target chat, outside ignored topics, with some text.
pub struct IngestFilter {
    target_chat_id: i64,
    ignored_topic_ids: Vec<i32>,
}

impl IngestFilter {
    pub fn new(target_chat_id: i64, ignored_topic_ids: Vec<i32>) -> Self {
        Self {
            target_chat_id,
            ignored_topic_ids,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.target_chat_id, config.ignored_topic_ids.clone())
    }

    /// `None` when the message should be archived.
    pub fn skip_reason(&self, message: &Message) -> Option<SkipReason> {
        if message.chat.id != self.target_chat_id {
            return Some(SkipReason::OtherChat);
        }
        if !message.chat.kind.is_group() {
            return Some(SkipReason::NotGroup);
        }
        if message.forwarded_from_channel {
            return Some(SkipReason::ChannelForward);
        }
        if message.is_command() {
            return Some(SkipReason::Command);
        }
        if message
            .thread_id
            .is_some_and(|id| self.ignored_topic_ids.contains(&id))
        {
            return Some(SkipReason::IgnoredTopic);
        }
        if message.content.trim().is_empty() {
            return Some(SkipReason::Blank);
        }
        None
    }
}

#[async_trait]
impl Handler for IngestFilter {
    async fn before(&self, message: &Message) -> chronicle_core::Result<bool> {
        match self.skip_reason(message) {
            Some(reason) => {
                debug!(
                    message_id = message.id,
                    chat_id = message.chat.id,
                    reason = ?reason,
                    "Message skipped"
                );
                Ok(false)
            }
            None => Ok(true),
        }
    }
}

/// Appends every message reaching `handle` to the archive. Redelivered messages are ignored.
pub struct ArchiveHandler {
    store: Arc<dyn MessageStore>,
}

impl ArchiveHandler {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }
}

/// Maps a core message to the stored record; the author is the label used in exports.
pub fn to_record(message: &Message) -> MessageRecord {
    MessageRecord::new(
        i64::from(message.id),
        message.chat.id,
        message.thread_id.map(i64::from),
        message.user.label(),
        message.content.clone(),
        message.created_at,
    )
}

#[async_trait]
impl Handler for ArchiveHandler {
    #[instrument(skip_all, fields(message_id = message.id))]
    async fn handle(&self, message: &Message) -> chronicle_core::Result<HandlerResponse> {
        match self.store.append(&to_record(message)).await {
            Ok(()) => debug!("Message archived"),
            Err(StorageError::AlreadyExists(_)) => debug!("Message already archived"),
            Err(e) => return Err(ChronicleError::Storage(e.to_string())),
        }
        Ok(HandlerResponse::Continue)
    }
}

/// Filter then archive, the chain the dispatcher runs for every message.
pub fn ingest_chain(config: &AppConfig, store: Arc<dyn MessageStore>) -> HandlerChain {
    HandlerChain::new()
        .add_handler(Arc::new(IngestFilter::from_config(config)))
        .add_handler(Arc::new(ArchiveHandler::new(store)))
}
