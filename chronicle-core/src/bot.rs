//! Bot abstraction for sending messages.
//!
//! [`Bot`] is transport-agnostic; the teloxide implementation lives in chronicle-telegram.

use crate::error::Result;
use async_trait::async_trait;

/// Where an outgoing message goes: a chat and, for forum groups, a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Destination {
    pub chat_id: i64,
    pub thread_id: Option<i32>,
}

impl Destination {
    pub fn new(chat_id: i64, thread_id: Option<i32>) -> Self {
        Self { chat_id, thread_id }
    }
}

/// Abstraction for sending messages. Implementations map to a transport (e.g. Telegram).
#[async_trait]
pub trait Bot: Send + Sync {
    /// Sends a text message. Returns `ChronicleError::Transport` when the transport rejects it.
    async fn send_message(&self, destination: &Destination, text: &str) -> Result<()>;
}
