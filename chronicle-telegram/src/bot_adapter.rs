//! Wraps teloxide::Bot and implements [`chronicle_core::Bot`]. Production code sends messages via
//! Telegram; tests substitute another Bot impl.

use std::time::Duration;

use async_trait::async_trait;
use chronicle_core::{AppConfig, Bot as CoreBot, ChronicleError, Destination, Result};
use teloxide::payloads::SendMessageSetters;
use teloxide::requests::{Request, Requester};
use teloxide::types::{ChatId, MessageId, ThreadId};
use tracing::debug;

/// Builds the teloxide Bot from config, pointing it at TELEGRAM_API_URL when set.
pub fn build_teloxide_bot(config: &AppConfig) -> Result<teloxide::Bot> {
    let bot = teloxide::Bot::new(config.token.clone());
    match config.telegram_api_url.as_deref() {
        Some(url) => {
            let url = reqwest::Url::parse(url).map_err(|e| {
                ChronicleError::Config(format!("TELEGRAM_API_URL is not a valid URL: {}", e))
            })?;
            Ok(bot.set_api_url(url))
        }
        None => Ok(bot),
    }
}

/// Thin wrapper around teloxide::Bot that implements chronicle-core's Bot trait.
/// Every send is bounded by `send_timeout`.
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
    send_timeout: Duration,
}

impl TelegramBotAdapter {
    /// Creates an adapter from an existing teloxide Bot.
    pub fn new(bot: teloxide::Bot, send_timeout: Duration) -> Self {
        Self { bot, send_timeout }
    }

    /// Returns the underlying teloxide::Bot for direct API use when needed.
    pub fn inner(&self) -> &teloxide::Bot {
        &self.bot
    }
}

#[async_trait]
impl CoreBot for TelegramBotAdapter {
    async fn send_message(&self, destination: &Destination, text: &str) -> Result<()> {
        let mut request = self
            .bot
            .send_message(ChatId(destination.chat_id), text.to_string());
        if let Some(thread_id) = destination.thread_id {
            request = request.message_thread_id(ThreadId(MessageId(thread_id)));
        }

        let sent = tokio::time::timeout(self.send_timeout, request.send())
            .await
            .map_err(|_| {
                ChronicleError::Transport(format!(
                    "send_message timed out after {}s",
                    self.send_timeout.as_secs()
                ))
            })?
            .map_err(|e| ChronicleError::Transport(e.to_string()))?;

        debug!(
            chat_id = destination.chat_id,
            thread_id = ?destination.thread_id,
            message_id = sent.id.0,
            "Message sent"
        );
        Ok(())
    }
}
