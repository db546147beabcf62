//! Adapters from Telegram (teloxide) types to chronicle_core types.
//! Depends only on teloxide and chronicle_core type definitions.

use chronicle_core::{Chat, ChatKind, Message, ToCoreMessage, ToCoreUser, User};
use teloxide::types::MessageOrigin;

/// Wraps a teloxide User for conversion to core [`User`].
pub struct TelegramUserWrapper<'a>(pub &'a teloxide::types::User);

impl<'a> ToCoreUser for TelegramUserWrapper<'a> {
    fn to_core(&self) -> User {
        User {
            id: self.0.id.0 as i64,
            username: self.0.username.clone(),
            first_name: Some(self.0.first_name.clone()),
            last_name: self.0.last_name.clone(),
        }
    }
}

/// Wraps a teloxide Message for conversion to core [`Message`].
pub struct TelegramMessageWrapper<'a>(pub &'a teloxide::types::Message);

impl<'a> ToCoreMessage for TelegramMessageWrapper<'a> {
    fn to_core(&self) -> Message {
        let (content, from_caption) = match (self.0.text(), self.0.caption()) {
            (Some(text), _) => (text, false),
            (None, Some(caption)) => (caption, true),
            (None, None) => ("", false),
        };
        Message {
            id: self.0.id.0,
            user: self
                .0
                .from
                .as_ref()
                .map(|u| TelegramUserWrapper(u).to_core())
                .unwrap_or_else(|| User {
                    id: 0,
                    username: None,
                    first_name: None,
                    last_name: None,
                }),
            chat: Chat {
                id: self.0.chat.id.0,
                kind: chat_kind(&self.0.chat),
            },
            thread_id: self.0.thread_id.map(|thread| thread.0 .0),
            content: content.to_string(),
            from_caption,
            created_at: self.0.date,
            forwarded_from_channel: matches!(
                self.0.forward_origin(),
                Some(MessageOrigin::Channel { .. })
            ),
        }
    }
}

fn chat_kind(chat: &teloxide::types::Chat) -> ChatKind {
    if chat.is_supergroup() {
        ChatKind::Supergroup
    } else if chat.is_group() {
        ChatKind::Group
    } else if chat.is_channel() {
        ChatKind::Channel
    } else {
        ChatKind::Private
    }
}
