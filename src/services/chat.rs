//! Chat: append-only message log of a room.

use std::collections::VecDeque;

use serde::Serialize;
use uuid::Uuid;

use crate::frame::now_ms;
use crate::services::users::User;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Author name and color as they were when the message was sent.
    pub username: String,
    pub chat_color: String,
    pub text: String,
    /// Server clock, ms since epoch.
    pub created_at: i64,
}

#[derive(Debug, Clone, Default)]
pub struct Chat {
    messages: VecDeque<ChatMessage>,
    /// Oldest messages are dropped past this many. `None` keeps everything.
    limit: Option<usize>,
}

impl Chat {
    #[must_use]
    pub fn new(limit: Option<usize>) -> Self {
        Self { messages: VecDeque::new(), limit }
    }

    /// Append a message from `author`, stamped with the server clock.
    /// Returns the stored message.
    pub fn push(&mut self, author: &User, text: impl Into<String>) -> ChatMessage {
        let message = ChatMessage {
            id: Uuid::new_v4(),
            user_id: author.id,
            username: author.name.clone(),
            chat_color: author.color.clone(),
            text: text.into(),
            created_at: now_ms(),
        };
        if let Some(limit) = self.limit {
            while self.messages.len() >= limit.max(1) {
                self.messages.pop_front();
            }
        }
        self.messages.push_back(message.clone());
        message
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
