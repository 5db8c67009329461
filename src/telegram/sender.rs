//! Outgoing message capability supplied by the polling base.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a [`Sender`].
#[derive(Debug, Error)]
pub enum SendError {
    #[error("Chat not found: {0}")]
    ChatNotFound(i64),

    #[error("Message text is empty")]
    EmptyText,

    #[error("Transport error: {0}")]
    Transport(String),
}

/// Text formatting mode for outgoing messages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ParseMode {
    #[serde(rename = "HTML")]
    Html,
    MarkdownV2,
}

/// A `sendMessage` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessage {
    pub chat_id: i64,

    pub text: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<ParseMode>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
}

impl SendMessage {
    /// Creates a plain text message for a chat.
    #[must_use]
    pub fn new(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: None,
            reply_to_message_id: None,
        }
    }

    /// Sets the parse mode.
    #[must_use]
    pub const fn parse_mode(mut self, mode: ParseMode) -> Self {
        self.parse_mode = Some(mode);
        self
    }

    /// Marks the message as a reply.
    #[must_use]
    pub const fn reply_to(mut self, message_id: i64) -> Self {
        self.reply_to_message_id = Some(message_id);
        self
    }
}

/// Something that can deliver messages to the platform.
#[async_trait]
pub trait Sender: Send + Sync {
    /// Sends a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be delivered.
    async fn send_message(&self, request: SendMessage) -> Result<(), SendError>;
}
