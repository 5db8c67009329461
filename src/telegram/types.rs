//! Update and message types delivered by the polling base.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Character that starts every bot command.
pub const COMMAND_INIT_CHARACTER: char = '/';

/// Kind of chat a message was sent in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

/// A chat the bot participates in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chat {
    pub id: i64,

    #[serde(rename = "type")]
    pub kind: ChatKind,
}

impl Chat {
    /// Creates a private chat with the given ID.
    #[must_use]
    pub const fn private(id: i64) -> Self {
        Self {
            id,
            kind: ChatKind::Private,
        }
    }

    /// Creates a group chat with the given ID.
    #[must_use]
    pub const fn group(id: i64) -> Self {
        Self {
            id,
            kind: ChatKind::Group,
        }
    }

    /// Returns true for groups and supergroups.
    #[must_use]
    pub const fn is_group_chat(&self) -> bool {
        matches!(self.kind, ChatKind::Group | ChatKind::Supergroup)
    }
}

/// Sender of a message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: i64,

    #[serde(default)]
    pub is_bot: bool,

    pub first_name: String,

    #[serde(default)]
    pub username: Option<String>,
}

impl User {
    /// Creates a human user without a username.
    #[must_use]
    pub fn new(id: i64, first_name: impl Into<String>) -> Self {
        Self {
            id,
            is_bot: false,
            first_name: first_name.into(),
            username: None,
        }
    }
}

/// Type of a text entity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    BotCommand,
    Mention,
    Hashtag,
    Url,
    Bold,
    Italic,
    Code,
    /// Any entity type this crate does not inspect.
    #[serde(other)]
    Other,
}

/// A marked span inside message text.
///
/// Offsets and lengths are counted in UTF-16 code units, as the platform does.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: EntityKind,
    pub offset: usize,
    pub length: usize,
}

/// An inbound message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub message_id: i64,

    pub chat: Chat,

    #[serde(default)]
    pub from: Option<User>,

    #[serde(with = "chrono::serde::ts_seconds")]
    pub date: DateTime<Utc>,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub entities: Vec<MessageEntity>,
}

impl Message {
    /// Builds a text message, marking a leading command the way the platform does.
    #[must_use]
    pub fn text_message(message_id: i64, chat: Chat, from: Option<User>, text: &str) -> Self {
        let entities = leading_command_entity(text).into_iter().collect();

        Self {
            message_id,
            chat,
            from,
            date: Utc::now(),
            text: Some(text.to_owned()),
            entities,
        }
    }

    /// Returns true if the message carries text.
    #[must_use]
    pub const fn has_text(&self) -> bool {
        self.text.is_some()
    }

    /// Returns true if the message text starts with a bot command entity.
    #[must_use]
    pub fn is_command(&self) -> bool {
        self.has_text()
            && self
                .entities
                .iter()
                .any(|e| e.kind == EntityKind::BotCommand && e.offset == 0)
    }

    /// Returns the chat ID, the usual reply target.
    #[must_use]
    pub const fn chat_id(&self) -> i64 {
        self.chat.id
    }
}

/// Computes the `bot_command` entity for text such as `/start@my_bot args`.
fn leading_command_entity(text: &str) -> Option<MessageEntity> {
    let rest = text.strip_prefix(COMMAND_INIT_CHARACTER)?;
    let token = rest.split(char::is_whitespace).next().unwrap_or_default();

    if token.is_empty() {
        return None;
    }

    Some(MessageEntity {
        kind: EntityKind::BotCommand,
        offset: 0,
        length: 1 + token.encode_utf16().count(),
    })
}

/// One inbound event from the platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Update {
    pub update_id: i64,

    #[serde(default)]
    pub message: Option<Message>,
}

impl Update {
    /// Creates an update carrying a message.
    #[must_use]
    pub const fn with_message(update_id: i64, message: Message) -> Self {
        Self {
            update_id,
            message: Some(message),
        }
    }

    /// Creates an update without a message (e.g. a callback or poll event).
    #[must_use]
    pub const fn empty(update_id: i64) -> Self {
        Self {
            update_id,
            message: None,
        }
    }

    /// Returns true if the update carries a message.
    #[must_use]
    pub const fn has_message(&self) -> bool {
        self.message.is_some()
    }
}
