//! Polling bot base.
//!
//! Platform types, the outgoing message capability, and the long-polling
//! driver that feeds updates to a bot.

mod polling;
mod sender;
mod types;

pub use polling::{LongPollingBot, PollError, Poller, PollerMessage, UpdateSource};
pub use sender::{ParseMode, SendError, SendMessage, Sender};
pub use types::{
    COMMAND_INIT_CHARACTER, Chat, ChatKind, EntityKind, Message, MessageEntity, Update, User,
};
