//! Small general-purpose commands.

use async_trait::async_trait;

use super::types::{BotCommand, CommandError, CommandInfo};
use crate::telegram::{Message, SendMessage, Sender};

/// `/start`: greets the user.
pub struct StartCommand {
    info: CommandInfo,
    greeting: String,
}

impl StartCommand {
    /// Creates `/start` replying with `greeting`.
    ///
    /// # Errors
    ///
    /// Mirrors [`CommandInfo::new`]; the built-in identifier is always valid.
    pub fn new(greeting: impl Into<String>) -> Result<Self, CommandError> {
        Ok(Self {
            info: CommandInfo::new("start", "Start talking to the bot")?,
            greeting: greeting.into(),
        })
    }
}

#[async_trait]
impl BotCommand for StartCommand {
    fn identifier(&self) -> &str {
        self.info.identifier()
    }

    fn description(&self) -> &str {
        self.info.description()
    }

    async fn process_message(
        &self,
        sender: &dyn Sender,
        message: &Message,
        _arguments: &[String],
    ) -> Result<(), CommandError> {
        let name = message
            .from
            .as_ref()
            .map_or("there", |user| user.first_name.as_str());

        let text = format!("Hello, {name}! {}", self.greeting);
        sender
            .send_message(SendMessage::new(message.chat_id(), text))
            .await?;
        Ok(())
    }
}

/// `/echo <text>`: repeats its arguments.
pub struct EchoCommand {
    info: CommandInfo,
}

impl EchoCommand {
    /// Creates `/echo`.
    ///
    /// # Errors
    ///
    /// Mirrors [`CommandInfo::new`]; the built-in identifier is always valid.
    pub fn new() -> Result<Self, CommandError> {
        Ok(Self {
            info: CommandInfo::new("echo", "Repeat the given text")?,
        })
    }
}

#[async_trait]
impl BotCommand for EchoCommand {
    fn identifier(&self) -> &str {
        self.info.identifier()
    }

    fn description(&self) -> &str {
        self.info.description()
    }

    async fn process_message(
        &self,
        sender: &dyn Sender,
        message: &Message,
        arguments: &[String],
    ) -> Result<(), CommandError> {
        let text = if arguments.is_empty() {
            "Nothing to echo. Usage: /echo <text>".to_owned()
        } else {
            arguments.join(" ")
        };

        sender
            .send_message(SendMessage::new(message.chat_id(), text).reply_to(message.message_id))
            .await?;
        Ok(())
    }
}
