//! `/help` command listing the registered commands.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::registry::CommandRegistry;
use super::types::{BotCommand, CommandError, CommandInfo};
use crate::telegram::{COMMAND_INIT_CHARACTER, Message, ParseMode, SendMessage, Sender};

/// Lists every registered command, or describes one.
///
/// Keeps a weak handle so that the registry holding this command does not
/// keep itself alive.
pub struct HelpCommand {
    info: CommandInfo,
    registry: Weak<RwLock<CommandRegistry>>,
}

impl HelpCommand {
    /// Creates `/help` bound to a registry.
    ///
    /// # Errors
    ///
    /// Never fails for the built-in identifier; the result mirrors
    /// [`CommandInfo::new`].
    pub fn new(registry: Weak<RwLock<CommandRegistry>>) -> Result<Self, CommandError> {
        Ok(Self {
            info: CommandInfo::new("help", "Show available commands")?,
            registry,
        })
    }

    fn render_all(commands: &[Arc<dyn BotCommand>]) -> String {
        let mut lines = vec!["<b>Available commands:</b>".to_owned()];
        for command in commands {
            lines.push(String::new());
            lines.push(render_command(command.as_ref()));
        }
        lines.join("\n")
    }
}

/// Formats one command as `<b>/identifier</b>` followed by its description.
#[must_use]
pub fn render_command(command: &dyn BotCommand) -> String {
    format!(
        "<b>{COMMAND_INIT_CHARACTER}{}</b>\n{}",
        escape_html(command.identifier()),
        escape_html(command.description())
    )
}

/// Escapes the characters that are special in Telegram HTML.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '&' => escaped.push_str("&amp;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[async_trait]
impl BotCommand for HelpCommand {
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
        let registry = self
            .registry
            .upgrade()
            .ok_or_else(|| CommandError::Failed("command registry is gone".to_owned()))?;

        let text = match arguments.first() {
            None => {
                let commands = registry.read().await.registered_commands();
                Self::render_all(&commands)
            }
            Some(name) => {
                let name = name.trim_start_matches(COMMAND_INIT_CHARACTER);
                match registry.read().await.registered_command(name) {
                    Some(command) => render_command(command.as_ref()),
                    None => format!(
                        "Unknown command: {COMMAND_INIT_CHARACTER}{}",
                        escape_html(name)
                    ),
                }
            }
        };

        let reply = SendMessage::new(message.chat_id(), text)
            .parse_mode(ParseMode::Html)
            .reply_to(message.message_id);
        sender.send_message(reply).await?;
        Ok(())
    }
}
