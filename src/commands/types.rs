//! Command types and definitions.

use std::fmt;

use async_trait::async_trait;
use thiserror::Error;

use crate::telegram::{COMMAND_INIT_CHARACTER, Message, SendError, Sender};

/// Maximum command length, including the leading `/`.
pub const COMMAND_MAX_LENGTH: usize = 32;

/// Errors raised while defining or running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Command identifier cannot be empty")]
    EmptyIdentifier,

    #[error("Command identifier '{identifier}' is too long: {length} > {max_length}")]
    IdentifierTooLong {
        identifier: String,
        length: usize,
        max_length: usize,
    },

    #[error("Command identifier '{0}' must not start with '/' or contain whitespace")]
    InvalidIdentifier(String),

    #[error("Failed to send reply: {0}")]
    Send(#[from] SendError),

    #[error("Command failed: {0}")]
    Failed(String),
}

/// Identifier and description of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInfo {
    identifier: String,
    description: String,
}

impl CommandInfo {
    /// Creates command metadata, validating the identifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the identifier is empty, malformed, or longer than
    /// the platform allows.
    pub fn new(
        identifier: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, CommandError> {
        let identifier = identifier.into();

        if identifier.is_empty() {
            return Err(CommandError::EmptyIdentifier);
        }

        if identifier.starts_with(COMMAND_INIT_CHARACTER) || identifier.contains(char::is_whitespace)
        {
            return Err(CommandError::InvalidIdentifier(identifier));
        }

        let length = identifier.chars().count() + 1;
        if length > COMMAND_MAX_LENGTH {
            return Err(CommandError::IdentifierTooLong {
                identifier,
                length,
                max_length: COMMAND_MAX_LENGTH,
            });
        }

        Ok(Self {
            identifier,
            description: description.into(),
        })
    }

    #[must_use]
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }
}

impl fmt::Display for CommandInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{COMMAND_INIT_CHARACTER}{} - {}", self.identifier, self.description)
    }
}

/// A handler bound to one command identifier.
#[async_trait]
pub trait BotCommand: Send + Sync {
    /// Identifier the command is registered under, without the leading `/`.
    fn identifier(&self) -> &str;

    /// Human readable description shown by `/help`.
    fn description(&self) -> &str;

    /// Runs the command.
    ///
    /// `arguments` are the whitespace-separated words following the command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command could not complete.
    async fn process_message(
        &self,
        sender: &dyn Sender,
        message: &Message,
        arguments: &[String],
    ) -> Result<(), CommandError>;
}

impl fmt::Debug for dyn BotCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotCommand")
            .field("identifier", &self.identifier())
            .finish_non_exhaustive()
    }
}

/// A command split out of message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCommand {
    /// Command identifier, with the bot username removed when allowed.
    pub identifier: String,

    /// Words after the command.
    pub arguments: Vec<String>,
}

impl ParsedCommand {
    /// Parses `/command[@bot] arg1 arg2`.
    ///
    /// When `bot_username` is given, a trailing `@bot_username` is stripped
    /// from the command (case-insensitively). Commands addressed to other
    /// bots keep their suffix and will not match a registered identifier.
    ///
    /// Returns `None` if the text does not start with `/`.
    #[must_use]
    pub fn parse(text: &str, bot_username: Option<&str>) -> Option<Self> {
        let rest = text.strip_prefix(COMMAND_INIT_CHARACTER)?;

        let (head, tail) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));

        let identifier = match (bot_username, head.rsplit_once('@')) {
            (Some(username), Some((command, target))) if target.eq_ignore_ascii_case(username) => {
                command
            }
            _ => head,
        };

        Some(Self {
            identifier: identifier.trim().to_owned(),
            arguments: tail.split_whitespace().map(str::to_owned).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_info_valid() {
        let info = CommandInfo::new("start", "Start the bot").unwrap();
        assert_eq!(info.identifier(), "start");
        assert_eq!(info.description(), "Start the bot");
        assert_eq!(info.to_string(), "/start - Start the bot");
    }

    #[test]
    fn test_command_info_empty() {
        assert!(matches!(
            CommandInfo::new("", "x"),
            Err(CommandError::EmptyIdentifier)
        ));
    }

    #[test]
    fn test_command_info_malformed() {
        assert!(matches!(
            CommandInfo::new("/start", "x"),
            Err(CommandError::InvalidIdentifier(_))
        ));
        assert!(matches!(
            CommandInfo::new("two words", "x"),
            Err(CommandError::InvalidIdentifier(_))
        ));
    }

    #[test]
    fn test_command_info_length_limit() {
        assert!(CommandInfo::new("a".repeat(31), "x").is_ok());
        assert!(matches!(
            CommandInfo::new("a".repeat(32), "x"),
            Err(CommandError::IdentifierTooLong { length: 33, .. })
        ));
    }

    #[test]
    fn test_parse_plain() {
        assert_eq!(
            ParsedCommand::parse("/start", Some("my_bot")),
            Some(ParsedCommand {
                identifier: "start".to_owned(),
                arguments: vec![],
            })
        );
    }

    #[test]
    fn test_parse_arguments() {
        let parsed = ParsedCommand::parse("/echo  hello   big\tworld ", None).unwrap();
        assert_eq!(parsed.identifier, "echo");
        assert_eq!(parsed.arguments, vec!["hello", "big", "world"]);
    }

    #[test]
    fn test_parse_strips_own_username() {
        let parsed = ParsedCommand::parse("/start@my_bot now", Some("my_bot")).unwrap();
        assert_eq!(parsed.identifier, "start");
        assert_eq!(parsed.arguments, vec!["now"]);

        let parsed = ParsedCommand::parse("/start@My_Bot", Some("my_bot")).unwrap();
        assert_eq!(parsed.identifier, "start");
    }

    #[test]
    fn test_parse_keeps_other_username() {
        let parsed = ParsedCommand::parse("/start@other_bot", Some("my_bot")).unwrap();
        assert_eq!(parsed.identifier, "start@other_bot");
    }

    #[test]
    fn test_parse_username_not_allowed() {
        let parsed = ParsedCommand::parse("/start@my_bot", None).unwrap();
        assert_eq!(parsed.identifier, "start@my_bot");
    }

    #[test]
    fn test_parse_not_a_command() {
        assert_eq!(ParsedCommand::parse("start", None), None);
        assert_eq!(ParsedCommand::parse(" /start", None), None);
    }
}
