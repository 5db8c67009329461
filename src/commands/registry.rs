//! Command registry.
//!
//! Maps command identifiers to handlers. At most one handler is registered
//! per identifier; registering a taken identifier fails instead of replacing
//! the existing handler.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::types::{BotCommand, ParsedCommand};
use crate::telegram::{Message, Sender};

/// Fallback for command-shaped messages that match no registered command.
#[async_trait]
pub trait DefaultAction: Send + Sync {
    async fn handle(&self, sender: &dyn Sender, message: &Message);
}

/// Result of registering or deregistering one command.
pub type CommandOutcome = (Arc<dyn BotCommand>, bool);

/// What a message resolved to, detached from the registry.
#[derive(Clone)]
pub enum Invocation {
    /// A registered command with its arguments.
    Command {
        command: Arc<dyn BotCommand>,
        arguments: Vec<String>,
    },
    /// The default action.
    Default(Arc<dyn DefaultAction>),
}

impl Invocation {
    /// Runs the resolved handler. Handler failures are logged, not returned.
    pub async fn run(self, sender: &dyn Sender, message: &Message) {
        match self {
            Self::Command { command, arguments } => {
                debug!("Executing /{} with {} arguments", command.identifier(), arguments.len());
                if let Err(e) = command.process_message(sender, message, &arguments).await {
                    warn!("Command /{} failed: {}", command.identifier(), e);
                }
            }
            Self::Default(action) => {
                debug!("Executing default action");
                action.handle(sender, message).await;
            }
        }
    }
}

/// Identifier to command map plus an optional default action.
pub struct CommandRegistry {
    commands: BTreeMap<String, Arc<dyn BotCommand>>,

    default_action: Option<Arc<dyn DefaultAction>>,

    /// Whether `/command@bot_username` is accepted.
    allow_commands_with_username: bool,

    bot_username: String,
}

impl CommandRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(allow_commands_with_username: bool, bot_username: impl Into<String>) -> Self {
        Self {
            commands: BTreeMap::new(),
            default_action: None,
            allow_commands_with_username,
            bot_username: bot_username.into(),
        }
    }

    /// Registers a command. Returns false if its identifier is taken.
    pub fn register(&mut self, command: Arc<dyn BotCommand>) -> bool {
        let identifier = command.identifier().to_owned();

        if self.commands.contains_key(&identifier) {
            warn!("Command /{} is already registered", identifier);
            return false;
        }

        info!("Registered command /{}", identifier);
        self.commands.insert(identifier, command);
        true
    }

    /// Registers every command, reporting success per command in input order.
    pub fn register_all(
        &mut self,
        commands: impl IntoIterator<Item = Arc<dyn BotCommand>>,
    ) -> Vec<CommandOutcome> {
        commands
            .into_iter()
            .map(|command| {
                let registered = self.register(Arc::clone(&command));
                (command, registered)
            })
            .collect()
    }

    /// Removes whatever is registered under the command's identifier.
    ///
    /// Returns false if nothing was registered under it.
    pub fn deregister(&mut self, command: &dyn BotCommand) -> bool {
        let removed = self.commands.remove(command.identifier()).is_some();
        if removed {
            info!("Deregistered command /{}", command.identifier());
        }
        removed
    }

    /// Deregisters every command, reporting success per command in input order.
    pub fn deregister_all(
        &mut self,
        commands: impl IntoIterator<Item = Arc<dyn BotCommand>>,
    ) -> Vec<CommandOutcome> {
        commands
            .into_iter()
            .map(|command| {
                let removed = self.deregister(command.as_ref());
                (command, removed)
            })
            .collect()
    }

    /// Returns all registered commands ordered by identifier.
    #[must_use]
    pub fn registered_commands(&self) -> Vec<Arc<dyn BotCommand>> {
        self.commands.values().cloned().collect()
    }

    /// Looks up a command by identifier.
    #[must_use]
    pub fn registered_command(&self, identifier: &str) -> Option<Arc<dyn BotCommand>> {
        self.commands.get(identifier).cloned()
    }

    /// Installs or replaces the default action.
    pub fn register_default_action(&mut self, action: Arc<dyn DefaultAction>) {
        if self.default_action.replace(action).is_some() {
            debug!("Replaced default action");
        }
    }

    #[must_use]
    pub fn has_default_action(&self) -> bool {
        self.default_action.is_some()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    #[must_use]
    pub fn bot_username(&self) -> &str {
        &self.bot_username
    }

    /// Resolves a message to the handler that should run, if any.
    ///
    /// Unknown commands resolve to the default action when one is installed.
    #[must_use]
    pub fn resolve(&self, message: &Message) -> Option<Invocation> {
        let text = message.text.as_deref()?;
        let username = self
            .allow_commands_with_username
            .then_some(self.bot_username.as_str());
        let parsed = ParsedCommand::parse(text, username)?;

        if let Some(command) = self.commands.get(&parsed.identifier) {
            return Some(Invocation::Command {
                command: Arc::clone(command),
                arguments: parsed.arguments,
            });
        }

        debug!("No command registered for /{}", parsed.identifier);
        self.default_action.clone().map(Invocation::Default)
    }

    /// Executes the command a message names.
    ///
    /// Returns true if a registered command or the default action ran.
    pub async fn execute_command(&self, sender: &dyn Sender, message: &Message) -> bool {
        match self.resolve(message) {
            Some(invocation) => {
                invocation.run(sender, message).await;
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.commands.keys().collect::<Vec<_>>())
            .field("has_default_action", &self.default_action.is_some())
            .field("allow_commands_with_username", &self.allow_commands_with_username)
            .field("bot_username", &self.bot_username)
            .finish()
    }
}
