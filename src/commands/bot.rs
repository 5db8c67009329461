//! Command bot: classifies updates and dispatches commands.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::registry::{CommandOutcome, CommandRegistry, DefaultAction};
use super::types::BotCommand;
use crate::config::BotSettings;
use crate::telegram::{LongPollingBot, Message, Sender, Update};

/// Behaviour plugged into a [`CommandBot`] for everything that is not a
/// registered command.
#[async_trait]
pub trait UpdateHandler: Send + Sync {
    /// Handles updates that are not commands.
    ///
    /// Command-shaped messages with an unknown identifier do not reach this
    /// method when the registry has a default action installed: the default
    /// action consumes them.
    async fn process_non_command_update(&self, sender: &dyn Sender, update: Update);

    /// Handles command-shaped messages that match no registered command.
    ///
    /// Forwards to [`Self::process_non_command_update`] unless overridden,
    /// e.g. to reply with an error message.
    async fn process_invalid_command_update(&self, sender: &dyn Sender, update: Update) {
        self.process_non_command_update(sender, update).await;
    }

    /// Returns true if a command message must be treated as a non-command.
    ///
    /// Only consulted for messages that are already command-shaped. For
    /// example, to ignore commands sent in group chats:
    ///
    /// ```ignore
    /// fn filter(&self, message: &Message) -> bool {
    ///     message.chat.is_group_chat()
    /// }
    /// ```
    fn filter(&self, _message: &Message) -> bool {
        false
    }
}

/// A long-polling bot with command dispatch.
pub struct CommandBot<H> {
    bot_username: String,

    sender: Arc<dyn Sender>,

    handler: H,

    /// Shared so commands such as `/help` can read it while running.
    registry: Arc<RwLock<CommandRegistry>>,
}

#[warn(missing_docs)]
impl<H: UpdateHandler> CommandBot<H> {
    /// Creates a bot that accepts `/command@bot_username`.
    #[must_use]
    pub fn new(bot_username: impl Into<String>, sender: Arc<dyn Sender>, handler: H) -> Self {
        Self::with_options(bot_username, true, sender, handler)
    }

    /// Creates a bot, choosing whether commands may carry the bot username.
    #[must_use]
    pub fn with_options(
        bot_username: impl Into<String>,
        allow_commands_with_username: bool,
        sender: Arc<dyn Sender>,
        handler: H,
    ) -> Self {
        let bot_username = bot_username.into();
        let registry = CommandRegistry::new(allow_commands_with_username, bot_username.clone());

        Self {
            bot_username,
            sender,
            handler,
            registry: Arc::new(RwLock::new(registry)),
        }
    }

    /// Creates a bot from settings.
    #[must_use]
    pub fn from_settings(settings: &BotSettings, sender: Arc<dyn Sender>, handler: H) -> Self {
        Self::with_options(
            settings.bot_username.clone(),
            settings.allow_commands_with_username,
            sender,
            handler,
        )
    }

    /// Returns the plugged-in handler.
    #[must_use]
    pub const fn handler(&self) -> &H {
        &self.handler
    }

    /// Weak handle to the registry, for commands that inspect it.
    #[must_use]
    pub fn registry_handle(&self) -> Weak<RwLock<CommandRegistry>> {
        Arc::downgrade(&self.registry)
    }

    /// Registers a command. Returns false if the identifier is taken.
    pub async fn register(&self, command: Arc<dyn BotCommand>) -> bool {
        self.registry.write().await.register(command)
    }

    /// Registers several commands, reporting the outcome for each.
    pub async fn register_all(
        &self,
        commands: impl IntoIterator<Item = Arc<dyn BotCommand>> + Send,
    ) -> Vec<CommandOutcome> {
        self.registry.write().await.register_all(commands)
    }

    /// Removes the command registered under the same identifier.
    pub async fn deregister(&self, command: &dyn BotCommand) -> bool {
        self.registry.write().await.deregister(command)
    }

    /// Removes several commands, reporting the outcome for each.
    pub async fn deregister_all(
        &self,
        commands: impl IntoIterator<Item = Arc<dyn BotCommand>> + Send,
    ) -> Vec<CommandOutcome> {
        self.registry.write().await.deregister_all(commands)
    }

    /// Snapshot of the registered commands, ordered by identifier.
    pub async fn registered_commands(&self) -> Vec<Arc<dyn BotCommand>> {
        self.registry.read().await.registered_commands()
    }

    /// Looks up a command by its exact identifier.
    pub async fn registered_command(&self, identifier: &str) -> Option<Arc<dyn BotCommand>> {
        self.registry.read().await.registered_command(identifier)
    }

    /// Installs or replaces the fallback for unknown commands.
    ///
    /// Once installed, unknown commands no longer reach the handler's
    /// `process_invalid_command_update` or `process_non_command_update`.
    pub async fn register_default_action(&self, action: Arc<dyn DefaultAction>) {
        self.registry.write().await.register_default_action(action);
    }

    /// Executes the command a message names.
    ///
    /// The registry lock is released before the command runs.
    pub async fn execute_command(&self, sender: &dyn Sender, message: &Message) -> bool {
        let invocation = self.registry.read().await.resolve(message);

        match invocation {
            Some(invocation) => {
                invocation.run(sender, message).await;
                true
            }
            None => false,
        }
    }

    /// Username of the bot, without the leading `@`.
    #[must_use]
    pub fn bot_username(&self) -> &str {
        &self.bot_username
    }
}

#[async_trait]
impl<H: UpdateHandler> LongPollingBot for CommandBot<H> {
    async fn on_update_received(&self, update: Update) {
        let sender = self.sender.as_ref();

        if let Some(message) = update.message.as_ref()
            && message.is_command()
            && !self.handler.filter(message)
        {
            if !self.execute_command(sender, message).await {
                debug!("Update {} is an unknown command", update.update_id);
                self.handler
                    .process_invalid_command_update(sender, update)
                    .await;
            }
            return;
        }

        self.handler.process_non_command_update(sender, update).await;
    }

    fn bot_username(&self) -> &str {
        &self.bot_username
    }

    fn sender(&self) -> &dyn Sender {
        self.sender.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::commands::basic::EchoCommand;
    use crate::commands::help::HelpCommand;
    use crate::telegram::{Chat, SendMessage};
    use crate::testing::{RecordingSender, text_update};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Seen {
        NonCommand(i64),
        Invalid(i64),
    }

    /// Records which hook saw which update.
    #[derive(Default)]
    struct RecordingHandler {
        seen: Mutex<Vec<Seen>>,
        override_invalid: bool,
        ignore_groups: bool,
    }

    impl RecordingHandler {
        fn seen(&self) -> Vec<Seen> {
            self.seen.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl UpdateHandler for RecordingHandler {
        async fn process_non_command_update(&self, _sender: &dyn Sender, update: Update) {
            self.seen
                .lock()
                .unwrap()
                .push(Seen::NonCommand(update.update_id));
        }

        async fn process_invalid_command_update(&self, sender: &dyn Sender, update: Update) {
            if self.override_invalid {
                self.seen.lock().unwrap().push(Seen::Invalid(update.update_id));
            } else {
                self.process_non_command_update(sender, update).await;
            }
        }

        fn filter(&self, message: &Message) -> bool {
            self.ignore_groups && message.chat.is_group_chat()
        }
    }

    struct SilentDefault;

    #[async_trait]
    impl DefaultAction for SilentDefault {
        async fn handle(&self, sender: &dyn Sender, message: &Message) {
            let _ = sender
                .send_message(SendMessage::new(message.chat_id(), "unknown"))
                .await;
        }
    }

    fn bot(handler: RecordingHandler) -> (Arc<RecordingSender>, CommandBot<RecordingHandler>) {
        let sender = Arc::new(RecordingSender::default());
        let bot = CommandBot::new("test_bot", sender.clone(), handler);
        (sender, bot)
    }

    async fn bot_with_echo(
        handler: RecordingHandler,
    ) -> (Arc<RecordingSender>, CommandBot<RecordingHandler>) {
        let (sender, bot) = bot(handler);
        assert!(bot.register(Arc::new(EchoCommand::new().unwrap())).await);
        (sender, bot)
    }

    #[tokio::test]
    async fn test_registered_command_runs_handler_only() {
        let (sender, bot) = bot_with_echo(RecordingHandler::default()).await;

        bot.on_update_received(text_update(1, "/echo hi there")).await;

        assert_eq!(sender.texts(), vec!["hi there".to_owned()]);
        assert!(bot.handler().seen().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_defaults_to_non_command() {
        let (sender, bot) = bot_with_echo(RecordingHandler::default()).await;

        bot.on_update_received(text_update(2, "/nope")).await;

        assert_eq!(bot.handler().seen(), vec![Seen::NonCommand(2)]);
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_command_invalid_hook() {
        let handler = RecordingHandler {
            override_invalid: true,
            ..RecordingHandler::default()
        };
        let (_sender, bot) = bot_with_echo(handler).await;

        bot.on_update_received(text_update(3, "/nope")).await;

        assert_eq!(bot.handler().seen(), vec![Seen::Invalid(3)]);
    }

    #[tokio::test]
    async fn test_default_action_swallows_unknown_command() {
        let handler = RecordingHandler {
            override_invalid: true,
            ..RecordingHandler::default()
        };
        let (sender, bot) = bot_with_echo(handler).await;
        bot.register_default_action(Arc::new(SilentDefault)).await;

        bot.on_update_received(text_update(4, "/nope")).await;

        assert!(bot.handler().seen().is_empty());
        assert_eq!(sender.texts(), vec!["unknown".to_owned()]);
    }

    #[tokio::test]
    async fn test_filter_reclassifies_command() {
        let handler = RecordingHandler {
            ignore_groups: true,
            ..RecordingHandler::default()
        };
        let (sender, bot) = bot_with_echo(handler).await;

        let mut update = text_update(5, "/echo hi");
        if let Some(message) = update.message.as_mut() {
            message.chat = Chat::group(-100);
        }
        bot.on_update_received(update).await;

        assert_eq!(bot.handler().seen(), vec![Seen::NonCommand(5)]);
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_plain_text_is_non_command() {
        let (sender, bot) = bot_with_echo(RecordingHandler::default()).await;

        bot.on_update_received(text_update(6, "echo hi")).await;

        assert_eq!(bot.handler().seen(), vec![Seen::NonCommand(6)]);
        assert!(sender.sent().is_empty());
    }

    #[tokio::test]
    async fn test_update_without_message_is_non_command() {
        let (_sender, bot) = bot_with_echo(RecordingHandler::default()).await;
        bot.register_default_action(Arc::new(SilentDefault)).await;

        bot.on_update_received(Update::empty(7)).await;

        assert_eq!(bot.handler().seen(), vec![Seen::NonCommand(7)]);
    }

    #[tokio::test]
    async fn test_command_addressed_to_bot() {
        let (sender, bot) = bot_with_echo(RecordingHandler::default()).await;

        bot.on_update_received(text_update(8, "/echo@test_bot yo")).await;
        bot.on_update_received(text_update(9, "/echo@other_bot yo")).await;

        assert_eq!(sender.texts(), vec!["yo".to_owned()]);
        assert_eq!(bot.handler().seen(), vec![Seen::NonCommand(9)]);
    }

    #[tokio::test]
    async fn test_username_commands_disallowed() {
        let sender = Arc::new(RecordingSender::default());
        let bot = CommandBot::with_options(
            "test_bot",
            false,
            sender.clone(),
            RecordingHandler::default(),
        );
        bot.register(Arc::new(EchoCommand::new().unwrap())).await;

        bot.on_update_received(text_update(10, "/echo@test_bot yo")).await;

        assert!(sender.sent().is_empty());
        assert_eq!(bot.handler().seen(), vec![Seen::NonCommand(10)]);
    }

    #[tokio::test]
    async fn test_registry_passthrough() {
        let (_sender, bot) = bot(RecordingHandler::default());
        let echo: Arc<dyn BotCommand> = Arc::new(EchoCommand::new().unwrap());

        let outcomes = bot.register_all(vec![echo.clone(), echo.clone()]).await;
        assert_eq!(outcomes.iter().map(|(_, ok)| *ok).collect::<Vec<_>>(), vec![true, false]);
        assert!(bot.registered_command("echo").await.is_some());
        assert_eq!(bot.registered_commands().await.len(), 1);

        let outcomes = bot.deregister_all(vec![echo.clone(), echo.clone()]).await;
        assert_eq!(outcomes.iter().map(|(_, ok)| *ok).collect::<Vec<_>>(), vec![true, false]);
        assert!(!bot.deregister(echo.as_ref()).await);
        assert!(bot.registered_command("echo").await.is_none());
        assert_eq!(bot.bot_username(), "test_bot");
    }

    #[tokio::test]
    async fn test_help_reads_registry_while_dispatching() {
        let (sender, bot) = bot_with_echo(RecordingHandler::default()).await;
        let help = HelpCommand::new(bot.registry_handle()).unwrap();
        bot.register(Arc::new(help)).await;

        bot.on_update_received(text_update(11, "/help")).await;

        let texts = sender.texts();
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("<b>/echo</b>"));
        assert!(texts[0].contains("<b>/help</b>"));
    }

    #[tokio::test]
    async fn test_from_settings() {
        let settings = BotSettings {
            bot_username: "settings_bot".to_owned(),
            allow_commands_with_username: false,
            ..BotSettings::default()
        };
        let sender: Arc<dyn Sender> = Arc::new(RecordingSender::default());
        let bot = CommandBot::from_settings(&settings, sender, RecordingHandler::default());

        assert_eq!(LongPollingBot::bot_username(&bot), "settings_bot");
    }
}
