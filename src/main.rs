//! Command Bot - Main Entry Point
//!
//! Runs a demo command bot on the console: each input line is delivered as a
//! message, replies are printed to standard output.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use command_bot::commands::{
    BotCommand, CommandBot, EchoCommand, HelpCommand, StartCommand, UpdateHandler,
};
use command_bot::config::BotSettings;
use command_bot::console::{ConsoleSender, ConsoleSource};
use command_bot::telegram::{Poller, PollerMessage, SendMessage, Sender, Update, User};

/// Demo bot with command dispatch.
#[derive(Parser, Debug)]
#[command(name = "command_bot")]
#[command(about = "Run a command bot on the console")]
#[command(version)]
struct Args {
    /// Path to a JSON settings file. Settings come from the environment when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Path to the .env file for environment variables.
    #[arg(long, default_value = ".env")]
    env_file: String,

    /// Bot username, overriding the configured one.
    #[arg(short, long)]
    username: Option<String>,

    /// Log level (trace, debug, info, warn, error). Defaults to the configured level.
    #[arg(short, long)]
    log_level: Option<String>,

    /// Write an example settings file and exit.
    #[arg(long)]
    generate_config: bool,
}

/// Answers plain text and unknown commands.
struct ConsoleHandler;

#[async_trait]
impl UpdateHandler for ConsoleHandler {
    async fn process_non_command_update(&self, sender: &dyn Sender, update: Update) {
        let Some(message) = update.message else {
            debug!("Ignoring update {} without message", update.update_id);
            return;
        };

        let reply = SendMessage::new(
            message.chat_id(),
            "I only understand commands. Try /help.",
        );
        if let Err(e) = sender.send_message(reply).await {
            warn!("Failed to reply: {}", e);
        }
    }

    async fn process_invalid_command_update(&self, sender: &dyn Sender, update: Update) {
        let Some(message) = update.message else {
            return;
        };

        let text = format!(
            "Unknown command: {}",
            message.text.as_deref().unwrap_or_default()
        );
        if let Err(e) = sender.send_message(SendMessage::new(message.chat_id(), text)).await {
            warn!("Failed to reply: {}", e);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.generate_config {
        return generate_example_config();
    }

    let dotenv = dotenvy::from_filename(&args.env_file);

    let mut settings = match &args.config {
        Some(path) => BotSettings::load_from_file(path)
            .with_context(|| format!("Failed to load settings from {path}"))?,
        None => match BotSettings::from_env() {
            Ok(settings) => settings,
            Err(_) if args.username.is_some() => BotSettings::from_env_with_defaults(),
            Err(e) => return Err(e).context("Failed to load settings from environment"),
        },
    };

    init_logging(settings.effective_log_level(args.log_level.as_deref()));
    if let Err(e) = dotenv {
        debug!("Could not load .env file ({}): {}", args.env_file, e);
    }

    if let Some(username) = args.username {
        settings.bot_username = username;
        settings.validate().context("Invalid bot username")?;
    }

    let sender: Arc<dyn Sender> = Arc::new(ConsoleSender::stdout());
    let bot = CommandBot::from_settings(&settings, sender, ConsoleHandler);

    let commands: Vec<Arc<dyn BotCommand>> = vec![
        Arc::new(StartCommand::new("Type /help to see what I can do.")?),
        Arc::new(EchoCommand::new()?),
        Arc::new(HelpCommand::new(bot.registry_handle())?),
    ];
    for (command, registered) in bot.register_all(commands).await {
        if !registered {
            warn!("Command /{} was not registered", command.identifier());
        }
    }

    info!("Starting @{}", settings.bot_username);
    info!("Type messages below. Use Ctrl+C or Ctrl+D to stop.");

    let (poller_tx, poller_rx) = mpsc::channel::<PollerMessage>(1);
    let mut source = ConsoleSource::stdin(User::new(1, "Console"));
    let poller = Poller::new(settings.poll_interval());

    let polling = poller.run(&bot, &mut source, poller_rx);
    tokio::pin!(polling);

    tokio::select! {
        delivered = &mut polling => {
            info!("Input closed after {} updates", delivered);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
            let _ = poller_tx.send(PollerMessage::Shutdown).await;
            let delivered = polling.await;
            info!("Handled {} updates", delivered);
        }
    }

    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Writes an example settings file.
fn generate_example_config() -> Result<()> {
    let example = BotSettings {
        bot_username: "my_command_bot".to_owned(),
        ..BotSettings::default()
    };
    example.save_to_file("settings.example.json")?;

    println!("✓ Example settings written to: settings.example.json");
    println!("\nTo use this bot:");
    println!("1. Copy settings.example.json to settings.json");
    println!("2. Set bot_username to your bot's username");
    println!("3. Run: command_bot --config settings.json");

    Ok(())
}
