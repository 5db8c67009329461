//! Command handling module.
//!
//! Maps `/command` messages to registered handlers and routes everything
//! else to a pluggable [`UpdateHandler`].

mod basic;
mod bot;
mod help;
mod registry;
mod types;

pub use basic::{EchoCommand, StartCommand};
pub use bot::{CommandBot, UpdateHandler};
pub use help::{HelpCommand, escape_html, render_command};
pub use registry::{CommandOutcome, CommandRegistry, DefaultAction, Invocation};
pub use types::{BotCommand, COMMAND_MAX_LENGTH, CommandError, CommandInfo, ParsedCommand};
