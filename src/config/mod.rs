//! Configuration module for the command bot.
//!
//! Loads bot settings from the environment or a JSON file.

mod settings;

pub use settings::{BotSettings, ConfigError};
