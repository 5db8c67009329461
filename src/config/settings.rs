//! Bot settings.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Bot-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BotSettings {
    /// Username of the bot, without the leading `@`.
    pub bot_username: String,

    /// Accept commands of the form `/command@bot_username`.
    #[serde(default = "default_allow_commands_with_username")]
    pub allow_commands_with_username: bool,

    /// Pause between polls when no updates arrived, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Log level for the application.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

const fn default_allow_commands_with_username() -> bool {
    true
}

const fn default_poll_interval_ms() -> u64 {
    500
}

fn default_log_level() -> String {
    "info".to_owned()
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            bot_username: "command_bot".to_owned(),
            allow_commands_with_username: default_allow_commands_with_username(),
            poll_interval_ms: default_poll_interval_ms(),
            log_level: default_log_level(),
        }
    }
}

impl BotSettings {
    /// Creates settings from environment variables.
    ///
    /// `BOT_USERNAME` is required; `ALLOW_COMMANDS_WITH_USERNAME`,
    /// `POLL_INTERVAL_MS` and `RUST_LOG` fall back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if `BOT_USERNAME` is missing or a value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Creates settings from environment variables, using defaults for
    /// anything missing or malformed.
    #[must_use]
    pub fn from_env_with_defaults() -> Self {
        Self::from_lookup_with_defaults(|var| std::env::var(var).ok())
    }

    /// Creates settings from a variable lookup.
    ///
    /// # Errors
    ///
    /// Returns an error if `BOT_USERNAME` is missing or a value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bot_username =
            lookup("BOT_USERNAME").ok_or(ConfigError::MissingEnvVar("BOT_USERNAME"))?;

        let allow_commands_with_username = match lookup("ALLOW_COMMANDS_WITH_USERNAME") {
            Some(value) => parse_bool(&value).ok_or(ConfigError::InvalidValue {
                var: "ALLOW_COMMANDS_WITH_USERNAME",
                value,
            })?,
            None => default_allow_commands_with_username(),
        };

        let poll_interval_ms = match lookup("POLL_INTERVAL_MS") {
            Some(value) => value.trim().parse().map_err(|_| ConfigError::InvalidValue {
                var: "POLL_INTERVAL_MS",
                value,
            })?,
            None => default_poll_interval_ms(),
        };

        let settings = Self {
            bot_username,
            allow_commands_with_username,
            poll_interval_ms,
            log_level: lookup("RUST_LOG").unwrap_or_else(default_log_level),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Like [`Self::from_lookup`], but never fails.
    #[must_use]
    pub fn from_lookup_with_defaults(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            bot_username: lookup("BOT_USERNAME")
                .map(|name| name.trim().trim_start_matches('@').to_owned())
                .filter(|name| !name.is_empty())
                .unwrap_or(defaults.bot_username),
            allow_commands_with_username: lookup("ALLOW_COMMANDS_WITH_USERNAME")
                .and_then(|value| parse_bool(&value))
                .unwrap_or(defaults.allow_commands_with_username),
            poll_interval_ms: lookup("POLL_INTERVAL_MS")
                .and_then(|value| value.trim().parse().ok())
                .unwrap_or(defaults.poll_interval_ms),
            log_level: lookup("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Loads settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed, or validated.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_json::from_str(&content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Saves settings to a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Checks that the username is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the username is empty or starts with `@`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_username.trim().is_empty() {
            return Err(ConfigError::EmptyUsername);
        }
        if self.bot_username.starts_with('@') {
            return Err(ConfigError::InvalidValue {
                var: "bot_username",
                value: self.bot_username.clone(),
            });
        }
        Ok(())
    }

    /// Pause between polls when idle.
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Log level to use, preferring an explicit override.
    #[must_use]
    pub fn effective_log_level<'a>(&'a self, cli: Option<&'a str>) -> &'a str {
        cli.unwrap_or(&self.log_level)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid value for {var}: '{value}'")]
    InvalidValue { var: &'static str, value: String },

    #[error("Bot username cannot be empty")]
    EmptyUsername,

    #[error("Failed to read configuration file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration file: {0}")]
    Parse(#[from] serde_json::Error),
}
