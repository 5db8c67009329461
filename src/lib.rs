//! Command Bot Library
//!
//! Command dispatch for long-polling Telegram bots.
//!
//! This crate provides:
//! - A command registry mapping `/command` identifiers to handlers
//! - A command bot that routes each update to a command or a fallback handler
//! - A polling driver feeding updates from any update source
//! - A console transport for running a bot locally

pub mod commands;
pub mod config;
pub mod console;
pub mod telegram;

#[cfg(test)]
mod testing;
