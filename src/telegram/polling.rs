//! Long-polling driver.
//!
//! The poller pulls batches of updates from an [`UpdateSource`] and hands
//! them, one at a time and in order, to a [`LongPollingBot`]:
//! 1. Request the next batch starting at the current offset
//! 2. Deliver every update, advancing the offset past its `update_id`
//! 3. Sleep for the poll interval after an empty batch
//! 4. Back off after a source error, stop when the source is closed
//!
//! The transport behind the source is not part of this crate.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{Sender, Update};

/// Errors reported by an [`UpdateSource`].
#[derive(Debug, Error)]
pub enum PollError {
    #[error("Update source closed")]
    Closed,

    #[error("Failed to fetch updates: {0}")]
    Source(String),
}

/// Receives platform updates.
#[async_trait]
pub trait LongPollingBot: Send + Sync {
    /// Called once per inbound update.
    async fn on_update_received(&self, update: Update);

    /// Username of the bot, without the leading `@`.
    fn bot_username(&self) -> &str;

    /// Capability used to send replies.
    fn sender(&self) -> &dyn Sender;
}

/// Supplies batches of updates.
#[async_trait]
pub trait UpdateSource: Send {
    /// Fetches the updates with `update_id >= offset`.
    ///
    /// An empty batch means nothing new has arrived yet.
    ///
    /// # Errors
    ///
    /// Returns [`PollError::Closed`] once no more updates will ever arrive.
    async fn next_batch(&mut self, offset: i64) -> Result<Vec<Update>, PollError>;
}

/// Messages that can be sent to a running poller.
#[derive(Debug, Clone)]
pub enum PollerMessage {
    /// Stop polling after the current update.
    Shutdown,
}

/// Drives a [`LongPollingBot`] from an [`UpdateSource`].
#[derive(Debug, Clone)]
pub struct Poller {
    /// Pause after an empty batch.
    poll_interval: Duration,

    /// Pause after a failed fetch.
    error_backoff: Duration,
}

impl Default for Poller {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

impl Poller {
    /// Creates a poller with the given idle interval.
    #[must_use]
    pub const fn new(poll_interval: Duration) -> Self {
        Self {
            poll_interval,
            error_backoff: Duration::from_secs(5),
        }
    }

    /// Sets the pause used after a source error.
    #[must_use]
    pub const fn with_error_backoff(mut self, backoff: Duration) -> Self {
        self.error_backoff = backoff;
        self
    }

    /// Runs until shutdown is requested or the source closes.
    ///
    /// Returns the number of delivered updates.
    pub async fn run<B, S>(
        &self,
        bot: &B,
        source: &mut S,
        mut rx: mpsc::Receiver<PollerMessage>,
    ) -> u64
    where
        B: LongPollingBot + ?Sized,
        S: UpdateSource + ?Sized,
    {
        info!("Polling started for @{}", bot.bot_username());

        let mut offset = 0_i64;
        let mut delivered = 0_u64;

        loop {
            let batch = tokio::select! {
                biased;
                msg = rx.recv() => {
                    match msg {
                        Some(PollerMessage::Shutdown) | None => {
                            info!("Poller shutting down");
                            break;
                        }
                    }
                }
                batch = source.next_batch(offset) => batch,
            };

            let pause = match batch {
                Ok(updates) if updates.is_empty() => self.poll_interval,
                Ok(updates) => {
                    debug!("Received {} updates at offset {}", updates.len(), offset);
                    for update in updates {
                        offset = offset.max(update.update_id.saturating_add(1));
                        bot.on_update_received(update).await;
                        delivered += 1;
                    }
                    continue;
                }
                Err(PollError::Closed) => {
                    info!("Update source closed");
                    break;
                }
                Err(e) => {
                    warn!("{}. Retrying in {:?}", e, self.error_backoff);
                    self.error_backoff
                }
            };

            tokio::select! {
                biased;
                msg = rx.recv() => {
                    match msg {
                        Some(PollerMessage::Shutdown) | None => {
                            info!("Poller shutting down");
                            break;
                        }
                    }
                }
                () = sleep(pause) => {}
            }
        }

        info!("Polling stopped after {} updates", delivered);
        delivered
    }
}
