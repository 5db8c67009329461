//! Console transport.
//!
//! Stands in for a real platform connection: every input line becomes a text
//! message from one user in one private chat, and outgoing messages are
//! written as lines to an output stream.

use std::io::BufRead;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

use crate::telegram::{
    Chat, Message, PollError, SendError, SendMessage, Sender, Update, UpdateSource, User,
};

/// Chat ID used for console conversations.
pub const CONSOLE_CHAT_ID: i64 = 1;

/// Lines buffered between the reader and the source.
const LINE_BUFFER: usize = 16;

/// Turns input lines into message updates.
///
/// Lines arrive over a channel, so a reader blocked on input never holds up
/// the runtime.
pub struct ConsoleSource {
    lines: mpsc::Receiver<std::io::Result<String>>,
    user: User,
    next_id: i64,
}

impl ConsoleSource {
    /// Reads updates from standard input on a dedicated thread.
    ///
    /// The thread is detached; it ends at end of input or once the source is
    /// dropped and the next line arrives.
    #[must_use]
    pub fn stdin(user: User) -> Self {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);

        std::thread::spawn(move || {
            for line in std::io::stdin().lock().lines() {
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        });

        Self::from_receiver(rx, user)
    }

    /// Reads updates from an async reader on a spawned task.
    #[must_use]
    pub fn from_reader<R>(reader: R, user: User) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);

        tokio::spawn(async move {
            let mut lines = reader.lines();
            loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => Ok(line),
                    Ok(None) => break,
                    Err(e) => Err(e),
                };
                if tx.send(line).await.is_err() {
                    break;
                }
            }
        });

        Self::from_receiver(rx, user)
    }

    /// Uses lines delivered by some other producer.
    #[must_use]
    pub const fn from_receiver(lines: mpsc::Receiver<std::io::Result<String>>, user: User) -> Self {
        Self {
            lines,
            user,
            next_id: 1,
        }
    }
}

#[async_trait]
impl UpdateSource for ConsoleSource {
    async fn next_batch(&mut self, _offset: i64) -> Result<Vec<Update>, PollError> {
        let line = self
            .lines
            .recv()
            .await
            .ok_or(PollError::Closed)?
            .map_err(|e| PollError::Source(e.to_string()))?;

        let text = line.trim_end();
        if text.is_empty() {
            return Ok(Vec::new());
        }

        let update_id = self.next_id;
        self.next_id += 1;
        debug!("Console update {}: {}", update_id, text);

        let message = Message::text_message(
            update_id,
            Chat::private(CONSOLE_CHAT_ID),
            Some(self.user.clone()),
            text,
        );
        Ok(vec![Update::with_message(update_id, message)])
    }
}

/// Writes outgoing messages as lines.
pub struct ConsoleSender<W> {
    out: Mutex<W>,
}

impl ConsoleSender<tokio::io::Stdout> {
    /// Writes to standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W: AsyncWrite + Unpin + Send> ConsoleSender<W> {
    #[must_use]
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Sender for ConsoleSender<W> {
    async fn send_message(&self, request: SendMessage) -> Result<(), SendError> {
        if request.text.is_empty() {
            return Err(SendError::EmptyText);
        }
        if request.chat_id != CONSOLE_CHAT_ID {
            return Err(SendError::ChatNotFound(request.chat_id));
        }

        let line = format!("bot> {}\n", request.text.replace('\n', "\nbot> "));

        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes())
            .await
            .map_err(|e| SendError::Transport(e.to_string()))?;
        out.flush()
            .await
            .map_err(|e| SendError::Transport(e.to_string()))
    }
}
