//! Test doubles shared by the unit tests.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::telegram::{Chat, Message, SendError, SendMessage, Sender, Update, User};

/// Sender that records every request.
#[derive(Debug, Default)]
pub struct RecordingSender {
    sent: Mutex<Vec<SendMessage>>,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<SendMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.text).collect()
    }
}

#[async_trait]
impl Sender for RecordingSender {
    async fn send_message(&self, request: SendMessage) -> Result<(), SendError> {
        self.sent.lock().unwrap().push(request);
        Ok(())
    }
}

/// Sender whose every request fails.
#[derive(Debug, Default)]
pub struct FailingSender;

#[async_trait]
impl Sender for FailingSender {
    async fn send_message(&self, _request: SendMessage) -> Result<(), SendError> {
        Err(SendError::Transport("connection reset".to_owned()))
    }
}

pub fn text_message(text: &str) -> Message {
    Message::text_message(1, Chat::private(100), Some(User::new(7, "Tester")), text)
}

pub fn text_update(update_id: i64, text: &str) -> Update {
    Update::with_message(update_id, text_message(text))
}
