//! Chat transport abstraction
//!
//! The bot core only talks to the messaging service through these traits, so the
//! upload pipeline can be driven by in-memory fakes in tests.

pub mod telegram;

pub use telegram::TelegramClient;

use async_trait::async_trait;
use imgdrop_core::{CallerIdentity, FileRef};
use std::time::Duration;
use thiserror::Error;

/// Transport operation errors
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error {code}: {description}")]
    Api { code: i64, description: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;

/// A message previously sent by the bot, addressable for edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

/// Inline keyboard button carrying a callback payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Payload of an inbound update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateKind {
    /// `/name arg1 arg2`; the name is lowercased and stripped of any `@bot` suffix.
    Command { name: String, args: Vec<String> },
    Text(String),
    /// Lossy photo; the reference points at the largest available size.
    Photo { file: FileRef },
    Document {
        file: FileRef,
        mime_type: Option<String>,
        file_name: Option<String>,
    },
    Callback {
        id: String,
        data: String,
        message: Option<MessageRef>,
    },
}

/// One inbound event together with who sent it and where to answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub update_id: i64,
    pub chat_id: i64,
    pub caller: CallerIdentity,
    pub kind: UpdateKind,
}

/// Result of one poll.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBatch {
    /// Highest update id in the poll, counting updates that were skipped.
    pub last_update_id: Option<i64>,
    pub events: Vec<Incoming>,
}

impl UpdateBatch {
    /// Batch whose events are every update it saw.
    pub fn from_events(events: Vec<Incoming>) -> Self {
        Self {
            last_update_id: events.iter().map(|event| event.update_id).max(),
            events,
        }
    }

    /// Offset acknowledging everything in this batch.
    pub fn next_offset(&self, current: i64) -> i64 {
        self.last_update_id.map_or(current, |last| current.max(last + 1))
    }
}

impl UpdateKind {
    /// Classify a text message as a command or plain text.
    pub fn from_text(text: &str) -> Self {
        let trimmed = text.trim();
        let Some(rest) = trimmed.strip_prefix('/') else {
            return UpdateKind::Text(text.to_string());
        };

        let mut parts = rest.split_whitespace();
        let head = parts.next().unwrap_or_default();
        let name = head.split('@').next().unwrap_or_default().to_lowercase();
        if name.is_empty() {
            return UpdateKind::Text(text.to_string());
        }

        UpdateKind::Command {
            name,
            args: parts.map(str::to_string).collect(),
        }
    }
}

/// Outbound messaging primitives
#[async_trait]
pub trait ChatChannel: Send + Sync {
    async fn send_text(&self, chat_id: i64, text: &str) -> TransportResult<MessageRef>;

    /// Send `text` with one row of inline buttons.
    async fn send_prompt(
        &self,
        chat_id: i64,
        text: &str,
        buttons: &[InlineButton],
    ) -> TransportResult<MessageRef>;

    /// Replace the text of a previously sent message. Any inline keyboard is removed.
    async fn edit_text(&self, message: &MessageRef, text: &str) -> TransportResult<()>;

    async fn answer_callback(&self, callback_id: &str) -> TransportResult<()>;
}

/// File retrieval primitives
#[async_trait]
pub trait FileSource: Send + Sync {
    /// Resolve a file reference into a downloadable path.
    async fn resolve_file(&self, file: &FileRef) -> TransportResult<String>;

    /// Download the whole file into memory.
    async fn fetch(&self, path: &str) -> TransportResult<Vec<u8>>;
}

/// Inbound update feed
#[async_trait]
pub trait UpdateSource: Send + Sync {
    /// Long-poll for updates with `update_id >= offset`.
    async fn next_updates(&self, offset: i64) -> TransportResult<UpdateBatch>;
}
