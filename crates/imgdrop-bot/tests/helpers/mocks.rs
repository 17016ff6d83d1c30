//! In-memory stand-ins for the chat transport, file source, image host and roster store.

use async_trait::async_trait;
use imgdrop_bot::transport::{
    ChatChannel, FileSource, InlineButton, Incoming, MessageRef, TransportError,
    TransportResult, UpdateBatch, UpdateSource,
};
use imgdrop_bot::RosterStore;
use imgdrop_core::{FileRef, MetadataMap, RosterError, UploadOutcome};
use imgdrop_storage::{HostError, HostResult, ImageHost};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::Mutex;

/// Everything the bot did on the chat side, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatEvent {
    Sent {
        chat_id: i64,
        message_id: i64,
        text: String,
    },
    Prompt {
        chat_id: i64,
        message_id: i64,
        text: String,
        buttons: Vec<InlineButton>,
    },
    Edited {
        message_id: i64,
        text: String,
    },
    Answered(String),
}

#[derive(Default)]
pub struct RecordingChat {
    events: Mutex<Vec<ChatEvent>>,
    next_id: AtomicI64,
    failing_sends: AtomicUsize,
}

impl RecordingChat {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(100),
            ..Self::default()
        }
    }

    /// Make the next `count` `send_text` calls fail.
    pub fn fail_next_sends(&self, count: usize) {
        self.failing_sends.store(count, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<ChatEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Texts the user can see: sent messages, prompts and edits, in order.
    pub fn texts(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ChatEvent::Sent { text, .. }
                | ChatEvent::Prompt { text, .. }
                | ChatEvent::Edited { text, .. } => Some(text),
                ChatEvent::Answered(_) => None,
            })
            .collect()
    }

    pub fn last_text(&self) -> Option<String> {
        self.texts().pop()
    }

    pub fn last_prompt(&self) -> Option<MessageRef> {
        self.events().into_iter().rev().find_map(|event| match event {
            ChatEvent::Prompt {
                chat_id,
                message_id,
                ..
            } => Some(MessageRef {
                chat_id,
                message_id,
            }),
            _ => None,
        })
    }

    fn record(&self, event: ChatEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[async_trait]
impl ChatChannel for RecordingChat {
    async fn send_text(&self, chat_id: i64, text: &str) -> TransportResult<MessageRef> {
        let failing = self
            .failing_sends
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(TransportError::Http("send failed".to_string()));
        }

        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.record(ChatEvent::Sent {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(MessageRef {
            chat_id,
            message_id,
        })
    }

    async fn send_prompt(
        &self,
        chat_id: i64,
        text: &str,
        buttons: &[InlineButton],
    ) -> TransportResult<MessageRef> {
        let message_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.record(ChatEvent::Prompt {
            chat_id,
            message_id,
            text: text.to_string(),
            buttons: buttons.to_vec(),
        });
        Ok(MessageRef {
            chat_id,
            message_id,
        })
    }

    async fn edit_text(&self, message: &MessageRef, text: &str) -> TransportResult<()> {
        self.record(ChatEvent::Edited {
            message_id: message.message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> TransportResult<()> {
        self.record(ChatEvent::Answered(callback_id.to_string()));
        Ok(())
    }
}

/// Serves registered payloads and records which references were resolved.
#[derive(Default)]
pub struct MockFiles {
    files: Mutex<HashMap<String, Vec<u8>>>,
    resolved: Mutex<Vec<FileRef>>,
    hanging: AtomicBool,
}

impl MockFiles {
    /// Make every later resolve wait forever.
    pub fn hang(&self) {
        self.hanging.store(true, Ordering::SeqCst);
    }

    pub fn insert(&self, file_id: &str, data: Vec<u8>) {
        self.files.lock().unwrap().insert(file_id.to_string(), data);
    }

    pub fn resolved(&self) -> Vec<FileRef> {
        self.resolved.lock().unwrap().clone()
    }
}

#[async_trait]
impl FileSource for MockFiles {
    async fn resolve_file(&self, file: &FileRef) -> TransportResult<String> {
        self.resolved.lock().unwrap().push(file.clone());
        if self.hanging.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.files.lock().unwrap().contains_key(file.as_str()) {
            Ok(format!("files/{}", file))
        } else {
            Err(TransportError::Api {
                code: 400,
                description: "Bad Request: invalid file_id".to_string(),
            })
        }
    }

    async fn fetch(&self, path: &str) -> TransportResult<Vec<u8>> {
        let file_id = path.trim_start_matches("files/");
        self.files
            .lock()
            .unwrap()
            .get(file_id)
            .cloned()
            .ok_or_else(|| TransportError::Http("404 Not Found".to_string()))
    }
}

/// Recorded call to [`MockHost::upload`].
#[derive(Debug, Clone)]
pub struct HostCall {
    pub owner_id: i64,
    pub size_bytes: usize,
    pub metadata: MetadataMap,
}

/// Image host returning a canned response.
pub struct MockHost {
    response: Mutex<Option<HostResult<UploadOutcome>>>,
    calls: Mutex<Vec<HostCall>>,
    hanging: bool,
}

impl MockHost {
    pub fn succeeding(variants: &[&str]) -> Self {
        Self::with_outcome(UploadOutcome {
            id: "img-1".to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
            success: true,
            errors: Vec::new(),
        })
    }

    pub fn rejecting(errors: &[&str]) -> Self {
        Self::with_outcome(UploadOutcome {
            id: String::new(),
            variants: Vec::new(),
            success: false,
            errors: errors.iter().map(|e| e.to_string()).collect(),
        })
    }

    pub fn failing(err: HostError) -> Self {
        Self {
            response: Mutex::new(Some(Err(err))),
            calls: Mutex::new(Vec::new()),
            hanging: false,
        }
    }

    /// Records the call, then never answers.
    pub fn hanging() -> Self {
        Self {
            response: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
            hanging: true,
        }
    }

    fn with_outcome(outcome: UploadOutcome) -> Self {
        Self {
            response: Mutex::new(Some(Ok(outcome))),
            calls: Mutex::new(Vec::new()),
            hanging: false,
        }
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageHost for MockHost {
    async fn upload(
        &self,
        data: Vec<u8>,
        owner_id: i64,
        metadata: &MetadataMap,
    ) -> HostResult<UploadOutcome> {
        self.calls.lock().unwrap().push(HostCall {
            owner_id,
            size_bytes: data.len(),
            metadata: metadata.clone(),
        });
        if self.hanging {
            std::future::pending::<()>().await;
        }

        let mut response = self.response.lock().unwrap();
        match response.as_ref() {
            Some(Ok(outcome)) => Ok(outcome.clone()),
            // Errors are not Clone; hand out the configured one once.
            Some(Err(_)) => response
                .take()
                .unwrap_or_else(|| Err(HostError::RequestFailed("exhausted".to_string()))),
            None => Err(HostError::RequestFailed("exhausted".to_string())),
        }
    }

    fn host_name(&self) -> &'static str {
        "mock"
    }
}

/// Roster store keeping the saved list in memory.
#[derive(Default)]
pub struct MemoryRosterStore {
    saved: Mutex<Option<Vec<i64>>>,
}

impl MemoryRosterStore {
    pub fn saved(&self) -> Option<Vec<i64>> {
        self.saved.lock().unwrap().clone()
    }
}

#[async_trait]
impl RosterStore for MemoryRosterStore {
    async fn load(&self) -> Result<Option<Vec<i64>>, RosterError> {
        Ok(self.saved())
    }

    async fn save(&self, users: &[i64]) -> Result<(), RosterError> {
        *self.saved.lock().unwrap() = Some(users.to_vec());
        Ok(())
    }
}

/// Update feed serving queued batches, then idling until cancelled.
#[derive(Default)]
pub struct ScriptedUpdates {
    batches: Mutex<VecDeque<TransportResult<UpdateBatch>>>,
    offsets: Mutex<Vec<i64>>,
}

impl ScriptedUpdates {
    pub fn push(&self, batch: TransportResult<Vec<Incoming>>) {
        self.push_batch(batch.map(UpdateBatch::from_events));
    }

    pub fn push_batch(&self, batch: TransportResult<UpdateBatch>) {
        self.batches.lock().unwrap().push_back(batch);
    }

    pub fn offsets(&self) -> Vec<i64> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl UpdateSource for ScriptedUpdates {
    async fn next_updates(&self, offset: i64) -> TransportResult<UpdateBatch> {
        self.offsets.lock().unwrap().push(offset);
        let next = self.batches.lock().unwrap().pop_front();
        match next {
            Some(batch) => batch,
            None => std::future::pending().await,
        }
    }
}
