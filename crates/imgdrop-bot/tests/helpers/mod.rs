//! Test helpers: build a `Bot` wired to in-memory collaborators.
//!
//! Run from workspace root: `cargo test -p imgdrop-bot`.

#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;

use imgdrop_bot::{AuthGate, Bot, PendingUploads, UploadPipeline};
use imgdrop_processing::ImageValidator;
use std::sync::Arc;
use std::time::Duration;

use mocks::{MemoryRosterStore, MockFiles, MockHost, RecordingChat};

pub const ADMIN_ID: i64 = 1;
pub const AUTHORIZED_ID: i64 = 7;
pub const STRANGER_ID: i64 = 99;

pub const CANONICAL_URL: &str = "https://imagedelivery.net/hash/img-1/public";
pub const THUMB_URL: &str = "https://imagedelivery.net/hash/img-1/thumb";

/// Bot under test plus handles on every collaborator.
pub struct TestBot {
    pub bot: Arc<Bot>,
    pub chat: Arc<RecordingChat>,
    pub files: Arc<MockFiles>,
    pub host: Arc<MockHost>,
    pub pending: Arc<PendingUploads>,
    pub auth: Arc<AuthGate>,
    pub roster: Arc<MemoryRosterStore>,
}

impl TestBot {
    pub fn new(host: MockHost) -> Self {
        Self::with_timeout(host, Duration::from_secs(5))
    }

    /// Bot whose download and upload steps give up after `timeout`.
    pub fn with_timeout(host: MockHost, timeout: Duration) -> Self {
        let chat = Arc::new(RecordingChat::new());
        let files = Arc::new(MockFiles::default());
        let host = Arc::new(host);
        let pending = Arc::new(PendingUploads::new());
        let roster = Arc::new(MemoryRosterStore::default());
        let auth = Arc::new(AuthGate::new(ADMIN_ID, [AUTHORIZED_ID], roster.clone()));

        let pipeline = UploadPipeline::new(
            chat.clone(),
            files.clone(),
            host.clone(),
            ImageValidator::default(),
            timeout,
        );
        let bot = Arc::new(Bot::new(chat.clone(), auth.clone(), pending.clone(), pipeline));

        Self {
            bot,
            chat,
            files,
            host,
            pending,
            auth,
            roster,
        }
    }

    pub fn with_default_host() -> Self {
        Self::new(MockHost::succeeding(&[CANONICAL_URL, THUMB_URL]))
    }
}
