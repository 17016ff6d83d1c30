//! Pending-upload store
//!
//! One slot per caller holding the file reference of a photo waiting for the
//! confirm/cancel answer. A newer photo silently replaces an older one and entries
//! never expire.

use imgdrop_core::FileRef;
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct PendingUploads {
    slots: RwLock<HashMap<i64, FileRef>>,
}

impl PendingUploads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `file` for `caller_id`, returning the reference it replaced.
    pub async fn stash(&self, caller_id: i64, file: FileRef) -> Option<FileRef> {
        let replaced = self.slots.write().await.insert(caller_id, file);
        if let Some(previous) = &replaced {
            tracing::debug!(caller_id, replaced = %previous, "Pending upload overwritten");
        }
        replaced
    }

    /// Remove and return the pending reference in a single step.
    pub async fn take(&self, caller_id: i64) -> Option<FileRef> {
        self.slots.write().await.remove(&caller_id)
    }

    /// Discard the pending reference, if any. Returns whether one was present.
    pub async fn discard(&self, caller_id: i64) -> bool {
        self.slots.write().await.remove(&caller_id).is_some()
    }

    pub async fn peek(&self, caller_id: i64) -> Option<FileRef> {
        self.slots.read().await.get(&caller_id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.slots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.slots.read().await.is_empty()
    }
}
