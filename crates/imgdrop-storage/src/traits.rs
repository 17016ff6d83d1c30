//! Image host abstraction trait
//!
//! This module defines the ImageHost trait that every remote image service must implement.

use async_trait::async_trait;
use imgdrop_core::{AppError, MetadataMap, UploadOutcome};
use std::time::Duration;
use thiserror::Error;

/// Image host operation errors
#[derive(Debug, Error)]
pub enum HostError {
    #[error("Upload request failed: {0}")]
    RequestFailed(String),

    #[error("Upload timed out after {0:?}")]
    Timeout(Duration),

    #[error("Invalid response (status {status}): {message}")]
    InvalidResponse { status: u16, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for image host operations
pub type HostResult<T> = Result<T, HostError>;

impl From<HostError> for AppError {
    fn from(err: HostError) -> Self {
        match err {
            HostError::Timeout(after) => AppError::TimedOut {
                operation: "upload",
                after,
            },
            other => AppError::UploadFailed(other.to_string()),
        }
    }
}

/// Remote image host
///
/// A response the host could parse but rejected (`success = false`) is returned as an
/// `Ok` outcome carrying the host's error messages; only transport failures and
/// unreadable responses are `HostError`s.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Upload `data` on behalf of `owner_id`.
    ///
    /// `metadata` must already be restricted to the forwarded keys.
    async fn upload(
        &self,
        data: Vec<u8>,
        owner_id: i64,
        metadata: &MetadataMap,
    ) -> HostResult<UploadOutcome>;

    /// Short name used in logs
    fn host_name(&self) -> &'static str;
}
