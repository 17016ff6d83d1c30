//! Upload orchestrator
//!
//! Drives one submission through `Received -> Downloading -> Validating -> Uploading
//! -> Done`. The first failing stage ends the run; nothing is retried. Progress is
//! reported by editing a single status message. When that message could not be sent,
//! only the terminal outcome is delivered, as a fresh message.

use imgdrop_core::{
    AppError, CallerIdentity, ErrorMetadata, FileRef, LogLevel, ValidationError, ValidationResult,
};
use imgdrop_processing::ImageValidator;
use imgdrop_storage::ImageHost;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::messages;
use crate::transport::{ChatChannel, FileSource, MessageRef, TransportError};

/// Stage at which a submission can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Downloading,
    Validating,
    Uploading,
}

impl Stage {
    fn headline(self) -> &'static str {
        match self {
            Stage::Downloading => "Download failed",
            Stage::Validating => "Validation failed",
            Stage::Uploading => "Upload failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Downloading => "downloading",
            Stage::Validating => "validating",
            Stage::Uploading => "uploading",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a single submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadState {
    Received,
    Downloading,
    Validating,
    Uploading,
    Done { url: String },
    Failed { stage: Stage },
    /// Only reachable from the photo confirmation prompt.
    Cancelled,
}

impl fmt::Display for UploadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadState::Received => f.write_str("received"),
            UploadState::Downloading => f.write_str("downloading"),
            UploadState::Validating => f.write_str("validating"),
            UploadState::Uploading => f.write_str("uploading"),
            UploadState::Done { .. } => f.write_str("done"),
            UploadState::Failed { stage } => write!(f, "failed({})", stage),
            UploadState::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Terminal failure of a submission.
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {error}")]
pub struct PipelineFailure {
    pub stage: Stage,
    pub error: AppError,
}

impl PipelineFailure {
    fn new(stage: Stage, error: impl Into<AppError>) -> Self {
        Self {
            stage,
            error: error.into(),
        }
    }

    /// Text shown to the caller.
    pub fn user_message(&self) -> String {
        messages::failure(self.stage.headline(), &self.error)
    }
}

/// Status message of one run.
struct Progress<'a> {
    chat: &'a dyn ChatChannel,
    chat_id: i64,
    status: Option<MessageRef>,
}

impl Progress<'_> {
    async fn update(&self, text: &str) {
        let Some(status) = &self.status else {
            return;
        };
        if let Err(e) = self.chat.edit_text(status, text).await {
            tracing::debug!(error = %e, "Failed to update progress message");
        }
    }

    async fn finish(&self, text: &str) {
        if let Some(status) = &self.status {
            match self.chat.edit_text(status, text).await {
                Ok(()) => return,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Failed to edit status message, sending result instead"
                    );
                }
            }
        }

        if let Err(e) = self.chat.send_text(self.chat_id, text).await {
            tracing::error!(
                chat_id = self.chat_id,
                error = %e,
                "Failed to deliver upload result"
            );
        }
    }
}

fn download_error(err: TransportError) -> AppError {
    match err {
        TransportError::Timeout(after) => AppError::TimedOut {
            operation: "download",
            after,
        },
        other => AppError::DownloadFailed(other.to_string()),
    }
}

fn enter(caller: &CallerIdentity, state: &mut UploadState, next: UploadState) {
    tracing::debug!(
        caller_id = caller.id,
        from = %state,
        to = %next,
        "Upload state transition"
    );
    *state = next;
}

pub struct UploadPipeline {
    chat: Arc<dyn ChatChannel>,
    files: Arc<dyn FileSource>,
    host: Arc<dyn ImageHost>,
    validator: ImageValidator,
    timeout: Duration,
}

impl UploadPipeline {
    pub fn new(
        chat: Arc<dyn ChatChannel>,
        files: Arc<dyn FileSource>,
        host: Arc<dyn ImageHost>,
        validator: ImageValidator,
        timeout: Duration,
    ) -> Self {
        Self {
            chat,
            files,
            host,
            validator,
            timeout,
        }
    }

    /// Process one submission from an already authorized caller.
    ///
    /// Returns the canonical URL. Failures are reported to the chat before they are
    /// returned, so callers only need them for bookkeeping.
    pub async fn process(
        &self,
        chat_id: i64,
        caller: &CallerIdentity,
        file: &FileRef,
    ) -> Result<String, PipelineFailure> {
        let start = Instant::now();
        let status = match self.chat.send_text(chat_id, messages::DOWNLOADING).await {
            Ok(message) => Some(message),
            Err(e) => {
                tracing::error!(
                    caller_id = caller.id,
                    error = %e,
                    "Failed to send status message"
                );
                None
            }
        };
        let progress = Progress {
            chat: self.chat.as_ref(),
            chat_id,
            status,
        };

        let mut state = UploadState::Received;
        let result = self.run(&progress, caller, file, &mut state).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match &result {
            Ok(url) => {
                enter(caller, &mut state, UploadState::Done { url: url.clone() });
                tracing::info!(
                    caller_id = caller.id,
                    display_name = %caller.display_name,
                    file_ref = %file,
                    url = %url,
                    duration_ms,
                    "Upload completed"
                );
                progress.finish(&messages::upload_succeeded(url)).await;
            }
            Err(failure) => {
                enter(
                    caller,
                    &mut state,
                    UploadState::Failed {
                        stage: failure.stage,
                    },
                );
                log_failure(caller, file, failure, duration_ms);
                progress.finish(&failure.user_message()).await;
            }
        }

        result
    }

    async fn run(
        &self,
        progress: &Progress<'_>,
        caller: &CallerIdentity,
        file: &FileRef,
        state: &mut UploadState,
    ) -> Result<String, PipelineFailure> {
        enter(caller, state, UploadState::Downloading);
        let data = self
            .download(file)
            .await
            .map_err(|e| PipelineFailure::new(Stage::Downloading, e))?;
        tracing::debug!(caller_id = caller.id, size_bytes = data.len(), "Image downloaded");

        enter(caller, state, UploadState::Validating);
        progress.update(messages::VALIDATING).await;
        let (validation, data) = self
            .validate(data)
            .await
            .map_err(|e| PipelineFailure::new(Stage::Validating, e))?;

        enter(caller, state, UploadState::Uploading);
        progress.update(messages::UPLOADING).await;
        self.upload(data, caller, &validation)
            .await
            .map_err(|e| PipelineFailure::new(Stage::Uploading, e))
    }

    async fn download(&self, file: &FileRef) -> Result<Vec<u8>, AppError> {
        let fetch = async {
            let path = self.files.resolve_file(file).await?;
            self.files.fetch(&path).await
        };

        match tokio::time::timeout(self.timeout, fetch).await {
            Ok(result) => result.map_err(download_error),
            Err(_) => Err(AppError::TimedOut {
                operation: "download",
                after: self.timeout,
            }),
        }
    }

    /// Header decoding is CPU-bound; run it off the async workers.
    async fn validate(&self, data: Vec<u8>) -> Result<(ValidationResult, Vec<u8>), AppError> {
        let validator = self.validator.clone();
        let result = tokio::task::spawn_blocking(move || {
            validator.validate(&data).map(|result| (result, data))
        })
        .await
        .map_err(|e| {
            ValidationError::InvalidFormat(format!("validation task failed: {}", e))
        })?;

        Ok(result?)
    }

    async fn upload(
        &self,
        data: Vec<u8>,
        caller: &CallerIdentity,
        validation: &ValidationResult,
    ) -> Result<String, AppError> {
        let metadata = validation.forwarded_metadata();
        tracing::debug!(
            caller_id = caller.id,
            host = self.host.host_name(),
            format = validation.format(),
            width = validation.width(),
            height = validation.height(),
            metadata_bytes = metadata.serialized_len(),
            "Uploading image"
        );

        let outcome = match tokio::time::timeout(
            self.timeout,
            self.host.upload(data, caller.id, &metadata),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                return Err(AppError::TimedOut {
                    operation: "upload",
                    after: self.timeout,
                })
            }
        };

        outcome.canonical_url().map(str::to_string)
    }
}

fn log_failure(
    caller: &CallerIdentity,
    file: &FileRef,
    failure: &PipelineFailure,
    duration_ms: u64,
) {
    let error_code = failure.error.error_code();
    match failure.error.log_level() {
        LogLevel::Debug => tracing::debug!(
            caller_id = caller.id,
            file_ref = %file,
            stage = %failure.stage,
            error_code,
            error = %failure.error,
            duration_ms,
            "Upload rejected"
        ),
        LogLevel::Warn => tracing::warn!(
            caller_id = caller.id,
            file_ref = %file,
            stage = %failure.stage,
            error_code,
            error = %failure.error,
            duration_ms,
            "Upload failed"
        ),
        LogLevel::Error => tracing::error!(
            caller_id = caller.id,
            file_ref = %file,
            stage = %failure.stage,
            error_code,
            error = %failure.error,
            duration_ms,
            "Upload failed"
        ),
    }
}
