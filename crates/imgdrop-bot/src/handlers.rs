//! Update dispatch
//!
//! Errors never escape a handler: each one is logged and answered in the chat.

use imgdrop_core::constants::{
    CALLBACK_CANCEL_UPLOAD, CALLBACK_CONFIRM_UPLOAD, IMAGE_MIME_PREFIX,
};
use imgdrop_core::{AppError, CallerIdentity, ErrorMetadata, FileRef};
use std::sync::Arc;

use crate::auth::AuthGate;
use crate::messages;
use crate::orchestrator::{UploadPipeline, UploadState};
use crate::pending::PendingUploads;
use crate::transport::{ChatChannel, InlineButton, Incoming, MessageRef, UpdateKind};

/// Roster mutation requested through a chat command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RosterCommand {
    Auth,
    Unauth,
}

impl RosterCommand {
    fn name(self) -> &'static str {
        match self {
            RosterCommand::Auth => "auth",
            RosterCommand::Unauth => "unauth",
        }
    }
}

pub struct Bot {
    chat: Arc<dyn ChatChannel>,
    auth: Arc<AuthGate>,
    pending: Arc<PendingUploads>,
    pipeline: UploadPipeline,
}

impl Bot {
    pub fn new(
        chat: Arc<dyn ChatChannel>,
        auth: Arc<AuthGate>,
        pending: Arc<PendingUploads>,
        pipeline: UploadPipeline,
    ) -> Self {
        Self {
            chat,
            auth,
            pending,
            pipeline,
        }
    }

    pub async fn handle(&self, update: Incoming) {
        let Incoming {
            chat_id,
            caller,
            kind,
            ..
        } = update;

        match kind {
            UpdateKind::Command { name, args } => match name.as_str() {
                "start" | "help" => self.handle_start(chat_id, &caller).await,
                "auth" => {
                    self.handle_roster_command(chat_id, &caller, RosterCommand::Auth, &args)
                        .await
                }
                "unauth" => {
                    self.handle_roster_command(chat_id, &caller, RosterCommand::Unauth, &args)
                        .await
                }
                other => {
                    tracing::debug!(
                        caller_id = caller.id,
                        command = other,
                        "Ignoring unknown command"
                    );
                }
            },
            UpdateKind::Text(_) => {
                tracing::debug!(caller_id = caller.id, "Ignoring plain text message");
            }
            UpdateKind::Photo { file } => self.handle_photo(chat_id, &caller, file).await,
            UpdateKind::Document {
                file, mime_type, ..
            } => {
                self.handle_document(chat_id, &caller, file, mime_type.as_deref())
                    .await
            }
            UpdateKind::Callback { id, data, message } => {
                self.handle_callback(chat_id, &caller, &id, &data, message)
                    .await
            }
        }
    }

    async fn reply(&self, chat_id: i64, text: &str) {
        if let Err(e) = self.chat.send_text(chat_id, text).await {
            tracing::error!(chat_id, error = %e, "Failed to send message");
        }
    }

    /// Edit the prompt a callback came from, or send a new message when it is gone.
    async fn answer_prompt(&self, chat_id: i64, prompt: Option<MessageRef>, text: &str) {
        match prompt {
            Some(message) => {
                if let Err(e) = self.chat.edit_text(&message, text).await {
                    tracing::warn!(chat_id, error = %e, "Failed to edit prompt");
                }
            }
            None => self.reply(chat_id, text).await,
        }
    }

    async fn authorize(&self, caller: &CallerIdentity, action: &'static str) -> bool {
        if self.auth.is_authorized(caller.id).await {
            return true;
        }

        let err = AppError::Unauthorized;
        tracing::warn!(
            caller_id = caller.id,
            display_name = %caller.display_name,
            action,
            error_code = err.error_code(),
            "Unauthorized access attempt"
        );
        false
    }

    async fn handle_start(&self, chat_id: i64, caller: &CallerIdentity) {
        tracing::info!(
            caller_id = caller.id,
            display_name = %caller.display_name,
            action = "command_start",
            "User action"
        );

        if self.authorize(caller, "command_start").await {
            self.reply(chat_id, messages::WELCOME).await;
        } else {
            self.reply(chat_id, messages::UNAUTHORIZED).await;
        }
    }

    async fn handle_roster_command(
        &self,
        chat_id: i64,
        caller: &CallerIdentity,
        command: RosterCommand,
        args: &[String],
    ) {
        let action = match command {
            RosterCommand::Auth => "command_auth",
            RosterCommand::Unauth => "command_unauth",
        };
        tracing::info!(
            caller_id = caller.id,
            display_name = %caller.display_name,
            action,
            "User action"
        );

        if !self.auth.is_admin(caller.id) {
            tracing::warn!(caller_id = caller.id, action, "Non-admin attempted admin command");
            self.reply(chat_id, messages::ADMIN_ONLY).await;
            return;
        }

        let [target] = args else {
            self.reply(chat_id, &messages::usage(command.name())).await;
            return;
        };

        let Ok(target_id) = target.parse::<i64>() else {
            tracing::debug!(caller_id = caller.id, input = %target, "Invalid user ID");
            self.reply(chat_id, messages::INVALID_USER_ID).await;
            return;
        };

        let result = match command {
            RosterCommand::Auth => self.auth.add_authorized(target_id).await,
            RosterCommand::Unauth => self.auth.remove_authorized(target_id).await,
        };

        match result {
            Ok(()) => {
                tracing::info!(caller_id = caller.id, target_id, action, "Roster updated");
                let text = match command {
                    RosterCommand::Auth => messages::user_added(target_id),
                    RosterCommand::Unauth => messages::user_removed(target_id),
                };
                self.reply(chat_id, &text).await;
            }
            Err(e) => {
                let err = AppError::from(e);
                tracing::warn!(
                    caller_id = caller.id,
                    target_id,
                    action,
                    error_code = err.error_code(),
                    error = %err,
                    "Roster update failed"
                );
                self.reply(chat_id, &messages::operation_failed(&err)).await;
            }
        }
    }

    async fn handle_photo(&self, chat_id: i64, caller: &CallerIdentity, file: FileRef) {
        tracing::info!(
            caller_id = caller.id,
            display_name = %caller.display_name,
            action = "send_photo",
            "User action"
        );

        if !self.authorize(caller, "send_photo").await {
            self.reply(chat_id, messages::UNAUTHORIZED).await;
            return;
        }

        tracing::debug!(
            caller_id = caller.id,
            file_ref = %file,
            "Stashing photo for confirmation"
        );
        self.pending.stash(caller.id, file).await;

        let buttons = [
            InlineButton::new(messages::BUTTON_CONFIRM, CALLBACK_CONFIRM_UPLOAD),
            InlineButton::new(messages::BUTTON_CANCEL, CALLBACK_CANCEL_UPLOAD),
        ];
        if let Err(e) = self
            .chat
            .send_prompt(chat_id, messages::PHOTO_PROMPT, &buttons)
            .await
        {
            tracing::error!(
                caller_id = caller.id,
                error = %e,
                "Failed to send confirmation prompt"
            );
        }
    }

    async fn handle_document(
        &self,
        chat_id: i64,
        caller: &CallerIdentity,
        file: FileRef,
        mime_type: Option<&str>,
    ) {
        tracing::info!(
            caller_id = caller.id,
            display_name = %caller.display_name,
            action = "send_document",
            "User action"
        );

        if !self.authorize(caller, "send_document").await {
            self.reply(chat_id, messages::UNAUTHORIZED).await;
            return;
        }

        let mime_type = mime_type.unwrap_or_default();
        if !mime_type.starts_with(IMAGE_MIME_PREFIX) {
            let err = AppError::UnsupportedType(mime_type.to_string());
            tracing::info!(
                caller_id = caller.id,
                mime_type,
                error_code = err.error_code(),
                "Non-image document rejected"
            );
            self.reply(chat_id, messages::UNSUPPORTED_TYPE).await;
            return;
        }

        // Failures are already reported to the chat by the pipeline.
        let _ = self.pipeline.process(chat_id, caller, &file).await;
    }

    async fn handle_callback(
        &self,
        chat_id: i64,
        caller: &CallerIdentity,
        callback_id: &str,
        data: &str,
        prompt: Option<MessageRef>,
    ) {
        if let Err(e) = self.chat.answer_callback(callback_id).await {
            tracing::debug!(caller_id = caller.id, error = %e, "Failed to answer callback");
        }
        tracing::debug!(caller_id = caller.id, data, "Received callback");

        match data {
            CALLBACK_CONFIRM_UPLOAD => self.confirm_upload(chat_id, caller, prompt).await,
            CALLBACK_CANCEL_UPLOAD => {
                tracing::info!(
                    caller_id = caller.id,
                    display_name = %caller.display_name,
                    action = "cancel_upload",
                    "User action"
                );
                let had_pending = self.pending.discard(caller.id).await;
                tracing::debug!(
                    caller_id = caller.id,
                    had_pending,
                    state = %UploadState::Cancelled,
                    "Pending upload discarded"
                );
                self.answer_prompt(chat_id, prompt, messages::UPLOAD_CANCELLED)
                    .await;
            }
            other => {
                tracing::warn!(caller_id = caller.id, data = other, "Unknown callback");
                self.answer_prompt(chat_id, prompt, messages::UNKNOWN_ACTION)
                    .await;
            }
        }
    }

    async fn confirm_upload(
        &self,
        chat_id: i64,
        caller: &CallerIdentity,
        prompt: Option<MessageRef>,
    ) {
        tracing::info!(
            caller_id = caller.id,
            display_name = %caller.display_name,
            action = "confirm_upload",
            "User action"
        );

        // The roster may have changed since the photo was stashed.
        if !self.authorize(caller, "confirm_upload").await {
            self.pending.discard(caller.id).await;
            self.answer_prompt(chat_id, prompt, messages::UNAUTHORIZED)
                .await;
            return;
        }

        let Some(file) = self.pending.take(caller.id).await else {
            let err = AppError::NoPendingUpload;
            tracing::debug!(
                caller_id = caller.id,
                error_code = err.error_code(),
                "Nothing to confirm"
            );
            self.answer_prompt(chat_id, prompt, messages::NO_PENDING_UPLOAD)
                .await;
            return;
        };

        self.answer_prompt(chat_id, prompt, messages::UPLOAD_CONFIRMED)
            .await;
        // Failures are already reported to the chat by the pipeline.
        let _ = self.pipeline.process(chat_id, caller, &file).await;
    }
}
