//! Telegram Bot API client

use anyhow::{Context, Result};
use async_trait::async_trait;
use imgdrop_core::config::TelegramConfig;
use imgdrop_core::{CallerIdentity, FileRef};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::{Duration, Instant};

use super::{
    ChatChannel, FileSource, InlineButton, Incoming, MessageRef, TransportError,
    TransportResult, UpdateBatch, UpdateKind, UpdateSource,
};

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct Update {
    update_id: i64,
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
struct Message {
    message_id: i64,
    chat: Chat,
    #[serde(default)]
    from: Option<User>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    photo: Option<Vec<PhotoSize>>,
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
struct Chat {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct User {
    id: i64,
    #[serde(default)]
    first_name: String,
    #[serde(default)]
    username: Option<String>,
}

impl User {
    fn identity(&self) -> CallerIdentity {
        let display_name = self
            .username
            .clone()
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.first_name.clone());
        CallerIdentity::new(self.id, display_name)
    }
}

#[derive(Debug, Deserialize)]
struct PhotoSize {
    file_id: String,
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct Document {
    file_id: String,
    #[serde(default)]
    file_name: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    id: String,
    from: User,
    #[serde(default)]
    message: Option<Message>,
    #[serde(default)]
    data: Option<String>,
}

#[derive(Debug, Deserialize)]
struct File {
    #[serde(default)]
    file_path: Option<String>,
}

impl Update {
    fn into_incoming(self) -> Option<Incoming> {
        if let Some(callback) = self.callback_query {
            let message = callback.message.as_ref().map(|m| MessageRef {
                chat_id: m.chat.id,
                message_id: m.message_id,
            });
            return Some(Incoming {
                update_id: self.update_id,
                chat_id: message.map(|m| m.chat_id).unwrap_or(callback.from.id),
                caller: callback.from.identity(),
                kind: UpdateKind::Callback {
                    id: callback.id,
                    data: callback.data.unwrap_or_default().trim().to_string(),
                    message,
                },
            });
        }

        let message = self.message?;
        let caller = message.from.as_ref()?.identity();

        let kind = if let Some(largest) = message
            .photo
            .as_ref()
            .and_then(|sizes| sizes.iter().max_by_key(|p| u64::from(p.width) * u64::from(p.height)))
        {
            UpdateKind::Photo {
                file: FileRef::from(largest.file_id.as_str()),
            }
        } else if let Some(document) = message.document {
            UpdateKind::Document {
                file: FileRef::from(document.file_id),
                mime_type: document.mime_type,
                file_name: document.file_name,
            }
        } else {
            UpdateKind::from_text(message.text.as_deref()?)
        };

        Some(Incoming {
            update_id: self.update_id,
            chat_id: message.chat.id,
            caller,
            kind,
        })
    }
}

/// Telegram Bot API client implementing every transport trait.
pub struct TelegramClient {
    http_client: reqwest::Client,
    api_url: String,
    token: String,
    poll_timeout_secs: u64,
    request_timeout: Duration,
}

impl Debug for TelegramClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("TelegramClient")
            .field("api_url", &self.api_url)
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .finish()
    }
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig, request_timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client for Telegram Bot API")?;

        Ok(Self {
            http_client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.bot_token.clone(),
            poll_timeout_secs: config.poll_timeout_secs,
            request_timeout,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.token, method)
    }

    fn file_url(&self, path: &str) -> String {
        format!(
            "{}/file/bot{}/{}",
            self.api_url,
            self.token,
            path.trim_start_matches('/')
        )
    }

    fn map_error(&self, err: reqwest::Error, timeout: Duration) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(timeout)
        } else {
            // The request URL embeds the bot token.
            TransportError::Http(err.without_url().to_string())
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: Value,
        timeout: Duration,
    ) -> TransportResult<T> {
        let start = Instant::now();
        let response = self
            .http_client
            .post(self.method_url(method))
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_error(e, timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| self.map_error(e, timeout))?;

        tracing::debug!(
            method,
            status = status.as_u16(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Telegram API call completed"
        );

        let parsed: ApiResponse<T> = serde_json::from_str(&text).map_err(|e| {
            TransportError::InvalidResponse(format!("{} (status {}): {}", method, status, e))
        })?;

        if !parsed.ok {
            return Err(TransportError::Api {
                code: parsed.error_code.unwrap_or_else(|| i64::from(status.as_u16())),
                description: parsed.description.unwrap_or_else(|| "unknown error".to_string()),
            });
        }

        parsed
            .result
            .ok_or_else(|| TransportError::InvalidResponse(format!("{}: missing result", method)))
    }
}

#[async_trait]
impl ChatChannel for TelegramClient {
    async fn send_text(&self, chat_id: i64, text: &str) -> TransportResult<MessageRef> {
        let message: Message = self
            .call(
                "sendMessage",
                json!({ "chat_id": chat_id, "text": text }),
                self.request_timeout,
            )
            .await?;

        Ok(MessageRef {
            chat_id: message.chat.id,
            message_id: message.message_id,
        })
    }

    async fn send_prompt(
        &self,
        chat_id: i64,
        text: &str,
        buttons: &[InlineButton],
    ) -> TransportResult<MessageRef> {
        let row: Vec<Value> = buttons
            .iter()
            .map(|b| json!({ "text": b.text, "callback_data": b.callback_data }))
            .collect();

        let message: Message = self
            .call(
                "sendMessage",
                json!({
                    "chat_id": chat_id,
                    "text": text,
                    "reply_markup": { "inline_keyboard": [row] },
                }),
                self.request_timeout,
            )
            .await?;

        Ok(MessageRef {
            chat_id: message.chat.id,
            message_id: message.message_id,
        })
    }

    async fn edit_text(&self, message: &MessageRef, text: &str) -> TransportResult<()> {
        // The result is the edited message, or `true` for inline messages.
        let _: Value = self
            .call(
                "editMessageText",
                json!({
                    "chat_id": message.chat_id,
                    "message_id": message.message_id,
                    "text": text,
                }),
                self.request_timeout,
            )
            .await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> TransportResult<()> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                json!({ "callback_query_id": callback_id }),
                self.request_timeout,
            )
            .await?;
        Ok(())
    }
}

#[async_trait]
impl FileSource for TelegramClient {
    async fn resolve_file(&self, file: &FileRef) -> TransportResult<String> {
        let resolved: File = self
            .call(
                "getFile",
                json!({ "file_id": file.as_str() }),
                self.request_timeout,
            )
            .await?;

        resolved
            .file_path
            .filter(|p| !p.is_empty())
            .ok_or_else(|| TransportError::InvalidResponse("getFile: no file path".to_string()))
    }

    async fn fetch(&self, path: &str) -> TransportResult<Vec<u8>> {
        let start = Instant::now();
        let response = self
            .http_client
            .get(self.file_url(path))
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| self.map_error(e, self.request_timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Http(format!(
                "file download returned status {}",
                status
            )));
        }

        let data = response
            .bytes()
            .await
            .map_err(|e| self.map_error(e, self.request_timeout))?;

        tracing::debug!(
            path,
            size_bytes = data.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "File downloaded"
        );
        Ok(data.to_vec())
    }
}

#[async_trait]
impl UpdateSource for TelegramClient {
    async fn next_updates(&self, offset: i64) -> TransportResult<UpdateBatch> {
        let updates: Vec<Update> = self
            .call(
                "getUpdates",
                json!({
                    "offset": offset,
                    "timeout": self.poll_timeout_secs,
                    "allowed_updates": ["message", "callback_query"],
                }),
                Duration::from_secs(self.poll_timeout_secs) + self.request_timeout,
            )
            .await?;

        let mut batch = UpdateBatch {
            last_update_id: updates.iter().map(|u| u.update_id).max(),
            events: Vec::with_capacity(updates.len()),
        };
        for update in updates {
            let update_id = update.update_id;
            match update.into_incoming() {
                Some(event) => batch.events.push(event),
                None => tracing::debug!(update_id, "Ignoring unsupported update"),
            }
        }
        Ok(batch)
    }
}
