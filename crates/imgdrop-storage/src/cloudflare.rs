//! Cloudflare Images client

use async_trait::async_trait;
use imgdrop_core::config::CloudflareConfig;
use imgdrop_core::constants::MAX_METADATA_BYTES;
use imgdrop_core::{MetadataMap, UploadOutcome};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::{Duration, Instant};

use crate::keys::upload_filename;
use crate::traits::{HostError, HostResult, ImageHost};

#[derive(Debug, Deserialize)]
struct CloudflareResponse {
    success: bool,
    #[serde(default)]
    result: Option<CloudflareResult>,
    #[serde(default)]
    errors: Vec<CloudflareMessage>,
}

#[derive(Debug, Deserialize)]
struct CloudflareResult {
    id: String,
    #[serde(default)]
    variants: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CloudflareMessage {
    message: String,
}

impl From<CloudflareResponse> for UploadOutcome {
    fn from(response: CloudflareResponse) -> Self {
        let (id, variants) = response
            .result
            .map(|r| (r.id, r.variants))
            .unwrap_or_default();

        UploadOutcome {
            id,
            variants,
            success: response.success,
            errors: response.errors.into_iter().map(|e| e.message).collect(),
        }
    }
}

/// Cloudflare Images upload client
pub struct CloudflareImages {
    http_client: reqwest::Client,
    upload_url: String,
    api_token: String,
    timeout: Duration,
}

impl Debug for CloudflareImages {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("CloudflareImages")
            .field("upload_url", &self.upload_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CloudflareImages {
    pub fn new(config: &CloudflareConfig, timeout: Duration) -> HostResult<Self> {
        if config.account_id.is_empty() || config.api_token.is_empty() {
            return Err(HostError::ConfigError(
                "account id and API token are required".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                HostError::ConfigError(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http_client,
            upload_url: format!(
                "{}/accounts/{}/images/v1",
                config.api_url.trim_end_matches('/'),
                config.account_id
            ),
            api_token: config.api_token.clone(),
            timeout,
        })
    }

    fn build_form(data: Vec<u8>, filename: String, metadata: &MetadataMap) -> Form {
        let mut form = Form::new().part("file", Part::bytes(data).file_name(filename));

        if !metadata.is_empty() {
            let metadata_json = metadata.to_json();
            if metadata_json.len() < MAX_METADATA_BYTES {
                form = form.text("metadata", metadata_json);
            } else {
                tracing::warn!(
                    metadata_bytes = metadata_json.len(),
                    "Metadata exceeds host limit, omitting it from the upload"
                );
            }
        }

        form.text("requireSignedURLs", "false")
    }

    fn map_send_error(&self, err: reqwest::Error) -> HostError {
        if err.is_timeout() {
            HostError::Timeout(self.timeout)
        } else {
            HostError::RequestFailed(err.to_string())
        }
    }
}

#[async_trait]
impl ImageHost for CloudflareImages {
    async fn upload(
        &self,
        data: Vec<u8>,
        owner_id: i64,
        metadata: &MetadataMap,
    ) -> HostResult<UploadOutcome> {
        let filename = upload_filename(owner_id);
        let size_bytes = data.len();
        let start = Instant::now();

        tracing::info!(
            owner_id,
            filename = %filename,
            size_bytes,
            "Uploading image to Cloudflare Images"
        );

        let form = Self::build_form(data, filename.clone(), metadata);
        let response = self
            .http_client
            .post(&self.upload_url)
            .bearer_auth(&self.api_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::debug!(
            method = "POST",
            url = %self.upload_url,
            status = status.as_u16(),
            duration_ms,
            "Cloudflare API call completed"
        );

        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        let parsed: CloudflareResponse =
            serde_json::from_str(&body).map_err(|e| HostError::InvalidResponse {
                status: status.as_u16(),
                message: e.to_string(),
            })?;

        let outcome = UploadOutcome::from(parsed);
        if outcome.success {
            tracing::info!(
                owner_id,
                filename = %filename,
                image_id = %outcome.id,
                variants_count = outcome.variants.len(),
                duration_ms,
                "Upload successful"
            );
        } else {
            tracing::warn!(
                owner_id,
                filename = %filename,
                status = status.as_u16(),
                errors = ?outcome.errors,
                "Cloudflare API returned errors"
            );
        }

        Ok(outcome)
    }

    fn host_name(&self) -> &'static str {
        "cloudflare"
    }
}
