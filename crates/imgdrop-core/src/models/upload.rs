//! Records passed between the validator, the orchestrator and the image host.

use serde::{Deserialize, Serialize};

use super::metadata::MetadataMap;
use crate::constants::FORWARDED_METADATA_KEYS;
use crate::error::AppError;

/// Result of a successful validation. Failed validations return an error instead,
/// so `is_valid` is always `true` on a constructed value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    is_valid: bool,
    format: String,
    width: u32,
    height: u32,
    size_bytes: usize,
    metadata: MetadataMap,
}

impl ValidationResult {
    pub fn new(
        format: impl Into<String>,
        width: u32,
        height: u32,
        size_bytes: usize,
        metadata: MetadataMap,
    ) -> Self {
        Self {
            is_valid: true,
            format: format.into(),
            width,
            height,
            size_bytes,
            metadata,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn format(&self) -> &str {
        &self.format
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    pub fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }

    /// Metadata restricted to the fields the image host may receive.
    pub fn forwarded_metadata(&self) -> MetadataMap {
        self.metadata.retain_keys(FORWARDED_METADATA_KEYS)
    }
}

/// Response of the image host for one upload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    pub id: String,
    pub variants: Vec<String>,
    pub success: bool,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl UploadOutcome {
    /// The first variant URL is the canonical one.
    pub fn canonical_url(&self) -> Result<&str, AppError> {
        if !self.success {
            return Err(AppError::RemoteApi(self.errors.clone()));
        }

        self.variants
            .first()
            .map(String::as_str)
            .ok_or(AppError::NoVariants)
    }
}
