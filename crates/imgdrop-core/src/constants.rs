//! Image host limits and pipeline constants.

use std::time::Duration;

/// Maximum accepted payload size (10 MiB).
pub const MAX_FILE_SIZE_BYTES: usize = 10 * 1024 * 1024;

/// Maximum width or height in pixels.
pub const MAX_IMAGE_DIMENSION: u32 = 12_000;

/// Pixel area ceiling for static images.
pub const MAX_IMAGE_AREA: u64 = 100_000_000;

/// Pixel area ceiling for animated images.
pub const MAX_ANIMATED_AREA: u64 = 50_000_000;

/// Serialized metadata budget accepted by the image host.
pub const MAX_METADATA_BYTES: usize = 1024;

/// Client-side timeout for the download and upload stages.
pub const HTTP_CLIENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Metadata keys forwarded to the image host. Anything else stays local.
pub const FORWARDED_METADATA_KEYS: &[&str] = &[
    "width",
    "height",
    "format",
    "file_size",
    "camera_make",
    "camera_model",
];

/// Content-type family accepted for document submissions.
pub const IMAGE_MIME_PREFIX: &str = "image/";

/// Callback payloads attached to the confirm/cancel prompt.
pub const CALLBACK_CONFIRM_UPLOAD: &str = "confirm_upload";
pub const CALLBACK_CANCEL_UPLOAD: &str = "cancel_upload";
