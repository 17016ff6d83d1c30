//! Error types module
//!
//! All failures of the intake pipeline are unified under [`AppError`]. Validator and
//! roster failures have their own enums so callers can match on the exact cause, and
//! convert into `AppError` with `?`.

use std::time::Duration;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for rejections coming from a remote service
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error reporting - defines how an error should be presented to a chat user
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "DOWNLOAD_FAILED")
    fn error_code(&self) -> &'static str;

    /// Short user-facing message. Never contains tokens, URLs or file paths.
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Image validator failures. The first failing gate wins.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("image size {size} bytes exceeds limit {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("invalid image: {0}")]
    InvalidFormat(String),

    #[error("image dimensions {width}x{height} exceed limit {max}")]
    DimensionsTooBig { width: u32, height: u32, max: u32 },

    #[error("image area {area} pixels exceeds limit {max}")]
    AreaTooBig { area: u64, max: u64 },
}

impl ValidationError {
    /// Whether this is one of the pixel ceilings (dimension or area).
    pub fn is_too_big(&self) -> bool {
        matches!(
            self,
            ValidationError::DimensionsTooBig { .. } | ValidationError::AreaTooBig { .. }
        )
    }
}

/// Authorization roster mutation failures
#[derive(Debug, thiserror::Error)]
pub enum RosterError {
    #[error("user {0} is already authorized")]
    AlreadyAuthorized(i64),

    #[error("user {0} is not in the authorized list")]
    NotFound(i64),

    #[error("the admin user cannot be removed")]
    CannotRemoveAdmin,

    #[error("failed to persist authorized users: {0}")]
    Persistence(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("user not authorized")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    #[error("no pending upload found")]
    NoPendingUpload,

    #[error("file download failed: {0}")]
    DownloadFailed(String),

    #[error("{operation} timed out after {after:?}")]
    TimedOut {
        operation: &'static str,
        after: Duration,
    },

    #[error("image upload failed: {0}")]
    UploadFailed(String),

    #[error("image host API errors: {}", .0.join("; "))]
    RemoteApi(Vec<String>),

    #[error("no image variants in response")]
    NoVariants,

    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error(transparent)]
    Roster(#[from] RosterError),
}

/// Static metadata for each variant: (error_code, log_level).
fn app_error_static_metadata(err: &AppError) -> (&'static str, LogLevel) {
    match err {
        AppError::Unauthorized => ("UNAUTHORIZED", LogLevel::Debug),
        AppError::Validation(ValidationError::TooLarge { .. }) => {
            ("IMAGE_TOO_LARGE", LogLevel::Debug)
        }
        AppError::Validation(ValidationError::InvalidFormat(_)) => {
            ("INVALID_FORMAT", LogLevel::Debug)
        }
        AppError::Validation(_) => ("IMAGE_TOO_BIG", LogLevel::Debug),
        AppError::UnsupportedType(_) => ("UNSUPPORTED_TYPE", LogLevel::Debug),
        AppError::NoPendingUpload => ("NO_PENDING_UPLOAD", LogLevel::Debug),
        AppError::DownloadFailed(_) => ("DOWNLOAD_FAILED", LogLevel::Error),
        AppError::TimedOut { .. } => ("TIMED_OUT", LogLevel::Warn),
        AppError::UploadFailed(_) => ("UPLOAD_FAILED", LogLevel::Error),
        AppError::RemoteApi(_) => ("REMOTE_API_ERROR", LogLevel::Warn),
        AppError::NoVariants => ("NO_VARIANTS", LogLevel::Error),
        AppError::ConfigInvalid(_) => ("CONFIG_INVALID", LogLevel::Error),
        AppError::Roster(RosterError::Persistence(_)) => ("ROSTER_PERSISTENCE", LogLevel::Error),
        AppError::Roster(RosterError::AlreadyAuthorized(_)) => {
            ("ALREADY_AUTHORIZED", LogLevel::Debug)
        }
        AppError::Roster(RosterError::NotFound(_)) => ("NOT_FOUND", LogLevel::Debug),
        AppError::Roster(RosterError::CannotRemoveAdmin) => {
            ("CANNOT_REMOVE_ADMIN", LogLevel::Debug)
        }
    }
}

impl ErrorMetadata for AppError {
    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).0
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).1
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Unauthorized => "you are not allowed to use this bot".to_string(),
            AppError::Validation(err) => err.to_string(),
            AppError::UnsupportedType(_) => "only image files are supported".to_string(),
            AppError::NoPendingUpload => {
                "no pending image was found, please send it again".to_string()
            }
            AppError::DownloadFailed(_) => "could not download the file".to_string(),
            AppError::TimedOut { .. } => self.to_string(),
            AppError::UploadFailed(_) => "could not reach the image host".to_string(),
            AppError::RemoteApi(messages) => messages.join("; "),
            AppError::NoVariants => "the image host returned no image URL".to_string(),
            AppError::ConfigInvalid(_) => "the service is misconfigured".to_string(),
            AppError::Roster(RosterError::Persistence(_)) => {
                "could not save the authorized user list".to_string()
            }
            AppError::Roster(err) => err.to_string(),
        }
    }
}
