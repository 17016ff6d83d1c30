//! User-facing texts
//!
//! Every failure text starts with [`FAILURE_MARKER`].

use imgdrop_core::{AppError, ErrorMetadata};

pub const FAILURE_MARKER: &str = "❌";
pub const SUCCESS_MARKER: &str = "✅";

pub const WELCOME: &str =
    "Welcome to the image upload bot. Send images as files to keep their original quality.";
pub const UNAUTHORIZED: &str = "❌ Sorry, you are not allowed to use this bot.";
pub const ADMIN_ONLY: &str = "❌ Sorry, only the admin can do that.";
pub const INVALID_USER_ID: &str = "❌ Invalid user ID, please enter a number.";

pub const PHOTO_PROMPT: &str =
    "You sent a compressed photo, which may have lost quality. Upload it anyway?";
pub const BUTTON_CONFIRM: &str = "Confirm upload";
pub const BUTTON_CANCEL: &str = "Cancel";
pub const UPLOAD_CONFIRMED: &str = "Upload confirmed, processing image...";
pub const UPLOAD_CANCELLED: &str = "Upload cancelled.";
pub const NO_PENDING_UPLOAD: &str = "❌ No pending image found, please send it again.";
pub const UNKNOWN_ACTION: &str = "❌ Unknown action.";
pub const UNSUPPORTED_TYPE: &str =
    "❌ Please send an image file, other file types are not supported.";

pub const DOWNLOADING: &str = "Downloading image...";
pub const VALIDATING: &str = "Validating image...";
pub const UPLOADING: &str = "Uploading to Cloudflare...";

pub fn usage(command: &str) -> String {
    format!("Usage: /{} <user_id>", command)
}

pub fn operation_failed(err: &AppError) -> String {
    format!("{} Operation failed: {}", FAILURE_MARKER, err.client_message())
}

pub fn user_added(user_id: i64) -> String {
    format!("User {} was added to the authorized list.", user_id)
}

pub fn user_removed(user_id: i64) -> String {
    format!("User {} was removed from the authorized list.", user_id)
}

pub fn upload_succeeded(url: &str) -> String {
    format!("{} Upload successful!\n\nImage URL:\n{}", SUCCESS_MARKER, url)
}

/// `❌ <headline>: <cause>`; the cause never carries internal detail.
pub fn failure(headline: &str, err: &AppError) -> String {
    format!("{} {}: {}", FAILURE_MARKER, headline, err.client_message())
}
