//! imgdrop Storage Library
//!
//! This crate provides the remote image-host abstraction and its Cloudflare Images
//! implementation.
//!
//! # Upload filenames
//!
//! Every upload is named `{owner_id}_{unix_timestamp}_{random_hex}`, where the random
//! part is 8 lowercase hex characters. Name generation is centralized in the `keys`
//! module so every host implementation uses the same layout.

pub mod cloudflare;
pub mod keys;
pub mod traits;

// Re-export commonly used types
pub use cloudflare::CloudflareImages;
pub use keys::upload_filename;
pub use traits::{HostError, HostResult, ImageHost};
