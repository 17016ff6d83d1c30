//! imgdrop image processing
//!
//! Header-only validation of uploaded images against the image host's limits, plus
//! best-effort extraction of a bounded set of EXIF fields.

pub mod exif_fields;
pub mod validator;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use validator::{ImageValidator, ValidationLimits};
