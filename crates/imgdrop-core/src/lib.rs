//! imgdrop Core Library
//!
//! This crate provides core domain models, error types, configuration, and limits
//! that are shared across all imgdrop components.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;

// Re-export commonly used types
pub use config::{Config, LogFormat, LoggingConfig};
pub use error::{AppError, ErrorMetadata, LogLevel, RosterError, ValidationError};
pub use models::{
    CallerIdentity, FileRef, MetadataMap, MetadataValue, UploadOutcome, ValidationResult,
};
