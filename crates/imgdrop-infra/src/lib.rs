//! imgdrop Infrastructure Library
//!
//! Shared infrastructure used by the imgdrop binary:
//! - Telemetry initialization (tracing subscriber)

pub mod telemetry;

// Re-export commonly used types
pub use telemetry::init_telemetry;
