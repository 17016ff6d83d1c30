//! imgdrop Bot Library
//!
//! Chat-facing side of imgdrop: the authorization gate, the pending-upload store, the
//! upload orchestrator, update dispatch, and the Telegram transport.

pub mod auth;
pub mod handlers;
pub mod messages;
pub mod orchestrator;
pub mod pending;
pub mod server;
pub mod transport;

// Re-export commonly used types
pub use auth::{AuthGate, JsonFileRosterStore, RosterStore};
pub use handlers::Bot;
pub use orchestrator::{PipelineFailure, Stage, UploadPipeline, UploadState};
pub use pending::PendingUploads;
pub use server::PollingServer;
