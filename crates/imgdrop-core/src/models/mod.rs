pub mod caller;
pub mod metadata;
pub mod upload;

pub use caller::{CallerIdentity, FileRef};
pub use metadata::{MetadataMap, MetadataValue};
pub use upload::{UploadOutcome, ValidationResult};
