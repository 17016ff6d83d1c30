use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of the account interacting with the bot, as reported by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub id: i64,
    pub display_name: String,
}

impl CallerIdentity {
    pub fn new(id: i64, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}

/// Opaque transport-side reference to an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRef(pub String);

impl FileRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FileRef {
    fn from(value: &str) -> Self {
        FileRef(value.to_string())
    }
}

impl From<String> for FileRef {
    fn from(value: String) -> Self {
        FileRef(value)
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
