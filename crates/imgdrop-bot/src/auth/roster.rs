//! Roster persistence
//!
//! The authorized-user list is saved as `{"authorized_users":[...]}`. Writes go to a
//! sibling temp file that is then renamed over the target.

use async_trait::async_trait;
use imgdrop_core::RosterError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Durable storage for the authorized-user list
#[async_trait]
pub trait RosterStore: Send + Sync {
    /// Previously saved roster, or `None` when nothing was saved yet.
    async fn load(&self) -> Result<Option<Vec<i64>>, RosterError>;

    /// Replace the saved roster. Must not return before the data is durable.
    async fn save(&self, users: &[i64]) -> Result<(), RosterError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct RosterFile {
    authorized_users: Vec<i64>,
}

/// JSON file roster store
#[derive(Debug, Clone)]
pub struct JsonFileRosterStore {
    path: PathBuf,
}

impl JsonFileRosterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "roster".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn persistence_error(path: &Path, action: &str, err: impl std::fmt::Display) -> RosterError {
    RosterError::Persistence(format!("failed to {} {}: {}", action, path.display(), err))
}

#[async_trait]
impl RosterStore for JsonFileRosterStore {
    async fn load(&self) -> Result<Option<Vec<i64>>, RosterError> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            tracing::debug!(path = %self.path.display(), "No saved roster found");
            return Ok(None);
        }

        let data = fs::read(&self.path)
            .await
            .map_err(|e| persistence_error(&self.path, "read", e))?;
        let file: RosterFile = serde_json::from_slice(&data)
            .map_err(|e| persistence_error(&self.path, "parse", e))?;

        tracing::debug!(
            path = %self.path.display(),
            users = file.authorized_users.len(),
            "Loaded saved roster"
        );
        Ok(Some(file.authorized_users))
    }

    async fn save(&self, users: &[i64]) -> Result<(), RosterError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| persistence_error(parent, "create directory", e))?;
        }

        let body = serde_json::to_vec_pretty(&RosterFile {
            authorized_users: users.to_vec(),
        })
        .map_err(|e| persistence_error(&self.path, "serialize", e))?;

        let temp_path = self.temp_path();
        fs::write(&temp_path, &body)
            .await
            .map_err(|e| persistence_error(&temp_path, "write", e))?;
        fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| persistence_error(&self.path, "replace", e))?;

        tracing::debug!(
            path = %self.path.display(),
            users = users.len(),
            "Roster saved"
        );
        Ok(())
    }
}
