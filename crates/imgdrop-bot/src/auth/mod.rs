//! Authorization gate
//!
//! The admin is always authorized and is never stored in the roster. Roster
//! mutations are persisted while the write lock is held and only committed to memory
//! once the save succeeded, so a failed save leaves the roster unchanged.

mod roster;

pub use roster::{JsonFileRosterStore, RosterStore};

use imgdrop_core::RosterError;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct AuthGate {
    admin_id: i64,
    roster: RwLock<BTreeSet<i64>>,
    store: Arc<dyn RosterStore>,
}

impl AuthGate {
    pub fn new(
        admin_id: i64,
        authorized: impl IntoIterator<Item = i64>,
        store: Arc<dyn RosterStore>,
    ) -> Self {
        let roster = authorized.into_iter().filter(|id| *id != admin_id).collect();
        Self {
            admin_id,
            roster: RwLock::new(roster),
            store,
        }
    }

    /// Build the gate from the saved roster, falling back to `seed` when nothing was
    /// saved yet.
    pub async fn load(
        admin_id: i64,
        seed: &[i64],
        store: Arc<dyn RosterStore>,
    ) -> Result<Self, RosterError> {
        let authorized = match store.load().await? {
            Some(saved) => saved,
            None => seed.to_vec(),
        };

        tracing::info!(
            admin_id,
            authorized_users = authorized.len(),
            "Authorization roster loaded"
        );
        Ok(Self::new(admin_id, authorized, store))
    }

    pub fn is_admin(&self, id: i64) -> bool {
        id == self.admin_id
    }

    pub async fn is_authorized(&self, id: i64) -> bool {
        self.is_admin(id) || self.roster.read().await.contains(&id)
    }

    /// Snapshot of the roster, admin excluded.
    pub async fn authorized_users(&self) -> Vec<i64> {
        self.roster.read().await.iter().copied().collect()
    }

    pub async fn add_authorized(&self, id: i64) -> Result<(), RosterError> {
        let mut roster = self.roster.write().await;
        if self.is_admin(id) || roster.contains(&id) {
            return Err(RosterError::AlreadyAuthorized(id));
        }

        let mut updated = roster.clone();
        updated.insert(id);
        self.persist(&updated).await?;
        *roster = updated;

        tracing::info!(user_id = id, "User added to authorized list");
        Ok(())
    }

    pub async fn remove_authorized(&self, id: i64) -> Result<(), RosterError> {
        if self.is_admin(id) {
            return Err(RosterError::CannotRemoveAdmin);
        }

        let mut roster = self.roster.write().await;
        if !roster.contains(&id) {
            return Err(RosterError::NotFound(id));
        }

        let mut updated = roster.clone();
        updated.remove(&id);
        self.persist(&updated).await?;
        *roster = updated;

        tracing::info!(user_id = id, "User removed from authorized list");
        Ok(())
    }

    async fn persist(&self, roster: &BTreeSet<i64>) -> Result<(), RosterError> {
        let users: Vec<i64> = roster.iter().copied().collect();
        self.store.save(&users).await.inspect_err(|e| {
            tracing::error!(error = %e, "Failed to persist authorized users");
        })
    }
}
