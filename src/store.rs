//! Save slot persistence
//!
//! One snapshot lives under one fixed key. Writes never fail loudly: a full
//! disk or exhausted quota is logged and play continues.

mod backend;

pub use backend::{KvBackend, MemoryKv, SqliteKv, StoreResult};

use crate::model::{ChatMessage, Companion, Outfit};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Storage key of the single save slot
pub const SAVE_KEY: &str = "queens_wardrobe_save_v2";

/// Point-in-time bundle of a playthrough
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSnapshot {
    pub selected_outfit: Outfit,
    pub selected_leads: Vec<Companion>,
    pub messages: Vec<ChatMessage>,
    /// Companion id -> portrait data override
    #[serde(default)]
    pub custom_images: BTreeMap<String, String>,
}

/// The save slot over any key-value backend
pub struct SaveStore<B: KvBackend> {
    backend: B,
    key: String,
}

impl<B: KvBackend> SaveStore<B> {
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, SAVE_KEY)
    }

    pub fn with_key(backend: B, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    #[allow(dead_code)] // Tests reach past the slot to plant raw data
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Persist `snapshot`, replacing any previous one. Failures are logged only.
    pub fn write(&self, snapshot: &SaveSnapshot) {
        if let Err(e) = self.try_write(snapshot) {
            tracing::error!(error = %e, "Save failed; continuing without persisting");
        }
    }

    fn try_write(&self, snapshot: &SaveSnapshot) -> StoreResult<()> {
        let json = serde_json::to_string(snapshot)?;
        self.backend.set(&self.key, &json)?;
        tracing::debug!(
            bytes = json.len(),
            messages = snapshot.messages.len(),
            "Snapshot saved"
        );
        Ok(())
    }

    /// The last persisted snapshot; unreadable or corrupt data reads as none
    pub fn read(&self) -> Option<SaveSnapshot> {
        let raw = match self.backend.get(&self.key) {
            Ok(raw) => raw?,
            Err(e) => {
                tracing::error!(error = %e, "Failed to read save slot");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable save data");
                None
            }
        }
    }

    pub fn clear(&self) {
        if let Err(e) = self.backend.remove(&self.key) {
            tracing::error!(error = %e, "Failed to clear save slot");
        }
    }

    /// Whether a snapshot is stored, without deserializing it
    pub fn has_snapshot(&self) -> bool {
        self.backend.contains(&self.key).unwrap_or_else(|e| {
            tracing::error!(error = %e, "Failed to check save slot");
            false
        })
    }
}
