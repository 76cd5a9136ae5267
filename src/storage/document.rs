//! Persisted document state
//!
//! The node tree, the metadata record and the last-saved timestamp live under
//! three fixed keys as JSON. Saving reports a [`SaveStatus`] instead of an
//! error: a failed write is something to show the user, never a reason to
//! touch the document being edited.

use log::{info, warn};
use serde::de::DeserializeOwned;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::{Error, Result, ResultExt};
use crate::model::{Document, Metadata};
use crate::storage::Store;

/// Key of the serialized node tree.
pub const DOCUMENT_KEY: &str = "quire.document";
/// Key of the serialized metadata record.
pub const METADATA_KEY: &str = "quire.metadata";
/// Key of the last successful save time (milliseconds since the Unix epoch).
pub const LAST_SAVED_KEY: &str = "quire.last_saved";

/// Milliseconds since the Unix epoch.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or(0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Everything read back from the store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub document: Document,
    pub metadata: Metadata,
    pub last_saved: Option<u64>,
}

/// Outcome of a save, meant for a status line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveStatus {
    Saved {
        at: u64,
    },
    Failed {
        message: String,
        /// Time of the last save that did succeed
        last_saved: Option<u64>,
    },
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveStatus::Saved { .. })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// DocumentStorage
// ─────────────────────────────────────────────────────────────────────────────

/// Reads and writes the persisted state through a [`Store`].
#[derive(Debug)]
pub struct DocumentStorage<S: Store> {
    store: S,
    last_saved: Option<u64>,
}

impl<S: Store> DocumentStorage<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            last_saved: None,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn last_saved(&self) -> Option<u64> {
        self.last_saved
    }

    /// Load the persisted state. Missing keys give defaults; unreadable or
    /// corrupt values are logged and also give defaults.
    pub fn load(&mut self) -> PersistedState {
        let document = self
            .read_json::<Document>(DOCUMENT_KEY)
            .unwrap_or_warn_default(None, "Failed to load document")
            .unwrap_or_default();
        let metadata = self
            .read_json::<Metadata>(METADATA_KEY)
            .unwrap_or_warn_default(None, "Failed to load metadata")
            .unwrap_or_default();
        let last_saved = self
            .read_json::<u64>(LAST_SAVED_KEY)
            .unwrap_or_warn_default(None, "Failed to load save time");

        self.last_saved = last_saved;
        PersistedState {
            document,
            metadata,
            last_saved,
        }
    }

    /// Save at the current time.
    pub fn save(&mut self, document: &Document, metadata: &Metadata) -> SaveStatus {
        self.save_at(document, metadata, now_millis())
    }

    /// Save with an explicit timestamp.
    pub fn save_at(&mut self, document: &Document, metadata: &Metadata, at: u64) -> SaveStatus {
        match self.write_all(document, metadata, at) {
            Ok(()) => {
                info!("Document saved ({} blocks)", document.children.len());
                self.last_saved = Some(at);
                SaveStatus::Saved { at }
            }
            Err(e) => {
                warn!("Failed to save document: {}", e);
                SaveStatus::Failed {
                    message: e.to_string(),
                    last_saved: self.last_saved,
                }
            }
        }
    }

    /// Remove all persisted keys.
    pub fn clear(&mut self) -> Result<()> {
        for key in [DOCUMENT_KEY, METADATA_KEY, LAST_SAVED_KEY] {
            self.store.remove(key)?;
        }
        self.last_saved = None;
        Ok(())
    }

    fn write_all(&mut self, document: &Document, metadata: &Metadata, at: u64) -> Result<()> {
        self.store
            .set(DOCUMENT_KEY, &serde_json::to_string(document)?)?;
        self.store
            .set(METADATA_KEY, &serde_json::to_string(metadata)?)?;
        self.store.set(LAST_SAVED_KEY, &at.to_string())?;
        Ok(())
    }

    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| Error::StorageParse {
                message: format!("'{}': {}", key, e),
                source: Some(Box::new(e)),
            })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
