//! Persistence capability.
//!
//! The engine and codec never touch storage directly. Whoever owns the
//! session injects a [`StateStore`]; the real backend (key-value store, file,
//! network service) lives outside this crate. [`MemoryStore`] backs tests and
//! the driver.

use std::collections::BTreeMap;

/// Errors reported by a storage backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend failed to read or write a slot.
    #[error("storage backend error: {message}")]
    Backend {
        /// Description of the backend failure.
        message: String,
    },
}

/// Keyed storage for encoded game-state documents.
pub trait StateStore {
    /// Write `document` into `slot`, replacing what was there.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend rejects the write.
    fn save(&mut self, slot: &str, document: &str) -> Result<(), StoreError>;

    /// Read the document in `slot`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be read.
    fn load(&self, slot: &str) -> Result<Option<String>, StoreError>;

    /// Delete `slot`. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend rejects the delete.
    fn remove(&mut self, slot: &str) -> Result<bool, StoreError>;

    /// Names of all occupied slots.
    fn slots(&self) -> Vec<String>;
}

/// In-memory [`StateStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: BTreeMap<String, String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub const fn new() -> Self {
        Self {
            documents: BTreeMap::new(),
        }
    }
}

impl StateStore for MemoryStore {
    fn save(&mut self, slot: &str, document: &str) -> Result<(), StoreError> {
        self.documents.insert(slot.to_owned(), document.to_owned());
        tracing::debug!(slot, bytes = document.len(), "Saved state document");
        Ok(())
    }

    fn load(&self, slot: &str) -> Result<Option<String>, StoreError> {
        Ok(self.documents.get(slot).cloned())
    }

    fn remove(&mut self, slot: &str) -> Result<bool, StoreError> {
        Ok(self.documents.remove(slot).is_some())
    }

    fn slots(&self) -> Vec<String> {
        self.documents.keys().cloned().collect()
    }
}
