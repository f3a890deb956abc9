//! In-memory conversation history
//!
//! [`HistoryStore`] keeps the conversations saved during the current
//! process, newest first. It is created explicitly and shared by `Arc`
//! with whoever needs it; nothing is persisted across runs.
//!
//! [`HistoryBridge`] mirrors a live session into the store.

use chrono::Utc;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::session::ChatMessage;

pub mod bridge;
pub mod types;

pub use bridge::HistoryBridge;
pub use types::{HistoryEntry, HistoryId, NewHistoryEntry};

/// Saved conversations, newest first
#[derive(Debug, Default)]
pub struct HistoryStore {
    entries: RwLock<Vec<HistoryEntry>>,
}

impl HistoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<HistoryEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<HistoryEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Save a new entry and return its identity
    ///
    /// The entry is placed first. The identity is never shared with
    /// another entry of this store.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use scanchat::history::{HistoryStore, NewHistoryEntry};
    /// use scanchat::session::ChatMessage;
    ///
    /// let store = HistoryStore::new();
    /// let id = store.add_entry(NewHistoryEntry {
    ///     created_at: Utc::now(),
    ///     title: "CT Analysis".to_string(),
    ///     transcript: vec![ChatMessage::assistant("Findings")],
    ///     image_ref: None,
    /// });
    /// assert_eq!(store.entries()[0].id, id);
    /// ```
    pub fn add_entry(&self, entry: NewHistoryEntry) -> HistoryId {
        let mut entries = self.write();
        let mut id = HistoryId::new();
        while entries.iter().any(|e| e.id == id) {
            id = HistoryId::new();
        }
        tracing::debug!("Adding history entry {} ({})", id, entry.title);
        entries.insert(0, entry.into_entry(id));
        id
    }

    /// Replace the transcript of the entry with `id`
    ///
    /// An unknown id is ignored. Returns whether an entry was updated.
    pub fn update_entry(&self, id: &HistoryId, transcript: Vec<ChatMessage>) -> bool {
        let mut entries = self.write();
        match entries.iter_mut().find(|e| &e.id == id) {
            Some(entry) => {
                entry.transcript = transcript;
                entry.updated_at = Utc::now();
                true
            }
            None => {
                tracing::debug!("History entry {} not found, skipping update", id);
                false
            }
        }
    }

    /// All entries, newest first
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.read().clone()
    }

    /// Entry with `id`, if present
    pub fn get(&self, id: &HistoryId) -> Option<HistoryEntry> {
        self.read().iter().find(|e| &e.id == id).cloned()
    }

    /// Number of saved entries
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// True when nothing has been saved
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
