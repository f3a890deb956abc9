use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::session::ChatMessage;

/// Stable identity of a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HistoryId(Uuid);

impl HistoryId {
    /// Generate a fresh identity
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight characters, for compact display
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for HistoryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for HistoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Saved snapshot of a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Unique identifier for the entry
    pub id: HistoryId,
    /// When the entry was first saved
    pub created_at: DateTime<Utc>,
    /// When the transcript was last synced
    pub updated_at: DateTime<Utc>,
    /// Short label derived from the first user message
    pub title: String,
    /// Transcript at last sync
    pub transcript: Vec<ChatMessage>,
    /// Display reference to the analysed image
    pub image_ref: Option<String>,
}

/// Entry contents supplied by the caller; the store assigns the id
#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    /// Timestamp of the first save
    pub created_at: DateTime<Utc>,
    /// Short label
    pub title: String,
    /// Transcript to store
    pub transcript: Vec<ChatMessage>,
    /// Display reference to the analysed image
    pub image_ref: Option<String>,
}

impl NewHistoryEntry {
    pub(crate) fn into_entry(self, id: HistoryId) -> HistoryEntry {
        HistoryEntry {
            id,
            created_at: self.created_at,
            updated_at: self.created_at,
            title: self.title,
            transcript: self.transcript,
            image_ref: self.image_ref,
        }
    }
}
