//! Mirrors a live session transcript into the history store

use chrono::Utc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::{HistoryId, HistoryStore, NewHistoryEntry};
use crate::config::HistoryConfig;
use crate::session::{ChatMessage, TranscriptObserver};

#[derive(Debug, Default)]
struct BridgeState {
    current: Option<HistoryId>,
    image_ref: Option<String>,
    /// Newest conversation generation seen
    generation: u64,
}

impl BridgeState {
    /// Move to `generation`, forgetting the previous conversation
    fn advance(&mut self, generation: u64) {
        self.generation = generation;
        self.current = None;
        self.image_ref = None;
    }
}

/// Session observer that saves conversations into a [`HistoryStore`]
///
/// A conversation becomes history once it holds an assistant message. The
/// first save creates an entry; later saves update that entry by identity.
/// A conversation reset forgets the identity so the next conversation gets
/// its own entry. Changes tagged with a generation older than the newest
/// one seen are dropped, so a late notification from a finished
/// conversation cannot attach itself to the next one.
#[derive(Debug)]
pub struct HistoryBridge {
    store: Arc<HistoryStore>,
    title_max_chars: usize,
    fallback_title: String,
    state: Mutex<BridgeState>,
}

impl HistoryBridge {
    /// Create a bridge writing into `store`
    pub fn new(store: Arc<HistoryStore>, config: &HistoryConfig) -> Self {
        Self {
            store,
            title_max_chars: config.title_max_chars,
            fallback_title: config.fallback_title.clone(),
            state: Mutex::new(BridgeState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BridgeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Image reference stored with the entry created for this conversation
    ///
    /// Set it after attaching the image: a conversation reset clears it.
    pub fn set_image_ref(&self, image_ref: Option<String>) {
        self.lock().image_ref = image_ref;
    }

    /// Identity recorded for the current conversation
    pub fn current_id(&self) -> Option<HistoryId> {
        self.lock().current
    }

    /// Save or update the current conversation
    pub fn sync(&self, transcript: &[ChatMessage]) {
        let mut state = self.lock();
        self.save(&mut state, transcript);
    }

    fn save(&self, state: &mut BridgeState, transcript: &[ChatMessage]) {
        if !transcript.iter().any(ChatMessage::is_assistant) {
            return;
        }

        match state.current {
            Some(id) => {
                if !self.store.update_entry(&id, transcript.to_vec()) {
                    tracing::warn!("History entry {} disappeared, not recreating it", id);
                }
            }
            None => {
                let title = derive_title(transcript, self.title_max_chars, &self.fallback_title);
                let id = self.store.add_entry(NewHistoryEntry {
                    created_at: Utc::now(),
                    title,
                    transcript: transcript.to_vec(),
                    image_ref: state.image_ref.clone(),
                });
                tracing::info!("Saved conversation to history as {}", id);
                state.current = Some(id);
            }
        }
    }

    /// Forget the current conversation's identity and image reference
    pub fn forget(&self) {
        let mut state = self.lock();
        state.current = None;
        state.image_ref = None;
    }
}

impl TranscriptObserver for HistoryBridge {
    fn on_transcript_changed(&self, generation: u64, transcript: &[ChatMessage]) {
        let mut state = self.lock();
        if generation < state.generation {
            tracing::debug!(
                "Ignoring transcript of finished conversation {} (current {})",
                generation,
                state.generation
            );
            return;
        }
        if generation > state.generation {
            // The reset for this conversation has not been delivered yet.
            state.advance(generation);
        }
        self.save(&mut state, transcript);
    }

    fn on_conversation_reset(&self, generation: u64) {
        let mut state = self.lock();
        if generation > state.generation {
            state.advance(generation);
        }
    }
}

/// Title from the first user message, truncated to `max_chars` characters
///
/// Falls back to `fallback` when there is no user message or its text is
/// blank.
///
/// # Examples
///
/// ```
/// use scanchat::history::bridge::derive_title;
/// use scanchat::session::ChatMessage;
///
/// let transcript = vec![ChatMessage::user("What is this?"), ChatMessage::assistant("A CT slice.")];
/// assert_eq!(derive_title(&transcript, 60, "CT Analysis"), "What is this?");
/// assert_eq!(derive_title(&transcript[1..], 60, "CT Analysis"), "CT Analysis");
/// ```
pub fn derive_title(transcript: &[ChatMessage], max_chars: usize, fallback: &str) -> String {
    transcript
        .iter()
        .find(|m| m.is_user())
        .map(|m| m.text.trim())
        .filter(|text| !text.is_empty())
        .map(|text| text.chars().take(max_chars).collect::<String>())
        .unwrap_or_else(|| fallback.to_string())
}
