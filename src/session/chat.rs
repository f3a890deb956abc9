//! Chat session state machine
//!
//! [`ChatSession`] owns the attached image, the transcript and the request
//! status of one analysis conversation, and sequences requests through a
//! [`Transport`].
//!
//! # Status transitions
//!
//! ```text
//!            send/retry                 reply ok
//!   Idle ─────────────────> Sending ─────────────────> Idle
//!    ^                         │
//!    │ clear_error/send/retry  │ transport failure
//!    └──────── Error(msg) <────┘
//! ```
//!
//! `attach_image` and `reset` return to `Idle` from any state and cancel
//! an outstanding request.
//!
//! # Concurrency
//!
//! The session is a cheap `Clone` handle. State sits behind a mutex that
//! is never held across an await. Each dispatch records the session
//! generation; `attach_image` and `reset` bump it and cancel the in-flight
//! token, so a late reply can never overwrite the newer conversation.
//! A caller that drops a `send` or `retry` future before it completes
//! leaves the session in `Error`, with the user turn kept for `retry`.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::message::{ChatMessage, ImagePayload, Role};
use super::wire::{ChatReply, ChatRequest};
use crate::config::{Config, ImagePolicy};
use crate::transport::Transport;

/// Request status of a session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Ready for the next request
    #[default]
    Idle,
    /// A request is outstanding
    Sending,
    /// The last request failed with this message
    Error(String),
}

impl SessionStatus {
    /// True while a request is outstanding
    pub fn is_sending(&self) -> bool {
        matches!(self, Self::Sending)
    }

    /// The failure message, if the last request failed
    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Error(message) => Some(message),
            _ => None,
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Sending => write!(f, "sending"),
            Self::Error(message) => write!(f, "error: {}", message),
        }
    }
}

/// Operation rejected because the session is not in a state that allows it
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    /// `send` or `retry` without an attached image
    #[error("No image attached to the session")]
    NoImage,

    /// `send` or `retry` while another request is outstanding
    #[error("A request is already in flight for this session")]
    Busy,
}

/// Receives transcript changes from a [`ChatSession`]
///
/// Called outside the session lock with a snapshot of the transcript, so
/// notifications from concurrent callers can arrive out of order. Each one
/// carries the conversation generation it belongs to; a change tagged with
/// a generation older than the last reset seen is stale.
/// Implementations must not fail the session; they log and move on.
pub trait TranscriptObserver: Send + Sync {
    /// The transcript of conversation `generation` changed (message
    /// appended, replaced or truncated)
    fn on_transcript_changed(&self, generation: u64, transcript: &[ChatMessage]);

    /// Conversation `generation` started (`reset` or `attach_image`)
    fn on_conversation_reset(&self, _generation: u64) {}
}

/// Endpoint and image settings for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOptions {
    /// Endpoint for turns that carry the image
    pub image_path: String,
    /// Endpoint for follow-up turns without the image
    pub chat_path: String,
    /// When the image accompanies a request
    pub image_policy: ImagePolicy,
}

impl SessionOptions {
    /// Build options from the loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            image_path: config.api.image_path.clone(),
            chat_path: config.api.chat_path.clone(),
            image_policy: config.session.image_policy,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

#[derive(Default)]
struct SessionState {
    image: Option<ImagePayload>,
    transcript: Vec<ChatMessage>,
    status: SessionStatus,
    /// The server has replied successfully since the image was attached
    image_acknowledged: bool,
    generation: u64,
    in_flight: Option<CancellationToken>,
}

impl SessionState {
    /// Drop everything and start a new generation
    fn restart(&mut self, image: Option<ImagePayload>) -> u64 {
        if let Some(token) = self.in_flight.take() {
            token.cancel();
        }
        self.generation = self.generation.wrapping_add(1);
        self.image = image;
        self.transcript.clear();
        self.status = SessionStatus::Idle;
        self.image_acknowledged = false;
        self.generation
    }
}

enum Dispatch<'a> {
    Send(&'a str),
    Retry,
}

/// Everything captured under the lock when a request is dispatched
struct PreparedRequest {
    endpoint: String,
    payload: serde_json::Value,
    generation: u64,
    token: CancellationToken,
    snapshot: Vec<ChatMessage>,
}

/// State machine for one image-analysis conversation
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use scanchat::session::{ChatSession, ImagePayload, SessionOptions};
/// use scanchat::transport::HttpTransport;
///
/// # async fn example() -> scanchat::error::Result<()> {
/// let transport = Arc::new(HttpTransport::new("http://localhost:8080/api", None)?);
/// let session = ChatSession::new(transport, SessionOptions::default());
///
/// session.attach_image(ImagePayload::from_base64("/9j/4AAQ..."));
/// let status = session.send(None).await?;
/// println!("{} ({} messages)", status, session.transcript().len());
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ChatSession {
    transport: Arc<dyn Transport>,
    options: SessionOptions,
    observer: Option<Arc<dyn TranscriptObserver>>,
    state: Arc<Mutex<SessionState>>,
}

impl fmt::Debug for ChatSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ChatSession")
            .field("options", &self.options)
            .field("image", &state.image)
            .field("messages", &state.transcript.len())
            .field("status", &state.status)
            .finish()
    }
}

impl ChatSession {
    /// Create an empty session
    pub fn new(transport: Arc<dyn Transport>, options: SessionOptions) -> Self {
        Self {
            transport,
            options,
            observer: None,
            state: Arc::new(Mutex::new(SessionState::default())),
        }
    }

    /// Register the observer notified on every transcript change
    pub fn with_observer(mut self, observer: Arc<dyn TranscriptObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the transcript
    pub fn transcript(&self) -> Vec<ChatMessage> {
        self.lock().transcript.clone()
    }

    /// Current status
    pub fn status(&self) -> SessionStatus {
        self.lock().status.clone()
    }

    /// True when an image is attached
    pub fn has_image(&self) -> bool {
        self.lock().image.is_some()
    }

    /// True when `send` would dispatch a request
    pub fn can_send(&self) -> bool {
        let state = self.lock();
        state.image.is_some() && !state.status.is_sending()
    }

    /// Attach a new image, discarding the current conversation
    ///
    /// Always succeeds. An outstanding request is cancelled and its reply,
    /// if any still arrives, is ignored.
    pub fn attach_image(&self, image: ImagePayload) {
        tracing::info!("Attaching image ({} bytes), starting new conversation", image.len());
        let generation = self.lock().restart(Some(image));
        self.notify_reset(generation);
    }

    /// Clear image, transcript and status
    ///
    /// Always succeeds. An outstanding request is cancelled.
    pub fn reset(&self) {
        tracing::info!("Resetting session");
        let generation = self.lock().restart(None);
        self.notify_reset(generation);
    }

    /// Dismiss a failure, keeping the transcript
    ///
    /// Returns true when an error was cleared.
    pub fn clear_error(&self) -> bool {
        let mut state = self.lock();
        if matches!(state.status, SessionStatus::Error(_)) {
            state.status = SessionStatus::Idle;
            true
        } else {
            false
        }
    }

    /// Append a user turn and send the transcript to the service
    ///
    /// `None` sends an empty user turn, which asks for the initial analysis.
    /// On success the transcript becomes the server's reply. On failure the
    /// user turn stays in place and the status carries the error message.
    ///
    /// # Returns
    ///
    /// The status the session ended in (`Idle` or `Error`), or the current
    /// status if the conversation was reset while the request was out.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoImage`] without an attached image and
    /// [`SessionError::Busy`] while another request is outstanding. The
    /// transcript is untouched in both cases.
    pub async fn send(&self, text: Option<&str>) -> Result<SessionStatus, SessionError> {
        self.dispatch(Dispatch::Send(text.unwrap_or_default())).await
    }

    /// Re-send the most recent user turn
    ///
    /// Drops the last user message and everything after it, then sends that
    /// text again, producing the same request as the original attempt. Does
    /// nothing when the transcript holds no user message.
    ///
    /// # Errors
    ///
    /// Same as [`ChatSession::send`].
    pub async fn retry(&self) -> Result<SessionStatus, SessionError> {
        self.dispatch(Dispatch::Retry).await
    }

    async fn dispatch(&self, kind: Dispatch<'_>) -> Result<SessionStatus, SessionError> {
        let prepared = match self.prepare(kind)? {
            Some(prepared) => prepared,
            None => return Ok(self.status()),
        };
        let mut guard = InFlightGuard {
            session: self,
            generation: prepared.generation,
            armed: true,
        };
        self.notify_changed(prepared.generation, &prepared.snapshot);

        tracing::debug!(
            "Dispatching {} messages to {} (image: {})",
            prepared.snapshot.len(),
            prepared.endpoint,
            prepared.payload.get("image_base64").is_some()
        );

        let reply = tokio::select! {
            biased;
            _ = prepared.token.cancelled() => {
                tracing::debug!("Request cancelled by a new conversation");
                guard.armed = false;
                return Ok(self.status());
            }
            reply = self.transport.request(&prepared.endpoint, &prepared.payload) => reply,
        };

        let outcome = match reply {
            Ok(body) => ChatReply::from_value(body)
                .map(|reply| reply.chat_array)
                .map_err(|e| format!("Invalid response: {}", e)),
            Err(e) => Err(e.to_string()),
        };

        guard.armed = false;
        let (status, changed) = {
            let mut state = self.lock();
            if state.generation != prepared.generation {
                tracing::debug!("Discarding reply for a previous conversation");
                return Ok(state.status.clone());
            }
            state.in_flight = None;
            match outcome {
                Ok(transcript) => {
                    tracing::info!("Received reply with {} messages", transcript.len());
                    state.transcript = transcript;
                    state.status = SessionStatus::Idle;
                    state.image_acknowledged = true;
                    (state.status.clone(), Some(state.transcript.clone()))
                }
                Err(message) => {
                    tracing::warn!("Request failed: {}", message);
                    state.status = SessionStatus::Error(message);
                    (state.status.clone(), None)
                }
            }
        };

        if let Some(transcript) = changed {
            self.notify_changed(prepared.generation, &transcript);
        }
        Ok(status)
    }

    /// Apply the pre-network half of a dispatch under the lock
    ///
    /// Returns `None` for a retry with nothing to retry.
    fn prepare(&self, kind: Dispatch<'_>) -> Result<Option<PreparedRequest>, SessionError> {
        let mut state = self.lock();

        if state.status.is_sending() {
            return Err(SessionError::Busy);
        }

        let text = match kind {
            Dispatch::Send(text) => {
                if state.image.is_none() {
                    return Err(SessionError::NoImage);
                }
                text.to_string()
            }
            Dispatch::Retry => {
                let Some(index) = state.transcript.iter().rposition(ChatMessage::is_user) else {
                    return Ok(None);
                };
                if state.image.is_none() {
                    return Err(SessionError::NoImage);
                }
                let text = state.transcript[index].text.clone();
                tracing::info!("Retrying last user turn at position {}", index);
                state.transcript.truncate(index);
                text
            }
        };

        state.transcript.push(ChatMessage {
            role: Role::User,
            text,
        });

        let include_image = match self.options.image_policy {
            ImagePolicy::EveryTurn => true,
            ImagePolicy::FirstTurn => !state.image_acknowledged,
        };
        let endpoint = if include_image {
            self.options.image_path.clone()
        } else {
            self.options.chat_path.clone()
        };

        let request = ChatRequest {
            image_base64: if include_image {
                state.image.as_ref().map(ImagePayload::as_str)
            } else {
                None
            },
            chat: &state.transcript,
        };
        let payload = match serde_json::to_value(&request) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("Failed to serialize chat request: {}", e);
                state.status = SessionStatus::Error(e.to_string());
                return Ok(None);
            }
        };

        let token = CancellationToken::new();
        state.in_flight = Some(token.clone());
        state.status = SessionStatus::Sending;

        Ok(Some(PreparedRequest {
            endpoint,
            payload,
            generation: state.generation,
            token,
            snapshot: state.transcript.clone(),
        }))
    }

    fn notify_changed(&self, generation: u64, transcript: &[ChatMessage]) {
        if let Some(observer) = &self.observer {
            observer.on_transcript_changed(generation, transcript);
        }
    }

    fn notify_reset(&self, generation: u64) {
        if let Some(observer) = &self.observer {
            observer.on_conversation_reset(generation);
        }
    }
}

/// Message left in the status when a caller abandons an outstanding request
pub const CANCELLED_MESSAGE: &str = "Request cancelled";

/// Releases the `Sending` state if a dispatch future is dropped mid-request
///
/// The user turn stays in the transcript so `retry` can send it again.
struct InFlightGuard<'a> {
    session: &'a ChatSession,
    generation: u64,
    armed: bool,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.session.lock();
        if state.generation != self.generation || !state.status.is_sending() {
            return;
        }
        tracing::warn!("Request abandoned by caller, session left retryable");
        if let Some(token) = state.in_flight.take() {
            token.cancel();
        }
        state.status = SessionStatus::Error(CANCELLED_MESSAGE.to_string());
    }
}
