//! Analysis conversation session
//!
//! This module contains the session state machine that drives a CT scan
//! conversation, together with the message types it exchanges with the
//! analysis service.
//!
//! - [`message`]: `ChatMessage`, `Role` and the opaque `ImagePayload`
//! - [`chat`]: `ChatSession`, its status, errors and observer seam
//! - `wire`: JSON bodies of the chat endpoints

pub mod chat;
pub mod message;
mod wire;

pub use chat::{
    ChatSession, SessionError, SessionOptions, SessionStatus, TranscriptObserver,
    CANCELLED_MESSAGE,
};
pub use message::{ChatMessage, ImagePayload, Role};
