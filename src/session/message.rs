//! Transcript message types and the opaque image payload

use serde::{Deserialize, Serialize};
use std::fmt;

/// Author of a chat turn
///
/// On the wire the assistant is spelled `"ai"`; `"assistant"` is accepted
/// as an alias when reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Message written by the user
    #[serde(rename = "user")]
    User,
    /// Message produced by the analysis service
    #[serde(rename = "ai", alias = "assistant")]
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One turn of a transcript
///
/// Serialized as `{"type": "user" | "ai", "text": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who produced the message
    #[serde(rename = "type")]
    pub role: Role,
    /// Message content; empty for a bare analysis request
    #[serde(default)]
    pub text: String,
}

impl ChatMessage {
    /// Creates a user message
    ///
    /// # Examples
    ///
    /// ```
    /// use scanchat::session::{ChatMessage, Role};
    ///
    /// let msg = ChatMessage::user("What is this?");
    /// assert_eq!(msg.role, Role::User);
    /// ```
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Creates an assistant message
    ///
    /// # Examples
    ///
    /// ```
    /// use scanchat::session::{ChatMessage, Role};
    ///
    /// let msg = ChatMessage::assistant("A CT slice.");
    /// assert_eq!(msg.role, Role::Assistant);
    /// ```
    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }

    /// True when the message was written by the user
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    /// True when the message came from the analysis service
    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Base64-encoded JPEG image, treated as opaque by the session
///
/// `Debug` prints only the payload length.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload(String);

impl ImagePayload {
    /// Wrap an already base64-encoded JPEG
    pub fn from_base64(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// The base64 text
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the base64 text in bytes
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the payload holds no data
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// `data:` URI form used by the hosted-inference endpoint
    ///
    /// # Examples
    ///
    /// ```
    /// use scanchat::session::ImagePayload;
    ///
    /// let payload = ImagePayload::from_base64("AAAA");
    /// assert_eq!(payload.to_data_uri(), "data:image/jpeg;base64,AAAA");
    /// ```
    pub fn to_data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", self.0)
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImagePayload({} bytes)", self.0.len())
    }
}
