//! ScanChat - CT scan analysis chat client library
//!
//! This library provides the core of the ScanChat client: a conversation
//! session that sends a CT image and a growing transcript to a remote
//! analysis service, an in-memory history of past conversations, and a
//! one-shot analyzer for a hosted-inference endpoint.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `transport`: JSON request/response abstraction and its HTTP client
//! - `session`: Conversation state machine and message types
//! - `history`: In-memory history store and the session-to-history bridge
//! - `analysis`: One-shot hosted-inference analysis
//! - `payload`: Image resizing and base64 JPEG encoding
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//! - `commands`: Command handlers behind the CLI
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use scanchat::{ChatSession, Config};
//! use scanchat::session::{ImagePayload, SessionOptions};
//! use scanchat::transport::HttpTransport;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let transport = Arc::new(HttpTransport::new(config.api.base_url.clone(), None)?);
//!     let session = ChatSession::new(transport, SessionOptions::from_config(&config));
//!     session.attach_image(ImagePayload::from_base64("/9j/4AAQ"));
//!     session.send(None).await?;
//!     Ok(())
//! }
//! ```

pub mod analysis;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod history;
pub mod payload;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use analysis::CtAnalyzer;
pub use config::Config;
pub use error::{Result, ScanChatError};
pub use history::{HistoryBridge, HistoryStore};
pub use session::{ChatMessage, ChatSession, ImagePayload, SessionStatus};
pub use transport::{HttpTransport, Transport, TransportError};
