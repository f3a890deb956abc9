//! Transport abstraction for the remote analysis service
//!
//! This module defines the [`Transport`] trait: one JSON request/response
//! cycle against a named endpoint. The concrete implementation lives in
//! [`http::HttpTransport`]; tests substitute in-process fakes.
//!
//! # Design
//!
//! The trait performs no retries and applies no timeout of its own.
//! Retry policy belongs to the session state machine, and a timeout is
//! only present when the configuration asks for one.
//!
//! Failures are typed so the session can render them:
//!
//! - [`TransportError::Server`] -- a response arrived with a status outside
//!   `200..=299`; the body is kept as raw text because error bodies are
//!   not guaranteed to be JSON.
//! - [`TransportError::Network`] -- no response was received (DNS,
//!   connection refused, timeout).
//! - [`TransportError::Decode`] -- a successful response whose body is not
//!   JSON.

use async_trait::async_trait;
use thiserror::Error;

pub mod http;

pub use http::HttpTransport;

/// Failure of a single request/response cycle
///
/// The `Display` form is the human-readable message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// No response received
    #[error("{cause}")]
    Network {
        /// Underlying cause text
        cause: String,
    },

    /// Response received with a non-success status
    #[error("Server error {status}: {body}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Successful status, but the body could not be parsed as JSON
    #[error("{cause}")]
    Decode {
        /// Parser error text
        cause: String,
    },
}

/// One JSON request/response cycle against a named endpoint
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use scanchat::transport::{Transport, TransportError};
///
/// struct Echo;
///
/// #[async_trait]
/// impl Transport for Echo {
///     async fn request(
///         &self,
///         _endpoint: &str,
///         payload: &serde_json::Value,
///     ) -> Result<serde_json::Value, TransportError> {
///         Ok(payload.clone())
///     }
/// }
/// ```
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `payload` to `endpoint` and return the parsed JSON body
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Path relative to the transport's base URL; an empty
    ///   string targets the base URL itself
    /// * `payload` - JSON request body
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] describing the failure
    async fn request(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> Result<serde_json::Value, TransportError>;
}
