//! HTTP transport backed by `reqwest`
//!
//! Every request is a `POST` with a JSON body and the headers
//! `Content-Type: application/json` and `Accept: application/json`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::Client;

use crate::error::{Result, ScanChatError};
use crate::transport::{Transport, TransportError};

/// JSON-over-HTTP transport rooted at a base URL
///
/// # Examples
///
/// ```
/// use scanchat::transport::HttpTransport;
///
/// let transport = HttpTransport::new("http://localhost:8080/api", None).unwrap();
/// assert_eq!(transport.endpoint_url("/image"), "http://localhost:8080/api/image");
/// ```
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `base_url`
    ///
    /// # Arguments
    ///
    /// * `base_url` - URL every endpoint path is appended to
    /// * `timeout` - Optional per-request timeout; `None` waits indefinitely
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(base_url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder =
            Client::builder().user_agent(concat!("scanchat/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ScanChatError::Http)?;

        let base_url = base_url.into();
        tracing::debug!("Initialized HTTP transport: base_url={}", base_url);

        Ok(Self { client, base_url })
    }

    /// Full URL for an endpoint path
    ///
    /// Exactly one `/` separates the base URL and the path. An empty path
    /// yields the base URL unchanged.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        let endpoint = endpoint.trim_start_matches('/');
        if endpoint.is_empty() {
            return self.base_url.clone();
        }
        format!("{}/{}", self.base_url.trim_end_matches('/'), endpoint)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn request(
        &self,
        endpoint: &str,
        payload: &serde_json::Value,
    ) -> std::result::Result<serde_json::Value, TransportError> {
        let url = self.endpoint_url(endpoint);
        tracing::debug!("POST {}", url);

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(payload)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!("Request to {} failed: {}", url, e);
                TransportError::Network {
                    cause: e.to_string(),
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::warn!("Failed to read response body from {}: {}", url, e);
            TransportError::Network {
                cause: e.to_string(),
            }
        })?;

        if !status.is_success() {
            tracing::error!("Server returned error {}: {}", status, body);
            return Err(TransportError::Server {
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse response from {}: {}", url, e);
            TransportError::Decode {
                cause: e.to_string(),
            }
        })
    }
}
