//! Error types for ScanChat
//!
//! This module defines the crate-level error type used by configuration
//! loading, image payload preparation and the CLI, using `thiserror` for
//! ergonomic error handling. Errors that belong to a single component
//! (transport, session, analysis) live next to that component.

use thiserror::Error;

/// Main error type for ScanChat operations
///
/// Covers configuration, payload preparation, terminal I/O and the
/// conversions from the library errors the crate relies on.
#[derive(Error, Debug)]
pub enum ScanChatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Image payload preparation errors (read, decode, encode)
    #[error("Image payload error: {0}")]
    Payload(String),

    /// Interactive prompt errors
    #[error("Readline error: {0}")]
    Readline(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for ScanChat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = ScanChatError::Config("invalid format".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid format");
    }

    #[test]
    fn test_payload_error_display() {
        let error = ScanChatError::Payload("unsupported image".to_string());
        assert_eq!(error.to_string(), "Image payload error: unsupported image");
    }

    #[test]
    fn test_readline_error_display() {
        let error = ScanChatError::Readline("interrupted".to_string());
        assert_eq!(error.to_string(), "Readline error: interrupted");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: ScanChatError = io_error.into();
        assert!(matches!(error, ScanChatError::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_error = serde_json::from_str::<serde_json::Value>("{invalid json}").unwrap_err();
        let error: ScanChatError = json_error.into();
        assert!(matches!(error, ScanChatError::Serialization(_)));
    }

    #[test]
    fn test_yaml_error_conversion() {
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>("invalid: : yaml").unwrap_err();
        let error: ScanChatError = yaml_error.into();
        assert!(matches!(error, ScanChatError::Yaml(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ScanChatError>();
    }
}
