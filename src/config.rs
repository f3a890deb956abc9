//! Configuration management for ScanChat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, ScanChatError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for ScanChat
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Chat analysis service settings
    #[serde(default)]
    pub api: ApiConfig,
    /// Session behavior settings
    #[serde(default)]
    pub session: SessionConfig,
    /// In-memory history settings
    #[serde(default)]
    pub history: HistoryConfig,
    /// Hosted-inference analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

/// Remote chat analysis service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Endpoint used for turns that carry the image
    #[serde(default = "default_image_path")]
    pub image_path: String,

    /// Endpoint used for follow-up turns that rely on server-side image context
    #[serde(default = "default_chat_path")]
    pub chat_path: String,

    /// Optional per-request timeout (seconds). No timeout when unset.
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_base_url() -> String {
    "https://us-central1-medwrapper.cloudfunctions.net/api".to_string()
}

fn default_image_path() -> String {
    "/image".to_string()
}

fn default_chat_path() -> String {
    "/llm".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            image_path: default_image_path(),
            chat_path: default_chat_path(),
            timeout_seconds: None,
        }
    }
}

impl ApiConfig {
    /// Request timeout as a `Duration`, if one is configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_seconds.map(Duration::from_secs)
    }
}

/// Controls when the image payload accompanies a chat request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImagePolicy {
    /// Send the image until the server has acknowledged it once, then
    /// rely on server-side context for follow-up turns
    #[default]
    FirstTurn,
    /// Send the image with every turn to the image endpoint
    EveryTurn,
}

impl ImagePolicy {
    /// Parse an image policy from a string
    ///
    /// # Examples
    ///
    /// ```
    /// use scanchat::config::ImagePolicy;
    ///
    /// assert_eq!(ImagePolicy::parse_str("every_turn"), Some(ImagePolicy::EveryTurn));
    /// assert_eq!(ImagePolicy::parse_str("First-Turn"), Some(ImagePolicy::FirstTurn));
    /// assert_eq!(ImagePolicy::parse_str("sometimes"), None);
    /// ```
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "first_turn" => Some(Self::FirstTurn),
            "every_turn" => Some(Self::EveryTurn),
            _ => None,
        }
    }
}

/// Session behavior configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// When to include the image in outbound requests
    #[serde(default)]
    pub image_policy: ImagePolicy,
}

/// History configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Maximum number of characters taken from the first user message for a title
    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,

    /// Title used when the conversation has no user text
    #[serde(default = "default_fallback_title")]
    pub fallback_title: String,
}

fn default_title_max_chars() -> usize {
    60
}

fn default_fallback_title() -> String {
    "CT Analysis".to_string()
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            title_max_chars: default_title_max_chars(),
            fallback_title: default_fallback_title(),
        }
    }
}

/// Hosted-inference endpoint configuration for one-shot analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Full URL of the hosted-inference endpoint
    #[serde(default = "default_analysis_url")]
    pub url: String,

    /// Token budget sent as `parameters.max_new_tokens`
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: u32,

    /// Instruction text sent alongside the image
    #[serde(default = "default_analysis_prompt")]
    pub prompt: String,

    /// Optional per-request timeout (seconds)
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

fn default_analysis_url() -> String {
    "https://mqtchfp0ykdm3gum.us-east-1.aws.endpoints.huggingface.cloud".to_string()
}

fn default_max_new_tokens() -> u32 {
    1024
}

fn default_analysis_prompt() -> String {
    crate::analysis::DEFAULT_ANALYSIS_PROMPT.to_string()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            url: default_analysis_url(),
            max_new_tokens: default_max_new_tokens(),
            prompt: default_analysis_prompt(),
            timeout_seconds: None,
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error: defaults are used and a warning is
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ScanChatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ScanChatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("SCANCHAT_BASE_URL") {
            self.api.base_url = base_url;
        }

        if let Ok(image_path) = std::env::var("SCANCHAT_IMAGE_PATH") {
            self.api.image_path = image_path;
        }

        if let Ok(chat_path) = std::env::var("SCANCHAT_CHAT_PATH") {
            self.api.chat_path = chat_path;
        }

        if let Ok(timeout) = std::env::var("SCANCHAT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.api.timeout_seconds = Some(value);
            } else {
                tracing::warn!("Invalid SCANCHAT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(policy) = std::env::var("SCANCHAT_IMAGE_POLICY") {
            match ImagePolicy::parse_str(&policy) {
                Some(value) => self.session.image_policy = value,
                None => tracing::warn!("Invalid SCANCHAT_IMAGE_POLICY: {}", policy),
            }
        }

        if let Ok(url) = std::env::var("SCANCHAT_ANALYSIS_URL") {
            self.analysis.url = url;
        }

        if let Ok(max_tokens) = std::env::var("SCANCHAT_MAX_NEW_TOKENS") {
            if let Ok(value) = max_tokens.parse() {
                self.analysis.max_new_tokens = value;
            } else {
                tracing::warn!("Invalid SCANCHAT_MAX_NEW_TOKENS: {}", max_tokens);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
        if let Some(base_url) = &cli.base_url {
            tracing::debug!("Using base URL override: {}", base_url);
            self.api.base_url = base_url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        validate_url("api.base_url", &self.api.base_url)?;
        validate_url("analysis.url", &self.analysis.url)?;

        if self.api.image_path.trim().is_empty() {
            return Err(
                ScanChatError::Config("api.image_path cannot be empty".to_string()).into(),
            );
        }

        if self.api.chat_path.trim().is_empty() {
            return Err(ScanChatError::Config("api.chat_path cannot be empty".to_string()).into());
        }

        if self.api.timeout_seconds == Some(0) || self.analysis.timeout_seconds == Some(0) {
            return Err(ScanChatError::Config(
                "timeout_seconds must be greater than 0 when set".to_string(),
            )
            .into());
        }

        if self.history.title_max_chars == 0 {
            return Err(ScanChatError::Config(
                "history.title_max_chars must be greater than 0".to_string(),
            )
            .into());
        }

        if self.history.fallback_title.trim().is_empty() {
            return Err(ScanChatError::Config(
                "history.fallback_title cannot be empty".to_string(),
            )
            .into());
        }

        if self.analysis.max_new_tokens == 0 {
            return Err(ScanChatError::Config(
                "analysis.max_new_tokens must be greater than 0".to_string(),
            )
            .into());
        }

        Ok(())
    }
}

fn validate_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value)
        .map_err(|e| ScanChatError::Config(format!("Invalid {}: {} ({})", field, value, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ScanChatError::Config(format!(
            "Invalid {} scheme: {}. Must be http or https",
            field, other
        ))
        .into()),
    }
}
