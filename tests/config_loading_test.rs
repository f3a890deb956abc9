//! Configuration loading tests: file, environment and CLI layers
//!
//! Environment variables are process-global, so every test that touches
//! them runs serially.

mod common;

use serial_test::serial;

use common::temp_config_file;
use scanchat::cli::Cli;
use scanchat::config::{Config, ImagePolicy};

const ENV_VARS: &[&str] = &[
    "SCANCHAT_BASE_URL",
    "SCANCHAT_IMAGE_PATH",
    "SCANCHAT_CHAT_PATH",
    "SCANCHAT_TIMEOUT_SECONDS",
    "SCANCHAT_IMAGE_POLICY",
    "SCANCHAT_ANALYSIS_URL",
    "SCANCHAT_MAX_NEW_TOKENS",
];

fn clear_env() {
    for name in ENV_VARS {
        std::env::remove_var(name);
    }
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    clear_env();

    let config = Config::load("/nonexistent/scanchat.yaml", &Cli::default()).unwrap();

    assert_eq!(config.api.image_path, "/image");
    assert_eq!(config.api.chat_path, "/llm");
    assert_eq!(config.session.image_policy, ImagePolicy::FirstTurn);
    assert_eq!(config.history.fallback_title, "CT Analysis");
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_file_values_are_loaded() {
    clear_env();
    let (_dir, path) = temp_config_file(
        r#"
api:
  base_url: http://localhost:8080/api
  timeout_seconds: 30
session:
  image_policy: every_turn
history:
  title_max_chars: 20
analysis:
  max_new_tokens: 256
"#,
    );

    let config = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap();

    assert_eq!(config.api.base_url, "http://localhost:8080/api");
    assert_eq!(config.api.timeout_seconds, Some(30));
    assert_eq!(config.api.chat_path, "/llm");
    assert_eq!(config.session.image_policy, ImagePolicy::EveryTurn);
    assert_eq!(config.history.title_max_chars, 20);
    assert_eq!(config.history.fallback_title, "CT Analysis");
    assert_eq!(config.analysis.max_new_tokens, 256);
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn test_env_overrides_file_and_cli_overrides_env() {
    clear_env();
    let (_dir, path) = temp_config_file("api:\n  base_url: http://file.example/api\n");
    std::env::set_var("SCANCHAT_BASE_URL", "http://env.example/api");
    std::env::set_var("SCANCHAT_IMAGE_POLICY", "every_turn");
    std::env::set_var("SCANCHAT_MAX_NEW_TOKENS", "512");

    let from_env = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap();
    let cli = Cli {
        base_url: Some("http://cli.example/api".to_string()),
        ..Cli::default()
    };
    let from_cli = Config::load(path.to_str().unwrap(), &cli).unwrap();
    clear_env();

    assert_eq!(from_env.api.base_url, "http://env.example/api");
    assert_eq!(from_env.session.image_policy, ImagePolicy::EveryTurn);
    assert_eq!(from_env.analysis.max_new_tokens, 512);
    assert_eq!(from_cli.api.base_url, "http://cli.example/api");
}

#[test]
#[serial]
fn test_invalid_env_values_are_ignored() {
    clear_env();
    std::env::set_var("SCANCHAT_TIMEOUT_SECONDS", "soon");
    std::env::set_var("SCANCHAT_IMAGE_POLICY", "sometimes");

    let config = Config::load("/nonexistent/scanchat.yaml", &Cli::default()).unwrap();
    clear_env();

    assert_eq!(config.api.timeout_seconds, None);
    assert_eq!(config.session.image_policy, ImagePolicy::FirstTurn);
}

#[test]
#[serial]
fn test_malformed_file_is_an_error() {
    clear_env();
    let (_dir, path) = temp_config_file("api: [not, a, mapping");

    let err = Config::load(path.to_str().unwrap(), &Cli::default()).unwrap_err();

    assert!(err.to_string().contains("Failed to parse config"));
}

#[test]
#[serial]
fn test_validate_rejects_bad_base_url() {
    clear_env();
    std::env::set_var("SCANCHAT_BASE_URL", "ftp://example.com/api");

    let config = Config::load("/nonexistent/scanchat.yaml", &Cli::default()).unwrap();
    clear_env();

    assert!(config.validate().is_err());
}
