use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use scanchat::session::{ChatMessage, ChatSession, ImagePayload, SessionOptions};
use scanchat::transport::HttpTransport;
use tempfile::TempDir;

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Session talking HTTP to `base_url` with the default endpoints and policy
#[allow(dead_code)]
pub fn http_session(base_url: &str) -> ChatSession {
    let transport = HttpTransport::new(base_url, None).expect("failed to build transport");
    ChatSession::new(Arc::new(transport), SessionOptions::default())
}

/// JSON body of a successful chat reply
#[allow(dead_code)]
pub fn chat_array(messages: &[ChatMessage]) -> serde_json::Value {
    serde_json::json!({ "chatArray": messages })
}

#[allow(dead_code)]
pub fn sample_image() -> ImagePayload {
    ImagePayload::from_base64("/9j/4AAQSkZJRg==")
}

/// Parsed JSON bodies of every request the mock server received
#[allow(dead_code)]
pub async fn received_bodies(server: &wiremock::MockServer) -> Vec<(String, serde_json::Value)> {
    server
        .received_requests()
        .await
        .expect("request recording is enabled")
        .into_iter()
        .map(|request| {
            let body = serde_json::from_slice(&request.body).expect("request body is JSON");
            (request.url.path().to_string(), body)
        })
        .collect()
}
