//! One-shot CT analysis against a hosted-inference endpoint
//!
//! The hosted endpoint takes the image as a `data:` URI together with an
//! instruction prompt and answers with generated text, either as
//! `[{"generated_text": ...}]` or as `{"generated_text": ...}`.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::AnalysisConfig;
use crate::session::{ImagePayload, SessionStatus};
use crate::transport::{Transport, TransportError};

/// Instruction sent with the image when none is configured
pub const DEFAULT_ANALYSIS_PROMPT: &str = "Analyze this CT scan and provide a detailed assessment including:

1. Anatomical Region: Identify the body part and scan plane (axial/coronal/sagittal)

2. Image Quality: Comment on contrast, resolution, and any artifacts

3. Normal Findings: Describe normal anatomical structures visible

4. Abnormalities: Identify any conditions or abnormalities present, including:
   - Location and size
   - Density/appearance characteristics
   - Clinical significance

5. Differential Diagnoses: List possible conditions based on findings

6. Recommendations: Suggest any follow-up imaging or clinical correlation needed

Please provide a structured, clinically-oriented analysis.";

/// Failure of a hosted-inference analysis
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    /// The request itself failed
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The body matched neither documented response shape
    #[error("Unexpected response shape: {0}")]
    UnexpectedShape(String),
}

#[derive(Debug, Serialize)]
struct InferenceRequest<'a> {
    inputs: InferenceInputs<'a>,
    parameters: InferenceParameters,
}

#[derive(Debug, Serialize)]
struct InferenceInputs<'a> {
    image: String,
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct InferenceParameters {
    max_new_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GeneratedItem {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InferenceResponse {
    Batch(Vec<GeneratedItem>),
    Single(GeneratedItem),
}

/// Text extracted from a hosted-inference response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedText(pub String);

impl GeneratedText {
    /// Parse either documented response shape
    ///
    /// Shape A is an array whose first element carries `generated_text`;
    /// shape B is an object carrying it directly. The text is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::UnexpectedShape`] for anything else,
    /// including an empty array.
    ///
    /// # Examples
    ///
    /// ```
    /// use scanchat::analysis::GeneratedText;
    ///
    /// let a = GeneratedText::from_value(serde_json::json!([{"generated_text": " axial "}])).unwrap();
    /// let b = GeneratedText::from_value(serde_json::json!({"generated_text": "axial"})).unwrap();
    /// assert_eq!(a, b);
    /// assert!(GeneratedText::from_value(serde_json::json!({"text": "axial"})).is_err());
    /// ```
    pub fn from_value(value: serde_json::Value) -> Result<Self, AnalysisError> {
        let response: InferenceResponse = serde_json::from_value(value)
            .map_err(|e| AnalysisError::UnexpectedShape(e.to_string()))?;
        let item = match response {
            InferenceResponse::Batch(items) => items
                .into_iter()
                .next()
                .ok_or_else(|| AnalysisError::UnexpectedShape("empty result array".to_string()))?,
            InferenceResponse::Single(item) => item,
        };
        Ok(Self(item.generated_text.trim().to_string()))
    }
}

/// Outcome of the most recent analysis
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisState {
    /// Generated findings of the last successful analysis
    pub result: Option<String>,
    /// Request status
    pub status: SessionStatus,
}

/// Runs one-shot analyses and keeps the latest result
pub struct CtAnalyzer {
    transport: Arc<dyn Transport>,
    prompt: String,
    max_new_tokens: u32,
    state: AnalysisState,
}

impl CtAnalyzer {
    /// Create an analyzer; `transport` must be rooted at the inference URL
    pub fn new(transport: Arc<dyn Transport>, config: &AnalysisConfig) -> Self {
        Self {
            transport,
            prompt: config.prompt.clone(),
            max_new_tokens: config.max_new_tokens,
            state: AnalysisState::default(),
        }
    }

    /// Latest state
    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    /// Analyse `image` and return the generated findings
    ///
    /// The previous result is cleared before the request is sent. On
    /// failure the state carries the error message.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError`] when the request fails or the response
    /// has an unexpected shape.
    pub async fn analyze(&mut self, image: &ImagePayload) -> Result<String, AnalysisError> {
        self.state = AnalysisState {
            result: None,
            status: SessionStatus::Sending,
        };

        let request = InferenceRequest {
            inputs: InferenceInputs {
                image: image.to_data_uri(),
                text: &self.prompt,
            },
            parameters: InferenceParameters {
                max_new_tokens: self.max_new_tokens,
            },
        };
        tracing::info!(
            "Requesting hosted analysis ({} byte image, max_new_tokens={})",
            image.len(),
            self.max_new_tokens
        );

        let outcome = match serde_json::to_value(&request) {
            Ok(payload) => self
                .transport
                .request("", &payload)
                .await
                .map_err(AnalysisError::from)
                .and_then(GeneratedText::from_value),
            Err(e) => Err(AnalysisError::UnexpectedShape(e.to_string())),
        };

        match outcome {
            Ok(GeneratedText(text)) => {
                tracing::info!("Analysis completed ({} chars)", text.len());
                self.state = AnalysisState {
                    result: Some(text.clone()),
                    status: SessionStatus::Idle,
                };
                Ok(text)
            }
            Err(e) => {
                tracing::warn!("Analysis failed: {}", e);
                self.state = AnalysisState {
                    result: None,
                    status: SessionStatus::Error(e.to_string()),
                };
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct OneShot {
        reply: Mutex<Option<Result<serde_json::Value, TransportError>>>,
        seen: Mutex<Option<(String, serde_json::Value)>>,
    }

    impl OneShot {
        fn new(reply: Result<serde_json::Value, TransportError>) -> Arc<Self> {
            Arc::new(Self {
                reply: Mutex::new(Some(reply)),
                seen: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl Transport for OneShot {
        async fn request(
            &self,
            endpoint: &str,
            payload: &serde_json::Value,
        ) -> Result<serde_json::Value, TransportError> {
            *self.seen.lock().unwrap() = Some((endpoint.to_string(), payload.clone()));
            self.reply.lock().unwrap().take().unwrap()
        }
    }

    #[test]
    fn test_parse_batch_shape() {
        let text = GeneratedText::from_value(serde_json::json!([
            {"generated_text": "  Axial chest CT.  "},
            {"generated_text": "ignored"}
        ]))
        .unwrap();
        assert_eq!(text.0, "Axial chest CT.");
    }

    #[test]
    fn test_parse_single_shape() {
        let value = serde_json::json!({"generated_text": "Coronal view"});
        let text = GeneratedText::from_value(value).unwrap();
        assert_eq!(text.0, "Coronal view");
    }

    #[test]
    fn test_parse_rejects_empty_array() {
        let err = GeneratedText::from_value(serde_json::json!([])).unwrap_err();
        assert!(matches!(err, AnalysisError::UnexpectedShape(_)));
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        for value in [
            serde_json::json!({"chatArray": []}),
            serde_json::json!("plain text"),
            serde_json::json!([{"text": "x"}]),
        ] {
            assert!(GeneratedText::from_value(value).is_err());
        }
    }

    #[tokio::test]
    async fn test_analyze_builds_inference_request() {
        let transport = OneShot::new(Ok(serde_json::json!([{"generated_text": "Findings"}])));
        let mut analyzer = CtAnalyzer::new(transport.clone(), &AnalysisConfig::default());

        let text = analyzer.analyze(&ImagePayload::from_base64("AAAA")).await.unwrap();

        assert_eq!(text, "Findings");
        assert_eq!(analyzer.state().result.as_deref(), Some("Findings"));
        assert_eq!(analyzer.state().status, SessionStatus::Idle);

        let (endpoint, payload) = transport.seen.lock().unwrap().clone().unwrap();
        assert_eq!(endpoint, "");
        assert_eq!(payload["inputs"]["image"], "data:image/jpeg;base64,AAAA");
        assert_eq!(payload["inputs"]["text"], DEFAULT_ANALYSIS_PROMPT);
        assert_eq!(payload["parameters"]["max_new_tokens"], 1024);
    }

    #[tokio::test]
    async fn test_analyze_failure_sets_error_state() {
        let transport = OneShot::new(Err(TransportError::Server {
            status: 503,
            body: "model loading".to_string(),
        }));
        let mut analyzer = CtAnalyzer::new(transport, &AnalysisConfig::default());

        let err = analyzer
            .analyze(&ImagePayload::from_base64("AAAA"))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Server error 503: model loading");
        assert_eq!(
            analyzer.state().status.error_message(),
            Some("Server error 503: model loading")
        );
        assert!(analyzer.state().result.is_none());
    }
}
