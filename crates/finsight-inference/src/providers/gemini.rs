//! Gemini provider implementation
//!
//! Uses the `generateContent` endpoint with a JSON response MIME type.
//! See: https://ai.google.dev/api/generate-content

use super::{parse_json_content, status_error};
use crate::{InferenceError, InferenceProvider, InferenceRequest, InferenceResponse, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

const API_KEY_HEADER: &str = "x-goog-api-key";
const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-pro";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for Gemini provider
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub api_base: String,
    pub model: String,
    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Create config from `GEMINI_API_KEY` and optional `GEMINI_MODEL`
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| {
            InferenceError::Configuration("GEMINI_API_KEY environment variable not set".to_string())
        })?;
        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());

        Ok(Self {
            api_key,
            model,
            ..Self::default()
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Gemini provider
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    pub fn with_config(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(GeminiConfig::new(api_key))
    }

    pub fn from_env() -> Result<Self> {
        Self::with_config(GeminiConfig::from_env()?)
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.api_base, self.config.model
        )
    }

    /// HTTP call for one request; the key travels as a header, never in the URL
    fn http_request(&self, request: &InferenceRequest) -> reqwest::RequestBuilder {
        self.client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.config.api_key)
            .json(&self.build_request(request))
    }

    fn build_request(&self, request: &InferenceRequest) -> GeminiRequest {
        GeminiRequest {
            system_instruction: GeminiContent {
                parts: vec![GeminiPart {
                    text: request.system_prompt(),
                }],
            },
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: request.user_prompt(),
                }],
            }],
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
                response_mime_type: "application/json",
            },
        }
    }
}

#[async_trait]
impl InferenceProvider for GeminiProvider {
    #[instrument(
        skip(self, request),
        fields(analysis = %request.analysis_id, model = %self.config.model)
    )]
    async fn submit(&self, request: InferenceRequest) -> Result<InferenceResponse> {
        debug!("Sending request to Gemini model {}", self.config.model);
        let started = Instant::now();

        let response = self.http_request(&request).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, error_text));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            InferenceError::InvalidResponse(format!("Failed to parse response: {e}"))
        })?;

        let text = gemini_response.first_text().ok_or_else(|| {
            InferenceError::InvalidResponse("No candidates in response".to_string())
        })?;

        let data = parse_json_content(&text)?;
        let processing_time_ms = started.elapsed().as_millis() as u64;
        debug!("Received analysis in {processing_time_ms}ms");

        Ok(InferenceResponse {
            data,
            processing_time_ms,
            provider_id: format!("gemini/{}", self.config.model),
        })
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

// ============================================================================
// Gemini-specific request/response types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<GeminiContent>,
}

impl GeminiResponse {
    /// Concatenated text parts of the first candidate
    fn first_text(self) -> Option<String> {
        let content = self.candidates.into_iter().next()?.content?;
        let text: String = content.parts.into_iter().map(|p| p.text).collect();
        (!text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_creation() {
        let provider = GeminiProvider::new("test-key").unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.config().model, "gemini-1.5-pro");
        assert_eq!(
            provider.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-pro:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let provider = GeminiProvider::with_config(
            GeminiConfig::new("test-key").with_model("gemini-1.5-flash"),
        )
        .unwrap();
        let request = InferenceRequest::builder("garch_models")
            .analysis_name("GARCH Models")
            .max_tokens(1500)
            .build();

        let body = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1500);
        assert!(
            body["contents"][0]["parts"][0]["text"]
                .as_str()
                .unwrap()
                .contains("GARCH Models")
        );
        assert!(body["systemInstruction"]["parts"][0]["text"].is_string());
    }

    #[test]
    fn test_api_key_sent_as_header() {
        let provider = GeminiProvider::new("secret-key-123").unwrap();
        let request = InferenceRequest::builder("arima_models").build();

        let http = provider.http_request(&request).build().unwrap();
        assert!(http.url().query().is_none());
        assert!(!http.url().as_str().contains("secret-key-123"));
        assert_eq!(http.headers()[API_KEY_HEADER], "secret-key-123");
    }

    #[tokio::test]
    async fn test_transport_error_hides_api_key() {
        let provider = GeminiProvider::with_config(
            GeminiConfig::new("secret-key-123").with_api_base("http://127.0.0.1:1/v1beta"),
        )
        .unwrap();
        let request = InferenceRequest::builder("arima_models").build();

        let err = provider.submit(request).await.unwrap_err();
        assert!(!err.to_string().contains("secret-key-123"), "{err}");
        assert!(!format!("{err:?}").contains("secret-key-123"));
    }

    #[test]
    fn test_first_text_extraction() {
        let raw = json!({
            "candidates": [
                {"content": {"role": "model", "parts": [{"text": "{\"summary\":"}, {"text": " \"ok\"}"}]}}
            ]
        });
        let parsed: GeminiResponse = serde_json::from_value(raw).unwrap();
        let text = parsed.first_text().unwrap();
        assert_eq!(parse_json_content(&text).unwrap()["summary"], "ok");

        let empty: GeminiResponse = serde_json::from_value(json!({})).unwrap();
        assert!(empty.first_text().is_none());
    }
}
