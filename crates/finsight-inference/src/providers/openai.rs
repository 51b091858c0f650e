//! OpenAI-compatible analysis backend
//!
//! Sends one analysis as a chat completion in JSON mode and parses the first
//! choice as the analysis payload. Works against api.openai.com, Azure OpenAI
//! and local OpenAI-compatible servers.
//!
//! # Examples
//!
//! ```no_run
//! use finsight_inference::{InferenceProvider, InferenceRequest};
//! use finsight_inference::providers::OpenAIProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = OpenAIProvider::from_env()?;
//!
//!     let request = InferenceRequest::builder("operational_efficiency")
//!         .analysis_name("Operational Efficiency")
//!         .category("applied_performance")
//!         .build();
//!
//!     let response = provider.submit(request).await?;
//!     println!("{}", response.data);
//!     Ok(())
//! }
//! ```

use super::{parse_json_content, status_error};
use crate::{InferenceError, InferenceProvider, InferenceRequest, InferenceResponse, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, instrument};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_OPENAI_MODEL: &str = "gpt-4-turbo-preview";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Connection settings of the OpenAI-compatible backend
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// Bearer token
    pub api_key: String,

    /// Base URL for the API (default: "https://api.openai.com/v1")
    /// Can point at Azure OpenAI or a local OpenAI-compatible server.
    pub api_base: String,

    /// Model used for every request
    pub model: String,

    /// HTTP timeout in seconds; the engine applies its own bound on top
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Create config from environment variables
    ///
    /// Reads the API key from `OPENAI_API_KEY`. `OPENAI_API_BASE` and
    /// `OPENAI_MODEL` are optional overrides.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            InferenceError::Configuration("OPENAI_API_KEY environment variable not set".to_string())
        })?;

        let api_base = std::env::var("OPENAI_API_BASE")
            .unwrap_or_else(|_| DEFAULT_OPENAI_API_BASE.to_string());
        let model =
            std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_OPENAI_MODEL.to_string());

        Ok(Self {
            api_key,
            api_base,
            model,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
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

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// OpenAI provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Provider for api.openai.com with the default model
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Create a provider from environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env()?)
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn build_request(&self, request: &InferenceRequest) -> OpenAIRequest {
        OpenAIRequest {
            model: self.config.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system",
                    content: request.system_prompt(),
                },
                OpenAIMessage {
                    role: "user",
                    content: request.user_prompt(),
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        }
    }
}

#[async_trait]
impl InferenceProvider for OpenAIProvider {
    #[instrument(
        skip(self, request),
        fields(analysis = %request.analysis_id, model = %self.config.model)
    )]
    async fn submit(&self, request: InferenceRequest) -> Result<InferenceResponse> {
        debug!("Submitting analysis to {}", self.config.api_base);
        let started = Instant::now();

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&self.build_request(&request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await.unwrap_or_default();
            return Err(status_error(status, error_text));
        }

        let openai_response: OpenAIResponse = response.json().await.map_err(|e| {
            InferenceError::InvalidResponse(format!("Failed to parse response: {e}"))
        })?;

        // OpenAI can return multiple choices but we use the first
        let content = openai_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| InferenceError::InvalidResponse("No choices in response".to_string()))?;

        let data = parse_json_content(&content)?;
        let processing_time_ms = started.elapsed().as_millis() as u64;
        debug!("Received analysis in {processing_time_ms}ms");

        Ok(InferenceResponse {
            data,
            processing_time_ms,
            provider_id: format!("openai/{}", self.config.model),
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

// ============================================================================
// OpenAI-specific request/response types
// ============================================================================

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct OpenAIMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsight_core::Language;
    use serde_json::json;

    #[test]
    fn test_provider_creation() {
        let provider = OpenAIProvider::new("test-key").unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.config().api_key, "test-key");
        assert_eq!(provider.config().api_base, "https://api.openai.com/v1");
        assert_eq!(provider.config().model, DEFAULT_OPENAI_MODEL);
    }

    #[test]
    fn test_provider_with_custom_config() {
        let config = OpenAIConfig::new("test-key")
            .with_api_base("http://localhost:1234/v1")
            .with_model("local-model")
            .with_timeout(30);

        let provider = OpenAIProvider::with_config(config).unwrap();
        assert_eq!(provider.config().api_base, "http://localhost:1234/v1");
        assert_eq!(provider.config().model, "local-model");
        assert_eq!(provider.config().timeout_secs, 30);
    }

    #[test]
    fn test_request_body_uses_json_mode() {
        let provider = OpenAIProvider::new("test-key").unwrap();
        let request = InferenceRequest::builder("abc_analysis")
            .analysis_name("Activity-Based Costing")
            .language(Language::Ar)
            .dataset(json!({"incomeStatement": []}))
            .build();

        let body = serde_json::to_value(provider.build_request(&request)).unwrap();
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(
            body["messages"][1]["content"]
                .as_str()
                .unwrap()
                .contains("Activity-Based Costing")
        );
    }

    #[test]
    fn test_response_parsing() {
        let raw = json!({
            "choices": [
                {"message": {"role": "assistant", "content": "{\"summary\": \"stable\"}"}}
            ]
        });
        let parsed: OpenAIResponse = serde_json::from_value(raw).unwrap();
        let content = parsed.choices[0].message.content.as_deref().unwrap();
        assert_eq!(parse_json_content(content).unwrap()["summary"], "stable");
    }

    #[test]
    fn test_from_env_without_key() {
        unsafe {
            std::env::remove_var("OPENAI_API_KEY");
        }
        assert!(matches!(
            OpenAIConfig::from_env(),
            Err(InferenceError::Configuration(_))
        ));
    }
}
