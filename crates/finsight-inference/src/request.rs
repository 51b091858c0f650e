//! Inference request and response types

use finsight_core::Language;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One analysis to be performed by a remote backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InferenceRequest {
    /// Catalog id of the analysis (e.g. "var_analysis")
    pub analysis_id: String,

    /// Human-readable analysis name in the requested language
    pub analysis_name: String,

    /// Catalog category of the analysis
    pub category: String,

    /// Language the backend should answer in
    pub language: Language,

    /// Free-form guidance appended to the prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Serialized financial dataset
    pub dataset: Value,

    /// Serialized company profile, if one was supplied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<Value>,

    /// Maximum tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature (0.0-1.0)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl InferenceRequest {
    /// Create a builder for inference requests
    pub fn builder(analysis_id: impl Into<String>) -> InferenceRequestBuilder {
        InferenceRequestBuilder::new(analysis_id)
    }

    /// System prompt shared by all chat-style backends
    pub fn system_prompt(&self) -> String {
        let languages = match self.language {
            Language::Ar => "Arabic and English financial analysis",
            Language::En => "financial analysis",
        };
        format!(
            "You are a senior financial analyst with expertise in {languages}. \
             Provide detailed, accurate, and professional financial analysis. \
             Always include specific numbers, ratios, and actionable insights. \
             Respond with a single JSON object only."
        )
    }

    /// User prompt carrying the analysis and the data
    pub fn user_prompt(&self) -> String {
        let language = match self.language {
            Language::Ar => "Arabic",
            Language::En => "English",
        };

        let mut prompt = format!(
            "Perform the \"{}\" analysis (id: {}, category: {}) on the following financial data.\n\n\
             Financial data:\n{}\n",
            self.analysis_name,
            self.analysis_id,
            self.category,
            serde_json::to_string_pretty(&self.dataset).unwrap_or_default()
        );

        if let Some(company) = &self.company {
            prompt.push_str(&format!(
                "\nCompany profile:\n{}\n",
                serde_json::to_string_pretty(company).unwrap_or_default()
            ));
        }

        if let Some(instructions) = &self.instructions {
            prompt.push('\n');
            prompt.push_str(instructions);
            prompt.push('\n');
        }

        prompt.push_str(&format!(
            "\nReturn a JSON object with the fields \"summary\" (string), \"metrics\" (object), \
             \"insights\" (array of strings) and \"recommendations\" (array of objects with \
             \"title\" and \"description\"). Write all text in {language}."
        ));

        prompt
    }
}

/// Builder for InferenceRequest
pub struct InferenceRequestBuilder {
    analysis_id: String,
    analysis_name: Option<String>,
    category: String,
    language: Language,
    instructions: Option<String>,
    dataset: Value,
    company: Option<Value>,
    max_tokens: u32,
    temperature: Option<f32>,
}

impl InferenceRequestBuilder {
    /// Create a new builder
    pub fn new(analysis_id: impl Into<String>) -> Self {
        Self {
            analysis_id: analysis_id.into(),
            analysis_name: None,
            category: String::new(),
            language: Language::default(),
            instructions: None,
            dataset: Value::Null,
            company: None,
            max_tokens: 4000,
            temperature: Some(0.3),
        }
    }

    pub fn analysis_name(mut self, name: impl Into<String>) -> Self {
        self.analysis_name = Some(name.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn language(mut self, language: Language) -> Self {
        self.language = language;
        self
    }

    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    pub fn dataset(mut self, dataset: Value) -> Self {
        self.dataset = dataset;
        self
    }

    pub fn company(mut self, company: Value) -> Self {
        self.company = Some(company);
        self
    }

    /// Set the maximum tokens
    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Build the request
    pub fn build(self) -> InferenceRequest {
        let analysis_name = self
            .analysis_name
            .unwrap_or_else(|| self.analysis_id.clone());

        InferenceRequest {
            analysis_id: self.analysis_id,
            analysis_name,
            category: self.category,
            language: self.language,
            instructions: self.instructions,
            dataset: self.dataset,
            company: self.company,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}

/// Successful answer from a backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceResponse {
    /// Structured analysis produced by the backend
    pub data: Value,

    /// Wall-clock time the backend took
    pub processing_time_ms: u64,

    /// Identifier of the backend (and model) that answered
    pub provider_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_defaults() {
        let request = InferenceRequest::builder("var_analysis").build();
        assert_eq!(request.analysis_id, "var_analysis");
        assert_eq!(request.analysis_name, "var_analysis");
        assert_eq!(request.language, Language::En);
        assert_eq!(request.max_tokens, 4000);
        assert!(request.company.is_none());
    }

    #[test]
    fn test_builder_full() {
        let request = InferenceRequest::builder("stress_testing")
            .analysis_name("Stress Testing")
            .category("portfolio_risk")
            .language(Language::Ar)
            .dataset(json!({"incomeStatement": []}))
            .company(json!({"sector": "financial"}))
            .instructions("Focus on liquidity shocks.")
            .max_tokens(2000)
            .temperature(0.1)
            .build();

        assert_eq!(request.category, "portfolio_risk");
        assert_eq!(request.temperature, Some(0.1));
        assert_eq!(request.max_tokens, 2000);

        let prompt = request.user_prompt();
        assert!(prompt.contains("Stress Testing"));
        assert!(prompt.contains("Company profile"));
        assert!(prompt.contains("Focus on liquidity shocks."));
        assert!(prompt.contains("Arabic"));
        assert!(request.system_prompt().contains("Arabic and English"));
    }
}
