//! Concrete inference provider implementations
//!
//! This module contains implementations of the InferenceProvider trait for
//! the HTTP backends finsight talks to.

#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "openai")]
pub mod openai;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiConfig, GeminiProvider};
#[cfg(feature = "openai")]
pub use openai::{OpenAIConfig, OpenAIProvider};

use crate::InferenceError;

/// Map a non-success HTTP status to the provider error taxonomy
pub(crate) fn status_error(status: u16, body: String) -> InferenceError {
    match status {
        401 | 403 => InferenceError::AuthenticationFailed,
        429 => InferenceError::RateLimited(body),
        408 | 504 => InferenceError::Timeout(format!("HTTP {status}: {body}")),
        500..=599 => InferenceError::Unavailable(format!("HTTP {status}: {body}")),
        _ => InferenceError::InvalidResponse(format!("HTTP {status}: {body}")),
    }
}

/// Parse model output text as a JSON object.
///
/// Models sometimes wrap JSON in a markdown fence; that wrapper is stripped.
pub(crate) fn parse_json_content(text: &str) -> Result<serde_json::Value, InferenceError> {
    let trimmed = text.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    let value: serde_json::Value = serde_json::from_str(unfenced).map_err(|e| {
        InferenceError::InvalidResponse(format!("model output is not valid JSON: {e}"))
    })?;

    if value.is_object() {
        Ok(value)
    } else {
        Err(InferenceError::InvalidResponse(
            "model output is not a JSON object".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            status_error(401, String::new()),
            InferenceError::AuthenticationFailed
        ));
        assert!(matches!(
            status_error(403, String::new()),
            InferenceError::AuthenticationFailed
        ));
        assert!(matches!(
            status_error(429, "slow down".to_string()),
            InferenceError::RateLimited(_)
        ));
        assert!(matches!(
            status_error(503, String::new()),
            InferenceError::Unavailable(_)
        ));
        assert!(matches!(
            status_error(504, String::new()),
            InferenceError::Timeout(_)
        ));
        assert!(matches!(
            status_error(400, "bad".to_string()),
            InferenceError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_parse_json_content() {
        let value = parse_json_content("{\"summary\": \"ok\"}").unwrap();
        assert_eq!(value["summary"], "ok");

        let fenced = parse_json_content("```json\n{\"summary\": \"fenced\"}\n```").unwrap();
        assert_eq!(fenced["summary"], "fenced");

        assert!(parse_json_content("The company looks healthy.").is_err());
        assert!(parse_json_content("[1, 2]").is_err());
    }
}
