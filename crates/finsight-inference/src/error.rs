//! Error types for inference calls

use thiserror::Error;

/// Result type for inference operations
pub type Result<T> = std::result::Result<T, InferenceError>;

/// Errors a provider can signal
#[derive(Error, Debug)]
pub enum InferenceError {
    /// Backend could not be reached or returned a server error
    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    /// Backend did not answer within its own deadline
    #[error("Provider timed out: {0}")]
    Timeout(String),

    /// Backend answered with something that is not a usable analysis
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),

    #[error("Invalid API key or authentication failed")]
    AuthenticationFailed,

    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Transport error not otherwise classified
    #[cfg(feature = "reqwest")]
    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl InferenceError {
    /// Whether a second attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            InferenceError::Unavailable(_)
            | InferenceError::Timeout(_)
            | InferenceError::RateLimited(_) => true,
            #[cfg(feature = "reqwest")]
            InferenceError::Http(e) => e.is_connect() || e.is_timeout(),
            _ => false,
        }
    }
}

#[cfg(feature = "reqwest")]
impl From<reqwest::Error> for InferenceError {
    /// The request URL is stripped so query parameters never reach messages
    fn from(error: reqwest::Error) -> Self {
        let error = error.without_url();
        if error.is_timeout() {
            InferenceError::Timeout(error.to_string())
        } else if error.is_connect() {
            InferenceError::Unavailable(error.to_string())
        } else if error.is_decode() {
            InferenceError::InvalidResponse(error.to_string())
        } else {
            InferenceError::Http(error)
        }
    }
}
