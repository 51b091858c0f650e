//! Inference provider trait definition

use crate::{InferenceRequest, InferenceResponse, Result};
use async_trait::async_trait;

/// Trait for remote inference backends
///
/// A provider either returns within its own deadline or signals failure.
/// Authentication, model selection and retries are the provider's business.
#[async_trait]
pub trait InferenceProvider: Send + Sync {
    /// Submit one analysis request
    ///
    /// # Arguments
    ///
    /// * `request` - The analysis to perform together with the dataset
    ///
    /// # Returns
    ///
    /// The structured analysis produced by the backend
    async fn submit(&self, request: InferenceRequest) -> Result<InferenceResponse>;

    /// Get the provider name (e.g., "openai", "gemini")
    fn name(&self) -> &str;
}
