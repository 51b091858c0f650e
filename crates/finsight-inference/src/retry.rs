//! Provider-side retries
//!
//! Retrying failed backend calls is the provider's concern, never the
//! engine's. [`RetryingProvider`] wraps any provider with a [`RetryPolicy`].

use crate::{InferenceError, InferenceProvider, InferenceRequest, InferenceResponse, Result};
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Exponential backoff applied to retryable provider errors
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,

    pub initial_backoff: Duration,

    pub max_backoff: Duration,

    /// Growth factor between consecutive backoffs
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn new(
        max_attempts: u32,
        initial_backoff: Duration,
        max_backoff: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff,
            max_backoff,
            backoff_multiplier,
        }
    }

    /// Single attempt
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Short backoffs, mostly useful in tests
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(100),
            backoff_multiplier: 2.0,
        }
    }

    /// Backoff to wait before the given retry (1 = first retry)
    pub fn backoff_duration(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi((retry - 1) as i32);

        Duration::from_millis(backoff_ms as u64).min(self.max_backoff)
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error
    /// or runs out of attempts. The last error is returned.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!("Attempt {attempt}/{attempts} for operation: {operation_name}");

            match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!(
                            "Operation '{operation_name}' succeeded after {} retries",
                            attempt - 1
                        );
                    }
                    return Ok(result);
                }
                Err(e) if !e.is_retryable() => {
                    debug!("Operation '{operation_name}' failed with non-retryable error: {e}");
                    return Err(e);
                }
                Err(e) if attempt >= attempts => {
                    warn!("Operation '{operation_name}' failed after {attempts} attempts: {e}");
                    return Err(e);
                }
                Err(e) => {
                    let backoff = self.backoff_duration(attempt);
                    warn!(
                        "Operation '{operation_name}' failed (attempt {attempt}/{attempts}): {e}. Retrying in {backoff:?}"
                    );
                    sleep(backoff).await;
                }
            }
        }
    }
}

/// Provider decorator applying a [`RetryPolicy`] to every submission
pub struct RetryingProvider<P> {
    inner: P,
    policy: RetryPolicy,
}

impl<P: InferenceProvider> RetryingProvider<P> {
    pub fn new(inner: P, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }
}

#[async_trait]
impl<P: InferenceProvider> InferenceProvider for RetryingProvider<P> {
    async fn submit(&self, request: InferenceRequest) -> Result<InferenceResponse> {
        let operation = format!("{}:{}", self.inner.name(), request.analysis_id);
        self.policy
            .execute(&operation, || self.inner.submit(request.clone()))
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_backoff, Duration::from_millis(250));
        assert_eq!(policy.backoff_multiplier, 2.0);
    }

    #[test]
    fn test_backoff_calculation() {
        let policy = RetryPolicy::new(
            5,
            Duration::from_millis(100),
            Duration::from_secs(10),
            2.0,
        );

        assert_eq!(policy.backoff_duration(0), Duration::ZERO);
        assert_eq!(policy.backoff_duration(1), Duration::from_millis(100));
        assert_eq!(policy.backoff_duration(2), Duration::from_millis(200));
        assert_eq!(policy.backoff_duration(3), Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_capped_at_max() {
        let policy = RetryPolicy::new(10, Duration::from_secs(1), Duration::from_secs(5), 2.0);
        assert_eq!(policy.backoff_duration(10), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO, Duration::ZERO, 1.0).max_attempts, 1);
    }

    /// Fails with the given error until `succeed_on` attempts were made
    struct FlakyProvider {
        calls: Arc<AtomicU32>,
        succeed_on: u32,
        error: fn() -> InferenceError,
    }

    #[async_trait]
    impl InferenceProvider for FlakyProvider {
        async fn submit(&self, request: InferenceRequest) -> Result<InferenceResponse> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call >= self.succeed_on {
                Ok(InferenceResponse {
                    data: json!({"analysis": request.analysis_id}),
                    processing_time_ms: 1,
                    provider_id: "flaky".to_string(),
                })
            } else {
                Err((self.error)())
            }
        }

        fn name(&self) -> &str {
            "flaky"
        }
    }

    fn flaky(
        succeed_on: u32,
        error: fn() -> InferenceError,
    ) -> (RetryingProvider<FlakyProvider>, Arc<AtomicU32>) {
        let calls = Arc::new(AtomicU32::new(0));
        let provider = RetryingProvider::new(
            FlakyProvider {
                calls: calls.clone(),
                succeed_on,
                error,
            },
            RetryPolicy::fast(),
        );
        (provider, calls)
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let (provider, calls) = flaky(2, || InferenceError::Unavailable("503".to_string()));

        let response = provider
            .submit(InferenceRequest::builder("var_analysis").build())
            .await
            .unwrap();

        assert_eq!(response.data["analysis"], "var_analysis");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(provider.name(), "flaky");
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let (provider, calls) = flaky(u32::MAX, || InferenceError::Timeout("slow".to_string()));

        let result = provider
            .submit(InferenceRequest::builder("var_analysis").build())
            .await;

        assert!(matches!(result, Err(InferenceError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_non_retryable_error_is_not_retried() {
        let (provider, calls) = flaky(u32::MAX, || InferenceError::AuthenticationFailed);

        let result = provider
            .submit(InferenceRequest::builder("var_analysis").build())
            .await;

        assert!(matches!(result, Err(InferenceError::AuthenticationFailed)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
