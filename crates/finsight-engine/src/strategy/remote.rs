//! Remote inference strategy
//!
//! Delegates an analysis to an [`InferenceProvider`] and maps the provider's
//! error taxonomy onto [`FailureKind`]. Retries are the provider's business;
//! this strategy submits exactly once.

use super::{ComputationStrategy, ExecutionContext};
use async_trait::async_trait;
use finsight_core::{
    AnalysisDefinition, FailureKind, FinancialDataset, StrategyOutcome, StrategyTag,
};
use finsight_inference::{InferenceError, InferenceProvider, InferenceRequest};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Default bound on a single provider call
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(45);

/// Map a provider error onto the failure taxonomy of a result
pub fn failure_kind_for(error: &InferenceError) -> FailureKind {
    match error {
        InferenceError::Timeout(_) => FailureKind::ProviderTimeout,
        InferenceError::InvalidResponse(_) | InferenceError::Serialization(_) => {
            FailureKind::ProviderInvalidResponse
        }
        _ => FailureKind::ProviderUnavailable,
    }
}

/// Build the request sent to a provider for one analysis
pub(crate) fn build_request(
    definition: &AnalysisDefinition,
    dataset: &FinancialDataset,
    ctx: &ExecutionContext,
) -> Result<InferenceRequest, InferenceError> {
    let mut builder = InferenceRequest::builder(definition.id())
        .analysis_name(definition.name().get(ctx.language))
        .category(definition.category().as_str())
        .language(ctx.language)
        .dataset(serde_json::to_value(dataset)?)
        .instructions(format!(
            "This is a {} analysis; use at least {} reporting period(s) of the data.",
            definition.level(),
            definition.required_years()
        ));

    if let Some(profile) = &ctx.profile {
        builder = builder.company(serde_json::to_value(profile)?);
    }

    Ok(builder.build())
}

/// Submit a request under a time bound, folding every error into an outcome
///
/// Only a JSON object counts as an answer.
pub(crate) async fn submit_bounded(
    provider: &dyn InferenceProvider,
    request: InferenceRequest,
    timeout: Duration,
) -> StrategyOutcome {
    let analysis_id = request.analysis_id.clone();

    match tokio::time::timeout(timeout, provider.submit(request)).await {
        Ok(Ok(response)) if !response.data.is_object() => {
            warn!(
                "{} answered '{analysis_id}' with a non-object payload",
                response.provider_id
            );
            StrategyOutcome::failure(
                FailureKind::ProviderInvalidResponse,
                format!("{} returned a payload that is not a JSON object", provider.name()),
            )
        }
        Ok(Ok(response)) => {
            debug!(
                "{} answered '{analysis_id}' in {}ms",
                response.provider_id, response.processing_time_ms
            );
            StrategyOutcome::success(
                response.data,
                response.provider_id,
                response.processing_time_ms,
            )
        }
        Ok(Err(e)) => {
            warn!("Provider '{}' failed on '{analysis_id}': {e}", provider.name());
            StrategyOutcome::failure(failure_kind_for(&e), e.to_string())
        }
        Err(_) => {
            warn!(
                "Provider '{}' did not answer '{analysis_id}' within {timeout:?}",
                provider.name()
            );
            StrategyOutcome::failure(
                FailureKind::ProviderTimeout,
                format!("{} did not answer within {timeout:?}", provider.name()),
            )
        }
    }
}

/// Strategy backed by one remote provider
pub struct RemoteInferenceStrategy {
    tag: StrategyTag,
    provider: Arc<dyn InferenceProvider>,
    timeout: Duration,
}

impl RemoteInferenceStrategy {
    pub fn new(tag: StrategyTag, provider: Arc<dyn InferenceProvider>) -> Self {
        Self {
            tag,
            provider,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    pub fn primary(provider: Arc<dyn InferenceProvider>) -> Self {
        Self::new(StrategyTag::RemoteInferencePrimary, provider)
    }

    pub fn secondary(provider: Arc<dyn InferenceProvider>) -> Self {
        Self::new(StrategyTag::RemoteInferenceSecondary, provider)
    }

    /// Bound on a single provider call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl ComputationStrategy for RemoteInferenceStrategy {
    fn tag(&self) -> StrategyTag {
        self.tag
    }

    async fn execute(
        &self,
        dataset: &FinancialDataset,
        definition: &AnalysisDefinition,
        ctx: &ExecutionContext,
    ) -> StrategyOutcome {
        match build_request(definition, dataset, ctx) {
            Ok(request) => submit_bounded(self.provider.as_ref(), request, self.timeout).await,
            Err(e) => StrategyOutcome::failure(failure_kind_for(&e), e.to_string()),
        }
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use async_trait::async_trait;
    use finsight_inference::{
        InferenceError, InferenceProvider, InferenceRequest, InferenceResponse,
    };
    use serde_json::{Value, json};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Provider answering with a canned result after an optional delay
    pub(crate) struct FakeProvider {
        pub(crate) id: &'static str,
        pub(crate) delay: Duration,
        pub(crate) answer: fn(&InferenceRequest) -> Result<Value, InferenceError>,
        pub(crate) calls: Arc<AtomicUsize>,
    }

    impl FakeProvider {
        pub(crate) fn answering(
            id: &'static str,
            answer: fn(&InferenceRequest) -> Result<Value, InferenceError>,
        ) -> Self {
            Self {
                id,
                delay: Duration::ZERO,
                answer,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Echoes the analysis id with one insight and one recommendation
        pub(crate) fn healthy(id: &'static str) -> Self {
            Self::answering(id, |request| {
                Ok(json!({
                    "summary": format!("{} looks fine", request.analysis_id),
                    "insights": [format!("insight from {}", request.analysis_id)],
                    "recommendations": [{"title": "Reduce leverage", "description": "x"}],
                }))
            })
        }

        pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        pub(crate) fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl InferenceProvider for FakeProvider {
        async fn submit(
            &self,
            request: InferenceRequest,
        ) -> finsight_inference::Result<InferenceResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            Ok(InferenceResponse {
                data: (self.answer)(&request)?,
                processing_time_ms: 7,
                provider_id: self.id.to_string(),
            })
        }

        fn name(&self) -> &str {
            self.id
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fakes::FakeProvider;
    use super::*;
    use crate::strategy::fixtures::three_year_dataset;
    use finsight_core::{CompanyProfile, Language, Sector};
    use serde_json::{Value, json};

    fn definition(id: &str) -> AnalysisDefinition {
        crate::AnalysisRegistry::builtin()
            .unwrap()
            .find_by_id(id)
            .unwrap()
            .clone()
    }

    #[test]
    fn test_failure_kind_mapping() {
        assert_eq!(
            failure_kind_for(&InferenceError::Timeout("slow".into())),
            FailureKind::ProviderTimeout
        );
        assert_eq!(
            failure_kind_for(&InferenceError::InvalidResponse("not json".into())),
            FailureKind::ProviderInvalidResponse
        );
        assert_eq!(
            failure_kind_for(&InferenceError::AuthenticationFailed),
            FailureKind::ProviderUnavailable
        );
        assert_eq!(
            failure_kind_for(&InferenceError::RateLimited("429".into())),
            FailureKind::ProviderUnavailable
        );
    }

    #[test]
    fn test_request_carries_definition_and_profile() {
        let ctx = ExecutionContext::new(Language::Ar)
            .with_profile(CompanyProfile::new(Sector::Financial));
        let request =
            build_request(&definition("var_analysis"), &three_year_dataset(), &ctx).unwrap();

        assert_eq!(request.analysis_id, "var_analysis");
        assert_eq!(request.category, "portfolio_risk");
        assert_eq!(request.language, Language::Ar);
        assert_eq!(request.company.unwrap()["sector"], "financial");
        assert_eq!(request.dataset["incomeStatement"][0]["period"], "2021");
    }

    #[tokio::test]
    async fn test_success_uses_provider_id() {
        let strategy =
            RemoteInferenceStrategy::primary(Arc::new(FakeProvider::healthy("fake/model")));
        let outcome = strategy
            .execute(
                &three_year_dataset(),
                &definition("productivity_analysis"),
                &ExecutionContext::default(),
            )
            .await;

        match outcome {
            StrategyOutcome::Success {
                payload, provider, ..
            } => {
                assert_eq!(provider, "fake/model");
                assert_eq!(payload["summary"], "productivity_analysis looks fine");
            }
            other => panic!("expected success, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_provider_error_is_mapped() {
        let provider = FakeProvider::answering("broken", |_| {
            Err(InferenceError::InvalidResponse("garbage".into()))
        });
        let strategy = RemoteInferenceStrategy::secondary(Arc::new(provider));
        let outcome = strategy
            .execute(
                &three_year_dataset(),
                &definition("arima_models"),
                &ExecutionContext::default(),
            )
            .await;

        assert_eq!(
            outcome.failure_kind(),
            Some(FailureKind::ProviderInvalidResponse)
        );
    }

    #[tokio::test]
    async fn test_non_object_answer_is_invalid() {
        let answers: [fn(&InferenceRequest) -> Result<Value, InferenceError>; 2] = [
            |_| Ok(Value::Null),
            |_| Ok(json!(["not", "an", "object"])),
        ];
        for answer in answers {
            let strategy =
                RemoteInferenceStrategy::primary(Arc::new(FakeProvider::answering("odd", answer)));
            let outcome = strategy
                .execute(
                    &three_year_dataset(),
                    &definition("abc_analysis"),
                    &ExecutionContext::default(),
                )
                .await;

            assert_eq!(
                outcome.failure_kind(),
                Some(FailureKind::ProviderInvalidResponse)
            );
        }
    }

    #[tokio::test]
    async fn test_slow_provider_times_out() {
        let provider = FakeProvider::healthy("sleepy").with_delay(Duration::from_secs(10));
        let strategy = RemoteInferenceStrategy::secondary(Arc::new(provider))
            .with_timeout(Duration::from_millis(50));

        let started = std::time::Instant::now();
        let outcome = strategy
            .execute(
                &three_year_dataset(),
                &definition("garch_models"),
                &ExecutionContext::default(),
            )
            .await;

        assert_eq!(outcome.failure_kind(), Some(FailureKind::ProviderTimeout));
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
