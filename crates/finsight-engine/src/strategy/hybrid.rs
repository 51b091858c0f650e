//! Hybrid strategy: two providers on the same analysis
//!
//! Both providers are asked concurrently and both are allowed to settle. The
//! merged payload keeps each raw answer and combines their insights and
//! recommendations. A partial success is reported with a reduced confidence
//! scale equal to the weight of the side that answered.

use super::remote::{DEFAULT_PROVIDER_TIMEOUT, build_request, failure_kind_for, submit_bounded};
use super::{ComputationStrategy, ExecutionContext};
use async_trait::async_trait;
use finsight_core::{AnalysisDefinition, FinancialDataset, StrategyOutcome, StrategyTag};
use finsight_inference::InferenceProvider;
use serde_json::{Map, Value, json};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const PRIMARY_WEIGHT: f64 = 0.6;
pub const SECONDARY_WEIGHT: f64 = 0.4;

/// Strategy combining a primary and a secondary provider
pub struct HybridStrategy {
    primary: Arc<dyn InferenceProvider>,
    secondary: Arc<dyn InferenceProvider>,
    timeout: Duration,
}

impl HybridStrategy {
    pub fn new(primary: Arc<dyn InferenceProvider>, secondary: Arc<dyn InferenceProvider>) -> Self {
        Self {
            primary,
            secondary,
            timeout: DEFAULT_PROVIDER_TIMEOUT,
        }
    }

    /// Bound on each provider call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ComputationStrategy for HybridStrategy {
    fn tag(&self) -> StrategyTag {
        StrategyTag::RemoteInferenceHybrid
    }

    async fn execute(
        &self,
        dataset: &FinancialDataset,
        definition: &AnalysisDefinition,
        ctx: &ExecutionContext,
    ) -> StrategyOutcome {
        let request = match build_request(definition, dataset, ctx) {
            Ok(request) => request,
            Err(e) => return StrategyOutcome::failure(failure_kind_for(&e), e.to_string()),
        };

        let (primary, secondary) = tokio::join!(
            submit_bounded(self.primary.as_ref(), request.clone(), self.timeout),
            submit_bounded(self.secondary.as_ref(), request, self.timeout),
        );
        debug!(
            "Hybrid '{}': primary ok={}, secondary ok={}",
            definition.id(),
            primary.is_success(),
            secondary.is_success()
        );

        merge(primary, secondary)
    }
}

/// One side of a hybrid run after it settled
struct Side {
    payload: Option<Value>,
    provider: Option<String>,
    duration_ms: u64,
    error: Option<String>,
}

impl From<StrategyOutcome> for Side {
    fn from(outcome: StrategyOutcome) -> Self {
        match outcome {
            StrategyOutcome::Success {
                payload,
                provider,
                duration_ms,
                ..
            } => Side {
                payload: Some(payload),
                provider: Some(provider),
                duration_ms,
                error: None,
            },
            StrategyOutcome::Failure { message, .. } => Side {
                payload: None,
                provider: None,
                duration_ms: 0,
                error: Some(message),
            },
        }
    }
}

fn array_field<'a>(payload: Option<&'a Value>, field: &str) -> impl Iterator<Item = &'a Value> {
    payload
        .and_then(|p| p.get(field))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
}

fn merge(primary: StrategyOutcome, secondary: StrategyOutcome) -> StrategyOutcome {
    if let (
        StrategyOutcome::Failure { kind, message },
        StrategyOutcome::Failure {
            message: secondary_message,
            ..
        },
    ) = (&primary, &secondary)
    {
        return StrategyOutcome::failure(
            *kind,
            format!("primary: {message}; secondary: {secondary_message}"),
        );
    }

    let primary = Side::from(primary);
    let secondary = Side::from(secondary);

    let combined_insights: Vec<Value> = array_field(primary.payload.as_ref(), "insights")
        .chain(array_field(secondary.payload.as_ref(), "insights"))
        .cloned()
        .collect();

    let mut seen = HashSet::new();
    let recommendations: Vec<Value> = array_field(primary.payload.as_ref(), "recommendations")
        .chain(array_field(secondary.payload.as_ref(), "recommendations"))
        .filter(|rec| match rec.get("title").and_then(Value::as_str) {
            Some(title) => seen.insert(title.to_string()),
            None => true,
        })
        .cloned()
        .collect();

    let mut errors = Map::new();
    for (side, error) in [("primary", &primary.error), ("secondary", &secondary.error)] {
        if let Some(error) = error {
            errors.insert(side.to_string(), Value::String(error.clone()));
        }
    }

    let scale = [
        (primary.payload.is_some(), PRIMARY_WEIGHT),
        (secondary.payload.is_some(), SECONDARY_WEIGHT),
    ]
    .iter()
    .filter(|(ok, _)| *ok)
    .map(|(_, weight)| weight)
    .sum::<f64>();

    let provider = [&primary.provider, &secondary.provider]
        .into_iter()
        .flatten()
        .cloned()
        .collect::<Vec<_>>()
        .join("+");

    let mut payload = json!({
        "primary": primary.payload,
        "secondary": secondary.payload,
        "combined_insights": combined_insights,
        "recommendations": recommendations,
    });
    if !errors.is_empty() {
        payload["errors"] = Value::Object(errors);
    }

    StrategyOutcome::success(
        payload,
        provider,
        primary.duration_ms.max(secondary.duration_ms),
    )
    .with_confidence_scale(scale)
}
