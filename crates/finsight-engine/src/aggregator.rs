//! Result aggregation and the confidence model
//!
//! Turns per-task outcomes into [`AnalysisResult`]s and assembles the batch.

use crate::strategy::hybrid::{PRIMARY_WEIGHT, SECONDARY_WEIGHT};
use chrono::Utc;
use finsight_core::{
    AnalysisResult, Batch, EngineError, FailureInfo, Provenance, Result, StrategyOutcome,
    StrategyTag,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Confidence assigned to successful and failed results
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidencePolicy {
    pub success: f64,
    pub failure: f64,
}

impl Default for ConfidencePolicy {
    fn default() -> Self {
        Self {
            success: 0.9,
            failure: 0.1,
        }
    }
}

impl ConfidencePolicy {
    pub fn new(success: f64, failure: f64) -> Self {
        Self { success, failure }
    }

    /// Both values must lie in [0, 1] and every success, including a hybrid
    /// run where only the lighter provider answered, must rank above failure
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("success", self.success), ("failure", self.failure)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} confidence {value} is outside [0, 1]"
                )));
            }
        }
        if self.success <= self.failure {
            return Err(EngineError::InvalidConfig(format!(
                "success confidence {} must be greater than failure confidence {}",
                self.success, self.failure
            )));
        }
        let weakest = self.success * PRIMARY_WEIGHT.min(SECONDARY_WEIGHT);
        if weakest <= self.failure {
            return Err(EngineError::InvalidConfig(format!(
                "partial success confidence {weakest} must be greater than failure confidence {}",
                self.failure
            )));
        }
        Ok(())
    }
}

/// Wraps strategy outcomes into results
#[derive(Debug, Clone, Copy, Default)]
pub struct ResultAggregator {
    policy: ConfidencePolicy,
}

impl ResultAggregator {
    pub fn new(policy: ConfidencePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &ConfidencePolicy {
        &self.policy
    }

    /// Build the result for one requested id
    ///
    /// `elapsed` is the orchestrator's own measurement. A success reports
    /// the strategy's duration instead.
    pub fn wrap(
        &self,
        definition_id: &str,
        strategy: Option<StrategyTag>,
        outcome: StrategyOutcome,
        elapsed: Duration,
    ) -> AnalysisResult {
        let timestamp_utc = Utc::now();

        match outcome {
            StrategyOutcome::Success {
                payload,
                provider,
                duration_ms,
                confidence_scale,
            } => AnalysisResult {
                definition_id: definition_id.to_string(),
                payload: Some(payload),
                confidence: (self.policy.success * confidence_scale).clamp(0.0, 1.0),
                timestamp_utc,
                processing_duration_ms: duration_ms,
                provenance: Provenance {
                    strategy,
                    provider: Some(provider),
                    failure: None,
                },
            },
            StrategyOutcome::Failure { kind, message } => AnalysisResult {
                definition_id: definition_id.to_string(),
                payload: None,
                confidence: self.policy.failure,
                timestamp_utc,
                processing_duration_ms: elapsed.as_millis() as u64,
                provenance: Provenance {
                    strategy,
                    provider: None,
                    failure: Some(FailureInfo { kind, message }),
                },
            },
        }
    }

    pub fn assemble(&self, results: Vec<AnalysisResult>) -> Batch {
        Batch::new(results)
    }
}
