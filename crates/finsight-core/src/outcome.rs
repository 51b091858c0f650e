//! Terminal outcome of a single analysis task

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Why an analysis did not produce a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The requested id is not in the registry (never dispatched)
    DefinitionNotFound,
    /// The dataset lacks the periods or line items the analysis needs
    InsufficientData,
    ProviderUnavailable,
    ProviderTimeout,
    ProviderInvalidResponse,
    /// Local math failed (zero denominator, degenerate series, ...)
    ComputationError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::DefinitionNotFound => "definition not found",
            FailureKind::InsufficientData => "insufficient data",
            FailureKind::ProviderUnavailable => "provider unavailable",
            FailureKind::ProviderTimeout => "provider timeout",
            FailureKind::ProviderInvalidResponse => "provider invalid response",
            FailureKind::ComputationError => "computation error",
        };
        f.write_str(name)
    }
}

/// What a computation strategy hands back. Strategies never return `Err`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StrategyOutcome {
    Success {
        payload: Value,
        provider: String,
        duration_ms: u64,
        /// 1.0 for a full success, lower for a partial one
        confidence_scale: f64,
    },
    Failure {
        kind: FailureKind,
        message: String,
    },
}

impl StrategyOutcome {
    pub fn success(payload: Value, provider: impl Into<String>, duration_ms: u64) -> Self {
        StrategyOutcome::Success {
            payload,
            provider: provider.into(),
            duration_ms,
            confidence_scale: 1.0,
        }
    }

    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        StrategyOutcome::Failure {
            kind,
            message: message.into(),
        }
    }

    /// Scale the confidence of a success; no-op on failures
    pub fn with_confidence_scale(mut self, scale: f64) -> Self {
        if let StrategyOutcome::Success {
            confidence_scale, ..
        } = &mut self
        {
            *confidence_scale = scale.clamp(0.0, 1.0);
        }
        self
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StrategyOutcome::Success { .. })
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            StrategyOutcome::Failure { kind, .. } => Some(*kind),
            StrategyOutcome::Success { .. } => None,
        }
    }
}
