//! Analysis results and the batch returned to callers

use crate::definition::StrategyTag;
use crate::outcome::FailureKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Failure details kept for observability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureInfo {
    pub kind: FailureKind,
    pub message: String,
}

/// Which strategy and provider produced a result
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// None when the id never resolved to a definition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyTag>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureInfo>,
}

/// Output of one definition's execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub definition_id: String,
    /// Present iff the analysis succeeded
    pub payload: Option<Value>,
    pub confidence: f64,
    pub timestamp_utc: DateTime<Utc>,
    pub processing_duration_ms: u64,
    pub provenance: Provenance,
}

impl AnalysisResult {
    pub fn is_success(&self) -> bool {
        self.payload.is_some()
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        self.provenance.failure.as_ref().map(|f| f.kind)
    }
}

/// All results of one orchestration call, one per requested id in request order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    results: Vec<AnalysisResult>,
}

impl Batch {
    pub fn new(results: Vec<AnalysisResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[AnalysisResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<AnalysisResult> {
        self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.results.iter()
    }

    pub fn get(&self, definition_id: &str) -> Option<&AnalysisResult> {
        self.results
            .iter()
            .find(|r| r.definition_id == definition_id)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.results
            .iter()
            .map(|r| r.definition_id.as_str())
            .collect()
    }

    pub fn succeeded(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.results.iter().filter(|r| r.is_success())
    }

    pub fn failed(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.results.iter().filter(|r| !r.is_success())
    }

    /// Share of successful results in [0, 1]; 0 for an empty batch
    pub fn success_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.succeeded().count() as f64 / self.results.len() as f64
    }

    /// Results an exporter may render at the given confidence threshold.
    ///
    /// Every returned result carries a payload.
    pub fn above_threshold(&self, threshold: f64) -> impl Iterator<Item = &AnalysisResult> {
        self.results
            .iter()
            .filter(move |r| r.confidence >= threshold && r.payload.is_some())
    }
}

impl IntoIterator for Batch {
    type Item = AnalysisResult;
    type IntoIter = std::vec::IntoIter<AnalysisResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a AnalysisResult;
    type IntoIter = std::slice::Iter<'a, AnalysisResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(id: &str, ok: bool) -> AnalysisResult {
        AnalysisResult {
            definition_id: id.to_string(),
            payload: ok.then(|| json!({"value": 1})),
            confidence: if ok { 0.9 } else { 0.1 },
            timestamp_utc: Utc::now(),
            processing_duration_ms: 5,
            provenance: Provenance {
                strategy: Some(StrategyTag::LocalRatio),
                provider: ok.then(|| "local-ratio".to_string()),
                failure: (!ok).then(|| FailureInfo {
                    kind: FailureKind::ComputationError,
                    message: "denominator is zero".to_string(),
                }),
            },
        }
    }

    #[test]
    fn test_batch_helpers() {
        let batch = Batch::new(vec![
            result("liquidity_ratios", true),
            result("market_ratios", false),
            result("leverage_ratios", true),
        ]);

        assert_eq!(batch.len(), 3);
        assert_eq!(
            batch.ids(),
            vec!["liquidity_ratios", "market_ratios", "leverage_ratios"]
        );
        assert_eq!(batch.succeeded().count(), 2);
        assert_eq!(batch.failed().count(), 1);
        assert!((batch.success_rate() - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(
            batch.get("market_ratios").and_then(|r| r.failure_kind()),
            Some(FailureKind::ComputationError)
        );
        assert!(batch.get("missing").is_none());
    }

    #[test]
    fn test_above_threshold_only_returns_payloads() {
        let batch = Batch::new(vec![result("a", true), result("b", false)]);
        let visible: Vec<_> = batch.above_threshold(0.5).collect();
        assert_eq!(visible.len(), 1);
        assert!(visible.iter().all(|r| r.payload.is_some()));

        // A threshold below the failure confidence still hides failures
        assert_eq!(batch.above_threshold(0.0).count(), 1);
    }

    #[test]
    fn test_empty_batch_success_rate() {
        assert_eq!(Batch::default().success_rate(), 0.0);
    }

    #[test]
    fn test_result_serializes_camel_case() {
        let value = serde_json::to_value(result("a", false)).unwrap();
        assert!(value.get("definitionId").is_some());
        assert!(value["payload"].is_null());
        assert_eq!(value["provenance"]["failure"]["kind"], "computation_error");
    }
}
