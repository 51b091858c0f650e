//! Computation strategies
//!
//! A strategy turns one analysis definition plus the dataset into a
//! [`StrategyOutcome`]. Strategies never return an error and are expected
//! not to panic; the orchestrator still contains a panic if one happens.

pub mod hybrid;
pub mod ratio;
pub mod remote;
pub mod statistical;

pub use hybrid::HybridStrategy;
pub use ratio::RatioStrategy;
pub use remote::{RemoteInferenceStrategy, failure_kind_for};
pub use statistical::StatisticalStrategy;

use async_trait::async_trait;
use finsight_core::{
    AnalysisDefinition, CompanyProfile, FailureKind, FinancialDataset, Language, Statement,
    StrategyOutcome, StrategyTag,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Per-run settings visible to every strategy
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    /// Language for human-readable payload text
    pub language: Language,
    pub profile: Option<CompanyProfile>,
}

impl ExecutionContext {
    pub fn new(language: Language) -> Self {
        Self {
            language,
            profile: None,
        }
    }

    pub fn with_profile(mut self, profile: CompanyProfile) -> Self {
        self.profile = Some(profile);
        self
    }
}

/// Uniform contract of every computation strategy
#[async_trait]
pub trait ComputationStrategy: Send + Sync {
    /// Tag this strategy serves
    fn tag(&self) -> StrategyTag;

    /// Run one analysis. Failures are returned as [`StrategyOutcome::Failure`].
    async fn execute(
        &self,
        dataset: &FinancialDataset,
        definition: &AnalysisDefinition,
        ctx: &ExecutionContext,
    ) -> StrategyOutcome;
}

/// Binding of strategy tags to strategy instances
#[derive(Clone, Default)]
pub struct StrategySet {
    strategies: HashMap<StrategyTag, Arc<dyn ComputationStrategy>>,
}

impl StrategySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The two local strategies, which need no external collaborator
    pub fn local() -> Self {
        Self::new()
            .with_strategy(Arc::new(RatioStrategy::new()))
            .with_strategy(Arc::new(StatisticalStrategy::new()))
    }

    /// Bind a strategy under its own tag, replacing any previous binding
    pub fn with_strategy(mut self, strategy: Arc<dyn ComputationStrategy>) -> Self {
        self.register(strategy);
        self
    }

    pub fn register(&mut self, strategy: Arc<dyn ComputationStrategy>) {
        self.strategies.insert(strategy.tag(), strategy);
    }

    pub fn get(&self, tag: StrategyTag) -> Option<Arc<dyn ComputationStrategy>> {
        self.strategies.get(&tag).cloned()
    }

    pub fn contains(&self, tag: StrategyTag) -> bool {
        self.strategies.contains_key(&tag)
    }

    /// Bound tags in a stable order
    pub fn tags(&self) -> Vec<StrategyTag> {
        let mut tags: Vec<_> = self.strategies.keys().copied().collect();
        tags.sort();
        tags
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl fmt::Debug for StrategySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StrategySet")
            .field("tags", &self.tags())
            .finish()
    }
}

/// Failure of a local calculation
#[derive(Debug, Error)]
pub(crate) enum CalcError {
    #[error("'{item}' is missing from the {statement} for period {period}")]
    Missing {
        statement: Statement,
        item: &'static str,
        period: String,
    },

    #[error("{0}")]
    Insufficient(String),

    #[error("cannot compute {0}: denominator is zero")]
    ZeroDenominator(&'static str),

    #[error("{0}")]
    Degenerate(String),

    #[error("no local procedure for analysis '{0}'")]
    Unsupported(String),
}

impl CalcError {
    pub(crate) fn into_outcome(self) -> StrategyOutcome {
        let kind = match self {
            CalcError::Missing { .. } | CalcError::Insufficient(_) => FailureKind::InsufficientData,
            CalcError::ZeroDenominator(_)
            | CalcError::Degenerate(_)
            | CalcError::Unsupported(_) => FailureKind::ComputationError,
        };
        StrategyOutcome::failure(kind, self.to_string())
    }
}

/// `numerator / denominator`, rejecting a zero denominator
pub(crate) fn divide(
    name: &'static str,
    numerator: f64,
    denominator: f64,
) -> Result<f64, CalcError> {
    if denominator == 0.0 {
        return Err(CalcError::ZeroDenominator(name));
    }
    Ok(numerator / denominator)
}

/// Round for presentation in payloads
pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
pub(crate) mod fixtures {
    use finsight_core::{FinancialDataset, PeriodValues, items};

    /// Three healthy years of a mid-sized company
    pub(crate) fn three_year_dataset() -> FinancialDataset {
        let years = [
            ("2021", 1000.0, 80.0, 2000.0, 1000.0),
            ("2022", 1100.0, 99.0, 2100.0, 1050.0),
            ("2023", 1210.0, 121.0, 2200.0, 1100.0),
        ];

        let mut dataset = FinancialDataset::new();
        for (period, revenue, net_income, total_assets, equity) in years {
            dataset = dataset
                .with_income(
                    PeriodValues::new(period)
                        .with(items::REVENUE, revenue)
                        .with(items::COST_OF_GOODS_SOLD, revenue * 0.6)
                        .with(items::OPERATING_INCOME, revenue * 0.15)
                        .with(items::INTEREST_EXPENSE, 20.0)
                        .with(items::NET_INCOME, net_income),
                )
                .with_balance(
                    PeriodValues::new(period)
                        .with(items::CURRENT_ASSETS, 600.0)
                        .with(items::CASH, 150.0)
                        .with(items::INVENTORY, 200.0)
                        .with(items::RECEIVABLES, 100.0)
                        .with(items::TOTAL_ASSETS, total_assets)
                        .with(items::CURRENT_LIABILITIES, 300.0)
                        .with(items::TOTAL_LIABILITIES, total_assets - equity)
                        .with(items::SHAREHOLDERS_EQUITY, equity)
                        .with(items::SHARES_OUTSTANDING, 100.0)
                        .with(items::SHARE_PRICE, 15.0),
                )
                .with_cash_flow(
                    PeriodValues::new(period)
                        .with(items::OPERATING_CASH_FLOW, 150.0)
                        .with(items::CAPITAL_EXPENDITURE, -60.0)
                        .with(items::DIVIDENDS_PAID, -30.0),
                );
        }
        dataset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_local_set_binds_local_tags() {
        let set = StrategySet::local();
        assert_eq!(
            set.tags(),
            vec![StrategyTag::LocalRatio, StrategyTag::LocalStatistical]
        );
        assert!(!set.contains(StrategyTag::RemoteInferencePrimary));
        assert!(set.get(StrategyTag::LocalRatio).is_some());
    }

    #[test]
    fn test_calc_error_mapping() {
        let missing = CalcError::Missing {
            statement: Statement::Balance,
            item: "total_assets",
            period: "2023".to_string(),
        };
        assert_eq!(
            missing.into_outcome().failure_kind(),
            Some(FailureKind::InsufficientData)
        );
        assert_eq!(
            CalcError::ZeroDenominator("current_ratio")
                .into_outcome()
                .failure_kind(),
            Some(FailureKind::ComputationError)
        );
    }

    #[test]
    fn test_divide() {
        assert_eq!(divide("x", 6.0, 3.0).unwrap(), 2.0);
        assert!(matches!(
            divide("x", 1.0, 0.0),
            Err(CalcError::ZeroDenominator("x"))
        ));
    }
}
