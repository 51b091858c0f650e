//! Recommendation selector
//!
//! Chooses which analyses to run for a company: every basic ratio analysis,
//! followed by the extras its sector calls for.

use crate::AnalysisRegistry;
use finsight_core::{Category, CompanyProfile, Sector};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

const FINANCIAL_EXTRAS: &[&str] = &[
    "var_analysis",
    "stress_testing",
    "operational_risk_analysis",
    "ai_fraud_detection",
    "money_laundering_detection",
];

const TECHNOLOGY_EXTRAS: &[&str] = &[
    "productivity_analysis",
    "value_chain_analysis",
    "advanced_scenario_analysis",
    "monte_carlo_simulation",
];

/// Sector-specific analyses added on top of the baseline
pub fn sector_extras(sector: Sector) -> &'static [&'static str] {
    match sector {
        Sector::Financial => FINANCIAL_EXTRAS,
        Sector::Technology => TECHNOLOGY_EXTRAS,
        _ => &[],
    }
}

/// Picks analysis ids from a company profile
#[derive(Debug, Clone)]
pub struct RecommendationSelector {
    registry: Arc<AnalysisRegistry>,
}

impl RecommendationSelector {
    pub fn new(registry: Arc<AnalysisRegistry>) -> Self {
        Self { registry }
    }

    /// Recommended ids for the profile, baseline first, without duplicates
    ///
    /// Ids the registry does not know are skipped.
    pub fn select_for(&self, profile: &CompanyProfile) -> Vec<String> {
        let baseline = self
            .registry
            .list_by_category(Category::BasicRatios)
            .into_iter()
            .map(|d| d.id());
        let extras = sector_extras(profile.sector)
            .iter()
            .copied()
            .filter(|id| self.registry.contains(id));

        let mut seen = HashSet::new();
        let selected: Vec<String> = baseline
            .chain(extras)
            .filter(|id| seen.insert(*id))
            .map(str::to_string)
            .collect();

        debug!(
            "Selected {} analyses for sector {}",
            selected.len(),
            profile.sector
        );
        selected
    }

    /// Like [`select_for`](Self::select_for), minus analyses already on file
    pub fn select_pending(&self, profile: &CompanyProfile) -> Vec<String> {
        let done: HashSet<&str> = profile.prior_analyses.iter().map(String::as_str).collect();
        self.select_for(profile)
            .into_iter()
            .filter(|id| !done.contains(id.as_str()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use finsight_core::{AnalysisDefinition, Complexity, Level, LocalizedName, StrategyTag};

    fn selector() -> RecommendationSelector {
        RecommendationSelector::new(Arc::new(AnalysisRegistry::builtin().unwrap()))
    }

    const BASELINE: [&str; 5] = [
        "liquidity_ratios",
        "profitability_ratios",
        "leverage_ratios",
        "efficiency_ratios",
        "market_ratios",
    ];

    #[test]
    fn test_financial_sector() {
        let selected = selector().select_for(&CompanyProfile::new(Sector::Financial));

        assert_eq!(selected.len(), 10);
        assert_eq!(&selected[..5], BASELINE);
        assert_eq!(&selected[5..], FINANCIAL_EXTRAS);
    }

    #[test]
    fn test_technology_sector() {
        let selected = selector().select_for(&CompanyProfile::new(Sector::Technology));
        assert_eq!(selected.len(), 9);
        assert_eq!(selected[5], "productivity_analysis");
    }

    #[test]
    fn test_other_sector_gets_baseline_only() {
        let selected = selector().select_for(&CompanyProfile::new(Sector::Retail));
        assert_eq!(selected, BASELINE);
    }

    #[test]
    fn test_selection_is_deterministic() {
        let profile = CompanyProfile::new(Sector::Financial).with_name("Acme Bank");
        let selector = selector();
        assert_eq!(selector.select_for(&profile), selector.select_for(&profile));
    }

    #[test]
    fn test_pending_excludes_prior_analyses() {
        let profile = CompanyProfile::new(Sector::Financial)
            .with_prior_analysis("liquidity_ratios")
            .with_prior_analysis("var_analysis");
        let pending = selector().select_pending(&profile);

        assert_eq!(pending.len(), 8);
        assert!(!pending.contains(&"liquidity_ratios".to_string()));
        assert!(!pending.contains(&"var_analysis".to_string()));
    }

    #[test]
    fn test_unknown_extras_are_skipped() {
        let only_ratio = AnalysisDefinition::new(
            "liquidity_ratios",
            LocalizedName::new("Liquidity Ratios", "نسب السيولة"),
            Category::BasicRatios,
            Level::Basic,
            Complexity::Simple,
            1,
            StrategyTag::LocalRatio,
        )
        .unwrap();
        let registry = AnalysisRegistry::new(vec![only_ratio]).unwrap();
        let selector = RecommendationSelector::new(Arc::new(registry));

        assert_eq!(
            selector.select_for(&CompanyProfile::new(Sector::Financial)),
            vec!["liquidity_ratios"]
        );
    }
}
