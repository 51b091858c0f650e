//! Engine facade
//!
//! Bundles the registry, the selector and the orchestrator behind one
//! handle and wires remote providers into strategies.
//!
//! # Example
//!
//! ```no_run
//! use finsight_core::{CompanyProfile, FinancialDataset, Sector};
//! use finsight_engine::{Engine, RunOptions};
//!
//! # async fn example(dataset: FinancialDataset) -> finsight_core::Result<()> {
//! let engine = Engine::builder().build()?;
//! let profile = CompanyProfile::new(Sector::Financial);
//!
//! let batch = engine
//!     .run_for_profile(&dataset, &profile, &RunOptions::default())
//!     .await?;
//! println!("{} of {} analyses succeeded", batch.succeeded().count(), batch.len());
//! # Ok(())
//! # }
//! ```

use crate::config::EngineConfig;
use crate::options::RunOptions;
use crate::orchestrator::Orchestrator;
use crate::registry::AnalysisRegistry;
use crate::selector::RecommendationSelector;
use crate::strategy::{
    ComputationStrategy, HybridStrategy, RemoteInferenceStrategy, StrategySet,
};
use finsight_core::{Batch, CompanyProfile, FinancialDataset, Result};
use finsight_inference::InferenceProvider;
use std::sync::Arc;
use tracing::debug;

/// Entry point of the analysis engine
#[derive(Debug, Clone)]
pub struct Engine {
    selector: RecommendationSelector,
    orchestrator: Orchestrator,
}

impl Engine {
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Run the given analysis ids
    pub async fn run(
        &self,
        dataset: &FinancialDataset,
        ids: &[String],
        options: &RunOptions,
    ) -> Result<Batch> {
        self.orchestrator.run(dataset, ids, options).await
    }

    /// Select analyses for the company, then run them
    ///
    /// The profile is also handed to strategies unless the options carry one.
    pub async fn run_for_profile(
        &self,
        dataset: &FinancialDataset,
        profile: &CompanyProfile,
        options: &RunOptions,
    ) -> Result<Batch> {
        let ids = self.selector.select_for(profile);
        if options.profile.is_some() {
            return self.run(dataset, &ids, options).await;
        }

        let options = options.clone().with_profile(profile.clone());
        self.run(dataset, &ids, &options).await
    }

    /// Run every analysis in the registry
    pub async fn run_all(&self, dataset: &FinancialDataset, options: &RunOptions) -> Result<Batch> {
        let ids = self.registry().ids();
        self.run(dataset, &ids, options).await
    }

    pub fn registry(&self) -> &Arc<AnalysisRegistry> {
        self.orchestrator.registry()
    }

    pub fn selector(&self) -> &RecommendationSelector {
        &self.selector
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn config(&self) -> &EngineConfig {
        self.orchestrator.config()
    }
}

/// Builder for [`Engine`]
///
/// Local strategies are always bound. A primary or secondary provider binds
/// the matching remote strategy; having both also binds the hybrid one.
/// Strategies added with [`strategy`](Self::strategy) take precedence.
#[derive(Default)]
pub struct EngineBuilder {
    registry: Option<Arc<AnalysisRegistry>>,
    config: Option<EngineConfig>,
    primary: Option<Arc<dyn InferenceProvider>>,
    secondary: Option<Arc<dyn InferenceProvider>>,
    strategies: Vec<Arc<dyn ComputationStrategy>>,
}

impl EngineBuilder {
    /// Use a custom registry instead of the built-in catalog
    pub fn registry(mut self, registry: Arc<AnalysisRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn primary_provider(mut self, provider: Arc<dyn InferenceProvider>) -> Self {
        self.primary = Some(provider);
        self
    }

    pub fn secondary_provider(mut self, provider: Arc<dyn InferenceProvider>) -> Self {
        self.secondary = Some(provider);
        self
    }

    /// Bind a strategy under its tag, overriding the default binding
    pub fn strategy(mut self, strategy: Arc<dyn ComputationStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn build(self) -> Result<Engine> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let registry = match self.registry {
            Some(registry) => registry,
            None => Arc::new(AnalysisRegistry::builtin()?),
        };

        let provider_timeout = config.provider_timeout();
        let mut strategies = StrategySet::local();
        if let Some(primary) = &self.primary {
            strategies.register(Arc::new(
                RemoteInferenceStrategy::primary(primary.clone()).with_timeout(provider_timeout),
            ));
        }
        if let Some(secondary) = &self.secondary {
            strategies.register(Arc::new(
                RemoteInferenceStrategy::secondary(secondary.clone())
                    .with_timeout(provider_timeout),
            ));
        }
        if let (Some(primary), Some(secondary)) = (self.primary, self.secondary) {
            strategies.register(Arc::new(
                HybridStrategy::new(primary, secondary).with_timeout(provider_timeout),
            ));
        }
        for strategy in self.strategies {
            strategies.register(strategy);
        }

        debug!(
            "Engine built with {} definitions and strategies {:?}",
            registry.len(),
            strategies.tags()
        );

        Ok(Engine {
            selector: RecommendationSelector::new(registry.clone()),
            orchestrator: Orchestrator::new(registry, strategies, config),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::fixtures::three_year_dataset;
    use crate::strategy::remote::fakes::FakeProvider;
    use finsight_core::{FailureKind, Language, Sector, StrategyTag};

    #[test]
    fn test_default_engine_binds_local_strategies_only() {
        let engine = Engine::builder().build().unwrap();
        assert_eq!(engine.registry().len(), 30);
        assert_eq!(
            engine.orchestrator().strategies().tags(),
            vec![StrategyTag::LocalRatio, StrategyTag::LocalStatistical]
        );
    }

    #[test]
    fn test_both_providers_bind_hybrid() {
        let engine = Engine::builder()
            .primary_provider(Arc::new(FakeProvider::healthy("p")))
            .secondary_provider(Arc::new(FakeProvider::healthy("s")))
            .build()
            .unwrap();
        assert_eq!(engine.orchestrator().strategies().len(), 5);

        let engine = Engine::builder()
            .secondary_provider(Arc::new(FakeProvider::healthy("s")))
            .build()
            .unwrap();
        assert!(
            !engine
                .orchestrator()
                .strategies()
                .contains(StrategyTag::RemoteInferenceHybrid)
        );
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig {
            max_in_flight: 0,
            ..EngineConfig::default()
        };
        assert!(Engine::builder().config(config).build().is_err());
    }

    #[tokio::test]
    async fn test_run_for_profile() {
        let engine = Engine::builder()
            .primary_provider(Arc::new(FakeProvider::healthy("p")))
            .build()
            .unwrap();
        let profile = CompanyProfile::new(Sector::Technology);

        let batch = engine
            .run_for_profile(&three_year_dataset(), &profile, &RunOptions::default())
            .await
            .unwrap();

        assert_eq!(batch.len(), 9);
        assert!(batch.get("productivity_analysis").unwrap().is_success());
        // scenario and simulation analyses need the secondary provider
        assert_eq!(
            batch.get("monte_carlo_simulation").unwrap().failure_kind(),
            Some(FailureKind::ProviderUnavailable)
        );
    }

    #[tokio::test]
    async fn test_run_all_in_arabic_without_providers() {
        let engine = Engine::builder().build().unwrap();
        let batch = engine
            .run_all(
                &three_year_dataset(),
                &RunOptions::new().with_language(Language::Ar),
            )
            .await
            .unwrap();

        assert_eq!(batch.len(), 30);
        // five basic ratios, DuPont and the two statistical analyses run locally
        assert_eq!(batch.succeeded().count(), 8);
        let liquidity = batch.get("liquidity_ratios").unwrap();
        assert!(
            liquidity.payload.as_ref().unwrap()["interpretation"]
                .as_str()
                .unwrap()
                .chars()
                .any(|c| ('\u{0600}'..='\u{06FF}').contains(&c))
        );
    }
}
