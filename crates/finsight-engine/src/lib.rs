//! Analysis orchestration engine for finsight
//!
//! This crate turns a multi-period financial dataset and a list of analysis
//! ids into a [`Batch`](finsight_core::Batch) holding exactly one result per
//! requested id. It provides:
//!
//! - the analysis registry and the built-in catalog
//! - local (ratio, statistical) and remote (inference-backed) computation strategies
//! - the sector-based recommendation selector
//! - the concurrent orchestrator and the result aggregator
//! - the [`Engine`] facade tying them together

pub mod aggregator;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod options;
pub mod orchestrator;
pub mod registry;
pub mod selector;
pub mod strategy;

// Re-export for convenience
pub use aggregator::{ConfidencePolicy, ResultAggregator};
pub use config::{EngineConfig, EngineConfigBuilder};
pub use engine::{Engine, EngineBuilder};
pub use options::RunOptions;
pub use orchestrator::Orchestrator;
pub use registry::AnalysisRegistry;
pub use selector::RecommendationSelector;
pub use strategy::{
    ComputationStrategy, ExecutionContext, HybridStrategy, RatioStrategy, RemoteInferenceStrategy,
    StatisticalStrategy, StrategySet,
};
