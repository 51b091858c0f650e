//! Core data model for finsight
//!
//! This crate defines the types shared by every part of the analysis engine:
//! the multi-period financial dataset, the analysis catalog entries, the
//! per-task strategy outcome and the aggregated result batch.

pub mod dataset;
pub mod definition;
pub mod error;
pub mod items;
pub mod outcome;
pub mod profile;
pub mod result;

pub use dataset::{FinancialDataset, PeriodValues, Statement};
pub use definition::{
    AnalysisDefinition, Category, Complexity, Language, Level, LocalizedName, StrategyTag,
};
pub use error::{EngineError, Result};
pub use outcome::{FailureKind, StrategyOutcome};
pub use profile::{CompanyProfile, Sector, SizeClass};
pub use result::{AnalysisResult, Batch, FailureInfo, Provenance};
