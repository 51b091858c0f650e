//! Analysis catalog entries

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Language used for human-readable payload text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ar => "ar",
        }
    }
}

impl FromStr for Language {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "en" | "english" => Ok(Language::En),
            "ar" | "arabic" => Ok(Language::Ar),
            other => Err(EngineError::InvalidConfig(format!(
                "unsupported language '{other}'"
            ))),
        }
    }
}

/// Bilingual display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedName {
    pub en: String,
    pub ar: String,
}

impl LocalizedName {
    pub fn new(en: impl Into<String>, ar: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            ar: ar.into(),
        }
    }

    pub fn get(&self, language: Language) -> &str {
        match language {
            Language::En => &self.en,
            Language::Ar => &self.ar,
        }
    }
}

/// Grouping tag of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    BasicRatios,
    AppliedPerformance,
    AdvancedModeling,
    StatisticalQuantitative,
    PortfolioRisk,
    IntelligentDetection,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::BasicRatios,
        Category::AppliedPerformance,
        Category::AdvancedModeling,
        Category::StatisticalQuantitative,
        Category::PortfolioRisk,
        Category::IntelligentDetection,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::BasicRatios => "basic_ratios",
            Category::AppliedPerformance => "applied_performance",
            Category::AdvancedModeling => "advanced_modeling",
            Category::StatisticalQuantitative => "statistical_quantitative",
            Category::PortfolioRisk => "portfolio_risk",
            Category::IntelligentDetection => "intelligent_detection",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| EngineError::InvalidConfig(format!("unknown category '{s}'")))
    }
}

/// Depth tier of an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Basic,
    Applied,
    Advanced,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Basic => write!(f, "basic"),
            Level::Applied => write!(f, "applied"),
            Level::Advanced => write!(f, "advanced"),
        }
    }
}

impl FromStr for Level {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "basic" => Ok(Level::Basic),
            "applied" => Ok(Level::Applied),
            "advanced" => Ok(Level::Advanced),
            other => Err(EngineError::InvalidConfig(format!("unknown level '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Complexity {
    Simple,
    Moderate,
    Complex,
}

/// Selects the computation strategy that runs an analysis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyTag {
    LocalRatio,
    LocalStatistical,
    RemoteInferencePrimary,
    RemoteInferenceSecondary,
    RemoteInferenceHybrid,
}

impl StrategyTag {
    /// Whether the strategy waits on an external provider
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            StrategyTag::RemoteInferencePrimary
                | StrategyTag::RemoteInferenceSecondary
                | StrategyTag::RemoteInferenceHybrid
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyTag::LocalRatio => "local-ratio",
            StrategyTag::LocalStatistical => "local-statistical",
            StrategyTag::RemoteInferencePrimary => "remote-inference-primary",
            StrategyTag::RemoteInferenceSecondary => "remote-inference-secondary",
            StrategyTag::RemoteInferenceHybrid => "remote-inference-hybrid",
        }
    }
}

impl fmt::Display for StrategyTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One named financial-analysis procedure and how to run it.
///
/// Fields are private so a definition cannot change after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnalysisDefinition {
    id: String,
    name: LocalizedName,
    category: Category,
    level: Level,
    complexity: Complexity,
    required_years: u32,
    strategy: StrategyTag,
}

impl AnalysisDefinition {
    pub fn new(
        id: impl Into<String>,
        name: LocalizedName,
        category: Category,
        level: Level,
        complexity: Complexity,
        required_years: u32,
        strategy: StrategyTag,
    ) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(EngineError::InvalidDefinition {
                id,
                reason: "id must not be empty".to_string(),
            });
        }
        if required_years == 0 {
            return Err(EngineError::InvalidDefinition {
                id,
                reason: "required_years must be at least 1".to_string(),
            });
        }

        Ok(Self {
            id,
            name,
            category,
            level,
            complexity,
            required_years,
            strategy,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &LocalizedName {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn complexity(&self) -> Complexity {
        self.complexity
    }

    pub fn required_years(&self) -> u32 {
        self.required_years
    }

    pub fn strategy(&self) -> StrategyTag {
        self.strategy
    }
}
