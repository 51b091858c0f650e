//! Company profile used for analysis recommendations

use crate::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sector {
    Financial,
    Technology,
    Industrial,
    Retail,
    Energy,
    Healthcare,
    RealEstate,
    Other,
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Sector::Financial => "financial",
            Sector::Technology => "technology",
            Sector::Industrial => "industrial",
            Sector::Retail => "retail",
            Sector::Energy => "energy",
            Sector::Healthcare => "healthcare",
            Sector::RealEstate => "real_estate",
            Sector::Other => "other",
        };
        f.write_str(name)
    }
}

impl FromStr for Sector {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "financial" | "finance" | "banking" => Ok(Sector::Financial),
            "technology" | "tech" => Ok(Sector::Technology),
            "industrial" => Ok(Sector::Industrial),
            "retail" => Ok(Sector::Retail),
            "energy" => Ok(Sector::Energy),
            "healthcare" => Ok(Sector::Healthcare),
            "real_estate" => Ok(Sector::RealEstate),
            "other" => Ok(Sector::Other),
            other => Err(EngineError::InvalidConfig(format!("unknown sector '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    #[default]
    Medium,
    Large,
}

impl FromStr for SizeClass {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "small" => Ok(SizeClass::Small),
            "medium" => Ok(SizeClass::Medium),
            "large" => Ok(SizeClass::Large),
            other => Err(EngineError::InvalidConfig(format!("unknown size class '{other}'"))),
        }
    }
}

/// Advisory description of the analysed company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub sector: Sector,
    #[serde(default)]
    pub size: SizeClass,
    /// Analyses already on file for this company
    #[serde(default)]
    pub prior_analyses: Vec<String>,
}

impl CompanyProfile {
    pub fn new(sector: Sector) -> Self {
        Self {
            name: None,
            sector,
            size: SizeClass::default(),
            prior_analyses: Vec::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_size(mut self, size: SizeClass) -> Self {
        self.size = size;
        self
    }

    pub fn with_prior_analysis(mut self, id: impl Into<String>) -> Self {
        self.prior_analyses.push(id.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sector_parsing() {
        assert_eq!("Financial".parse::<Sector>().unwrap(), Sector::Financial);
        assert_eq!("real-estate".parse::<Sector>().unwrap(), Sector::RealEstate);
        assert!("aerospace".parse::<Sector>().is_err());
    }

    #[test]
    fn test_profile_deserialize_defaults() {
        let profile: CompanyProfile = serde_json::from_str(r#"{"sector": "technology"}"#).unwrap();
        assert_eq!(profile.sector, Sector::Technology);
        assert_eq!(profile.size, SizeClass::Medium);
        assert!(profile.prior_analyses.is_empty());
    }
}
