//! Engine configuration
//!
//! Loaded from a JSON file, adjusted through environment variables, or built
//! in code. Per-call overrides live in [`RunOptions`](crate::RunOptions).

use crate::aggregator::ConfidencePolicy;
use finsight_core::{EngineError, Language, Result};
use finsight_utils::{EnvError, env_duration_ms, env_parse};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const ENV_MAX_IN_FLIGHT: &str = "FINSIGHT_MAX_IN_FLIGHT";
pub const ENV_TASK_TIMEOUT_MS: &str = "FINSIGHT_TASK_TIMEOUT_MS";
pub const ENV_PROVIDER_TIMEOUT_MS: &str = "FINSIGHT_PROVIDER_TIMEOUT_MS";
pub const ENV_DEADLINE_MS: &str = "FINSIGHT_DEADLINE_MS";

/// Configuration of an [`Engine`](crate::Engine)
///
/// # Example
///
/// ```json
/// {
///   "max_in_flight": 4,
///   "task_timeout_ms": 30000,
///   "default_deadline_ms": 120000,
///   "confidence": { "success": 0.85, "failure": 0.1 },
///   "default_language": "ar"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of analyses executing at once
    pub max_in_flight: usize,

    /// Bound on a single analysis
    pub task_timeout_ms: u64,

    /// Bound on a single provider call made by a remote strategy
    pub provider_timeout_ms: u64,

    /// Bound on a whole run; `None` waits for every analysis
    pub default_deadline_ms: Option<u64>,

    pub confidence: ConfidencePolicy,

    pub default_language: Language,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_in_flight: 8,
            task_timeout_ms: 60_000,
            provider_timeout_ms: 45_000,
            default_deadline_ms: Some(300_000),
            confidence: ConfidencePolicy::default(),
            default_language: Language::En,
        }
    }
}

fn env_error(e: EnvError) -> EngineError {
    EngineError::InvalidConfig(e.to_string())
}

impl EngineConfig {
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }

    /// Load and validate a configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `FINSIGHT_*` environment overrides on top of this configuration
    ///
    /// `FINSIGHT_DEADLINE_MS=0` disables the run deadline.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Some(max_in_flight) = env_parse::<usize>(ENV_MAX_IN_FLIGHT).map_err(env_error)? {
            self.max_in_flight = max_in_flight;
        }
        if let Some(timeout) = env_parse::<u64>(ENV_TASK_TIMEOUT_MS).map_err(env_error)? {
            self.task_timeout_ms = timeout;
        }
        if let Some(timeout) = env_parse::<u64>(ENV_PROVIDER_TIMEOUT_MS).map_err(env_error)? {
            self.provider_timeout_ms = timeout;
        }
        if let Some(deadline) = env_duration_ms(ENV_DEADLINE_MS).map_err(env_error)? {
            self.default_deadline_ms =
                (!deadline.is_zero()).then(|| deadline.as_millis() as u64);
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_in_flight == 0 {
            return Err(EngineError::InvalidConfig(
                "max_in_flight must be at least 1".to_string(),
            ));
        }
        if self.task_timeout_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "task_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.provider_timeout_ms == 0 {
            return Err(EngineError::InvalidConfig(
                "provider_timeout_ms must be greater than 0".to_string(),
            ));
        }
        if self.default_deadline_ms == Some(0) {
            return Err(EngineError::InvalidConfig(
                "default_deadline_ms must be greater than 0; omit it to disable the deadline"
                    .to_string(),
            ));
        }
        self.confidence.validate()
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    pub fn default_deadline(&self) -> Option<Duration> {
        self.default_deadline_ms.map(Duration::from_millis)
    }
}

/// Builder for EngineConfig
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    max_in_flight: Option<usize>,
    task_timeout: Option<Duration>,
    provider_timeout: Option<Duration>,
    default_deadline: Option<Option<Duration>>,
    confidence: Option<ConfidencePolicy>,
    default_language: Option<Language>,
}

impl EngineConfigBuilder {
    pub fn max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = Some(max_in_flight);
        self
    }

    pub fn task_timeout(mut self, timeout: Duration) -> Self {
        self.task_timeout = Some(timeout);
        self
    }

    pub fn provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = Some(timeout);
        self
    }

    /// Set the run deadline
    pub fn default_deadline(mut self, deadline: Duration) -> Self {
        self.default_deadline = Some(Some(deadline));
        self
    }

    /// Let runs wait for every analysis
    pub fn no_deadline(mut self) -> Self {
        self.default_deadline = Some(None);
        self
    }

    pub fn confidence(mut self, confidence: ConfidencePolicy) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn default_language(mut self, language: Language) -> Self {
        self.default_language = Some(language);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<EngineConfig> {
        let defaults = EngineConfig::default();
        let millis = |d: Duration| d.as_millis() as u64;

        let config = EngineConfig {
            max_in_flight: self.max_in_flight.unwrap_or(defaults.max_in_flight),
            task_timeout_ms: self
                .task_timeout
                .map_or(defaults.task_timeout_ms, millis),
            provider_timeout_ms: self
                .provider_timeout
                .map_or(defaults.provider_timeout_ms, millis),
            default_deadline_ms: self
                .default_deadline
                .map_or(defaults.default_deadline_ms, |d| d.map(millis)),
            confidence: self.confidence.unwrap_or(defaults.confidence),
            default_language: self.default_language.unwrap_or(defaults.default_language),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.max_in_flight, 8);
        assert_eq!(config.task_timeout(), Duration::from_secs(60));
        assert_eq!(config.default_deadline(), Some(Duration::from_secs(300)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = EngineConfig::builder()
            .max_in_flight(2)
            .task_timeout(Duration::from_secs(5))
            .no_deadline()
            .default_language(Language::Ar)
            .build()
            .unwrap();

        assert_eq!(config.max_in_flight, 2);
        assert_eq!(config.task_timeout_ms, 5_000);
        assert_eq!(config.default_deadline(), None);
        assert_eq!(config.default_language, Language::Ar);
        assert_eq!(config.provider_timeout_ms, 45_000);
    }

    #[test]
    fn test_builder_rejects_zero_in_flight() {
        assert!(matches!(
            EngineConfig::builder().max_in_flight(0).build(),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_from_json_partial() {
        let config = EngineConfig::from_json(
            r#"{"max_in_flight": 3, "default_deadline_ms": null, "default_language": "ar"}"#,
        )
        .unwrap();

        assert_eq!(config.max_in_flight, 3);
        assert_eq!(config.default_deadline(), None);
        assert_eq!(config.default_language, Language::Ar);
        assert_eq!(config.task_timeout_ms, 60_000);
    }

    #[test]
    fn test_from_json_rejects_bad_confidence() {
        let result = EngineConfig::from_json(r#"{"confidence": {"success": 0.1, "failure": 0.9}}"#);
        assert!(matches!(result, Err(EngineError::InvalidConfig(_))));

        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(EngineError::Json(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        unsafe {
            std::env::set_var(ENV_MAX_IN_FLIGHT, "3");
            std::env::set_var(ENV_DEADLINE_MS, "0");
        }
        let config = EngineConfig::default().with_env_overrides().unwrap();
        unsafe {
            std::env::remove_var(ENV_MAX_IN_FLIGHT);
            std::env::remove_var(ENV_DEADLINE_MS);
        }

        assert_eq!(config.max_in_flight, 3);
        assert_eq!(config.default_deadline(), None);
    }

    #[test]
    fn test_from_file_missing() {
        assert!(matches!(
            EngineConfig::from_file("/nonexistent/finsight-engine.json"),
            Err(EngineError::Io(_))
        ));
    }
}
