//! Per-call run options

use finsight_core::{CompanyProfile, Language};
use std::time::Duration;

/// Overrides applied to a single run on top of the engine configuration
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Payload language; falls back to the configured default
    pub language: Option<Language>,

    /// Bound on the whole run; falls back to the configured default deadline
    pub deadline: Option<Duration>,

    /// Concurrency bound; falls back to the configured `max_in_flight`
    pub max_in_flight: Option<usize>,

    /// Company profile handed to strategies and used for selection
    pub profile: Option<CompanyProfile>,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_language(mut self, language: Language) -> Self {
        self.language = Some(language);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = Some(max_in_flight);
        self
    }

    pub fn with_profile(mut self, profile: CompanyProfile) -> Self {
        self.profile = Some(profile);
        self
    }
}
