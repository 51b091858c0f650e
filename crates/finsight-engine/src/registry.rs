//! Analysis registry
//!
//! An immutable catalog of analysis definitions, built once at startup and
//! shared read-only (typically behind an `Arc`) by the selector and the
//! orchestrator.

use crate::catalog;
use finsight_core::{AnalysisDefinition, Category, EngineError, Level, Result};
use std::collections::HashMap;

/// Registry of analysis definitions
#[derive(Debug, Clone)]
pub struct AnalysisRegistry {
    definitions: Vec<AnalysisDefinition>,
    index: HashMap<String, usize>,
}

impl AnalysisRegistry {
    /// Create a registry from definitions, keeping their order
    ///
    /// Fails if two definitions share an id.
    pub fn new(definitions: Vec<AnalysisDefinition>) -> Result<Self> {
        let mut index = HashMap::with_capacity(definitions.len());
        for (position, definition) in definitions.iter().enumerate() {
            if index.insert(definition.id().to_string(), position).is_some() {
                return Err(EngineError::DuplicateDefinition(definition.id().to_string()));
            }
        }

        Ok(Self { definitions, index })
    }

    /// Registry holding the built-in catalog
    pub fn builtin() -> Result<Self> {
        Self::new(catalog::builtin_definitions()?)
    }

    /// All definitions in registration order
    pub fn list_all(&self) -> &[AnalysisDefinition] {
        &self.definitions
    }

    pub fn find_by_id(&self, id: &str) -> Option<&AnalysisDefinition> {
        self.index.get(id).map(|&position| &self.definitions[position])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn list_by_category(&self, category: Category) -> Vec<&AnalysisDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.category() == category)
            .collect()
    }

    pub fn list_by_level(&self, level: Level) -> Vec<&AnalysisDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.level() == level)
            .collect()
    }

    /// Ids of all definitions in registration order
    pub fn ids(&self) -> Vec<String> {
        self.definitions.iter().map(|d| d.id().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
