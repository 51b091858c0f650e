//! Error types for finsight-core

use thiserror::Error;

/// Result type alias for finsight operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Hard errors surfaced to the caller of the engine.
///
/// Per-analysis failures are never reported through this type; they are
/// carried as data inside the batch. Only contract violations that prevent a
/// run from being interpreted at all end up here.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The dataset shape cannot be interpreted (no periods, misaligned statements, ...)
    #[error("Malformed dataset: {0}")]
    MalformedDataset(String),

    /// Two catalog entries share the same id
    #[error("Duplicate analysis definition: {0}")]
    DuplicateDefinition(String),

    /// A catalog entry violates its construction rules
    #[error("Invalid analysis definition '{id}': {reason}")]
    InvalidDefinition { id: String, reason: String },

    /// Engine or provider configuration is invalid
    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    /// I/O failure while loading configuration or datasets
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
