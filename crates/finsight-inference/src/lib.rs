//! Remote inference provider abstraction for finsight
//!
//! Analyses that are not computed locally are delegated to an external
//! inference backend. This crate provides:
//!
//! - Request/response types exchanged with a backend
//! - The [`InferenceProvider`] trait every backend implements
//! - A retry decorator implementing the provider-side retry policy
//! - Concrete HTTP providers (behind feature flags)

pub mod error;
pub mod provider;
pub mod request;
pub mod retry;

pub use error::{InferenceError, Result};
pub use provider::InferenceProvider;
pub use request::{InferenceRequest, InferenceRequestBuilder, InferenceResponse};
pub use retry::{RetryPolicy, RetryingProvider};

// Provider implementations (feature-gated)
#[cfg(any(feature = "openai", feature = "gemini"))]
pub mod providers;
