//! Shared utilities for finsight
//!
//! This crate provides functionality used across the finsight workspace:
//! tracing subscriber setup and typed environment-variable overrides.

pub mod env;
pub mod logging;

pub use env::{EnvError, env_duration_ms, env_parse};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
