//! Typed environment-variable overrides

use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EnvError {
    #[error("Invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

/// Parse an environment variable if it is set.
///
/// Returns `Ok(None)` when the variable is absent or blank.
pub fn env_parse<T>(key: &str) -> Result<Option<T>, EnvError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Ok(raw) = std::env::var(key) else {
        return Ok(None);
    };
    let value = raw.trim();
    if value.is_empty() {
        return Ok(None);
    }

    value.parse().map(Some).map_err(|e: T::Err| EnvError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

/// Parse an environment variable holding milliseconds
pub fn env_duration_ms(key: &str) -> Result<Option<Duration>, EnvError> {
    Ok(env_parse::<u64>(key)?.map(Duration::from_millis))
}
