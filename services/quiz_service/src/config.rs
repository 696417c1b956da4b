//! services/quiz_service/src/config.rs
//!
//! Defines the service's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::str::FromStr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub log_level: Level,
    pub db_max_connections: u32,
    /// How often the scheduler reconciles quiz statuses with their open/close window.
    pub scheduler_interval_secs: u64,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let db_max_connections = parse_var("DB_MAX_CONNECTIONS", 5)?;
        let scheduler_interval_secs = parse_var("SCHEDULER_INTERVAL_SECS", 60)?;
        if scheduler_interval_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "SCHEDULER_INTERVAL_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        Ok(Self {
            database_url,
            log_level,
            db_max_connections,
            scheduler_interval_secs,
        })
    }
}

/// Reads `name` and parses it, falling back to `default` when unset.
fn parse_var<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_uses_default_when_unset() {
        let value: u32 = parse_var("QUIZ_TEST_UNSET_VARIABLE", 5).unwrap();
        assert_eq!(value, 5);
    }

    #[test]
    fn test_parse_var_reports_bad_numbers() {
        std::env::set_var("QUIZ_TEST_BAD_NUMBER", "lots");
        let err = parse_var::<u64>("QUIZ_TEST_BAD_NUMBER", 60).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(name, _) if name == "QUIZ_TEST_BAD_NUMBER"));

        std::env::set_var("QUIZ_TEST_GOOD_NUMBER", " 15 ");
        assert_eq!(parse_var::<u64>("QUIZ_TEST_GOOD_NUMBER", 60).unwrap(), 15);
    }
}
