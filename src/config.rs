//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// How long a request may wait for a pooled connection
    pub database_acquire_timeout_secs: u64,

    /// Per-statement timeout applied to every pooled connection
    pub statement_timeout_ms: u64,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = parse_or("DATABASE_MAX_CONNECTIONS", "10")?;
        let database_acquire_timeout_secs = parse_or("DATABASE_ACQUIRE_TIMEOUT_SECS", "5")?;
        let statement_timeout_ms = parse_or("STATEMENT_TIMEOUT_MS", "5000")?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("PORT", "3000")?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        Ok(Self {
            database_url,
            database_max_connections,
            database_acquire_timeout_secs,
            statement_timeout_ms,
            host,
            port,
            environment,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.database_acquire_timeout_secs)
    }

    /// `statement_timeout` value in the form Postgres expects
    pub fn statement_timeout_setting(&self) -> String {
        format!("{}ms", self.statement_timeout_ms)
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, default: &str) -> Result<T, ConfigError> {
    env::var(name)
        .unwrap_or_else(|_| default.to_string())
        .parse()
        .map_err(|_| ConfigError::InvalidValue(name))
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Config {
        Config {
            database_url: "postgres://localhost/game_store".to_string(),
            database_max_connections: 10,
            database_acquire_timeout_secs: 5,
            statement_timeout_ms: 2500,
            host: "127.0.0.1".to_string(),
            port: 3000,
            environment: "production".to_string(),
        }
    }

    #[test]
    fn test_timeouts() {
        let config = sample();
        assert_eq!(config.statement_timeout_setting(), "2500ms");
        assert_eq!(config.acquire_timeout(), Duration::from_secs(5));
        assert!(config.is_production());
    }

    #[test]
    fn test_parse_or_uses_default_when_unset() {
        let value: u32 = parse_or("GAME_STORE_TEST_UNSET_VARIABLE", "42").unwrap();
        assert_eq!(value, 42);

        let invalid: Result<u32, _> = parse_or("GAME_STORE_TEST_UNSET_VARIABLE", "forty-two");
        assert!(matches!(invalid, Err(ConfigError::InvalidValue(_))));
    }
}
