//! Environment-driven configuration.

use std::env;

/// Default connection pool size when `DATABASE_POOL_SIZE` is unset.
const DEFAULT_POOL_SIZE: usize = 16;

/// Postgres connection settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    url: String,
    /// Maximum number of pooled connections.
    pub pool_size: usize,
}

impl DatabaseConfig {
    /// Build a config from an explicit connection URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }

    /// Read `DATABASE_URL` and optional `DATABASE_POOL_SIZE` from the
    /// environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = env::var("DATABASE_URL").map_err(|_| ConfigError::MissingVar("DATABASE_URL"))?;

        let pool_size = match env::var("DATABASE_POOL_SIZE") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidVar("DATABASE_POOL_SIZE"))?,
            Err(_) => DEFAULT_POOL_SIZE,
        };

        Ok(Self { url, pool_size })
    }

    /// The Postgres connection URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Override the pool size.
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }
}

/// Errors loading configuration from the environment.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    MissingVar(&'static str),

    #[error("environment variable {0} has an invalid value")]
    InvalidVar(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_url() {
        let config = DatabaseConfig::new("postgres://localhost/hotel").with_pool_size(4);
        assert_eq!(config.url(), "postgres://localhost/hotel");
        assert_eq!(config.pool_size, 4);
    }
}
