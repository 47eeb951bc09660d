//! PostgreSQL pool settings

use serde::Deserialize;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres://` or `postgresql://` connection string
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_min_connections")]
    pub min_connections: u32,

    /// Seconds to wait for a free connection before failing the call
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,

    /// Apply `migrations/` before serving
    #[serde(default)]
    pub run_migrations: bool,
}

impl DatabaseConfig {
    /// Pool builder carrying the configured limits.
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
            .idle_timeout(Duration::from_secs(IDLE_TIMEOUT_SECS))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("DATABASE__URL"));
        }
        let scheme_ok = ["postgres://", "postgresql://"]
            .iter()
            .any(|scheme| self.url.starts_with(scheme));
        if !scheme_ok {
            return Err(ValidationError::InvalidDatabaseUrl);
        }
        if self.max_connections > MAX_POOL_SIZE {
            return Err(ValidationError::PoolSizeTooLarge);
        }
        if self.max_connections == 0 || self.min_connections > self.max_connections {
            return Err(ValidationError::InvalidPoolSize);
        }
        if self.acquire_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("database acquire"));
        }
        Ok(())
    }
}

const MAX_POOL_SIZE: u32 = 100;
const IDLE_TIMEOUT_SECS: u64 = 300;

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

fn default_acquire_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_url(url: &str) -> DatabaseConfig {
        DatabaseConfig {
            url: url.to_string(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout_secs: default_acquire_timeout(),
            run_migrations: false,
        }
    }

    #[test]
    fn accepts_both_postgres_schemes() {
        assert!(with_url("postgres://app@db/entitlements").validate().is_ok());
        assert!(with_url("postgresql://app@db/entitlements").validate().is_ok());
    }

    #[test]
    fn rejects_missing_or_foreign_url() {
        assert_eq!(
            with_url("").validate(),
            Err(ValidationError::MissingRequired("DATABASE__URL"))
        );
        assert_eq!(
            with_url("mysql://db/entitlements").validate(),
            Err(ValidationError::InvalidDatabaseUrl)
        );
    }

    #[test]
    fn rejects_inverted_or_oversized_pool() {
        let mut config = with_url("postgres://db/e");
        config.min_connections = 20;
        assert_eq!(config.validate(), Err(ValidationError::InvalidPoolSize));

        config.min_connections = 1;
        config.max_connections = 101;
        assert_eq!(config.validate(), Err(ValidationError::PoolSizeTooLarge));

        config.max_connections = 0;
        config.min_connections = 0;
        assert_eq!(config.validate(), Err(ValidationError::InvalidPoolSize));
    }

    #[test]
    fn zero_acquire_timeout_is_invalid() {
        let mut config = with_url("postgres://db/e");
        config.acquire_timeout_secs = 0;
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidTimeout("database acquire"))
        );
    }

    #[test]
    fn pool_options_carry_limits() {
        let options = with_url("postgres://db/e").pool_options();
        assert_eq!(options.get_max_connections(), 10);
        assert_eq!(options.get_min_connections(), 1);
        assert_eq!(options.get_acquire_timeout(), Duration::from_secs(5));
    }
}
