//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `ENTITLEMENT_ENGINE` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use entitlement_engine::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Sweeping every {:?}", config.subscription.sweep_interval());
//! ```

mod database;
mod error;
mod escrow;
mod logging;
mod payment;
mod storage;
mod subscription;

pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use escrow::EscrowConfig;
pub use logging::LoggingConfig;
pub use payment::PaymentConfig;
pub use storage::StorageConfig;
pub use subscription::SubscriptionConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Payment gateway configuration (Razorpay)
    pub payment: PaymentConfig,

    /// Signed content delivery configuration
    pub storage: StorageConfig,

    /// Escrow commission
    #[serde(default)]
    pub escrow: EscrowConfig,

    /// Plan prices and expiry sweeps
    #[serde(default)]
    pub subscription: SubscriptionConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `ENTITLEMENT_ENGINE` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `ENTITLEMENT_ENGINE__DATABASE__URL=...` -> `database.url = ...`
    /// - `ENTITLEMENT_ENGINE__ESCROW__COMMISSION_BPS=250` -> `escrow.commission_bps = 250`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or values
    /// cannot be parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("ENTITLEMENT_ENGINE")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns the first `ValidationError` found, section by section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.payment.validate()?;
        self.storage.validate()?;
        self.escrow.validate()?;
        self.subscription.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const REQUIRED: &[(&str, &str)] = &[
        ("ENTITLEMENT_ENGINE__DATABASE__URL", "postgresql://test@localhost/test"),
        ("ENTITLEMENT_ENGINE__PAYMENT__KEY_ID", "rzp_test_xxx"),
        ("ENTITLEMENT_ENGINE__PAYMENT__KEY_SECRET", "razorpay-secret"),
        (
            "ENTITLEMENT_ENGINE__STORAGE__DELIVERY_BASE_URL",
            "https://cdn.example.com/demo/image/authenticated",
        ),
        (
            "ENTITLEMENT_ENGINE__STORAGE__ADMIN_API_URL",
            "https://api.cdn.example.com/v1/demo",
        ),
        ("ENTITLEMENT_ENGINE__STORAGE__API_KEY", "cdn-key"),
        ("ENTITLEMENT_ENGINE__STORAGE__SIGNING_SECRET", "cdn-secret"),
    ];

    const OPTIONAL: &[&str] = &[
        "ENTITLEMENT_ENGINE__ESCROW__COMMISSION_BPS",
        "ENTITLEMENT_ENGINE__SUBSCRIPTION__MONTHLY_PRICE",
        "ENTITLEMENT_ENGINE__STORAGE__PREVIEW_UNITS",
        "ENTITLEMENT_ENGINE__LOGGING__JSON",
    ];

    fn set_minimal_env() {
        for (key, value) in REQUIRED {
            env::set_var(key, value);
        }
    }

    fn clear_env() {
        for (key, _) in REQUIRED {
            env::remove_var(key);
        }
        for key in OPTIONAL {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.database.url, "postgresql://test@localhost/test");
        assert_eq!(config.payment.key_id, "rzp_test_xxx");
        assert_eq!(config.storage.api_key, "cdn-key");
    }

    #[test]
    fn test_validate_full_config() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_section_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.escrow.commission_bps, 500);
        assert_eq!(config.storage.preview_units, 5);
        assert_eq!(config.payment.currency, "INR");
        assert_eq!(config.subscription.sweep_interval_secs, 86_400);
        assert_eq!(config.logging.filter, "info");
    }

    #[test]
    fn test_overrides() {
        let _guard = ENV_MUTEX.lock().unwrap();
        set_minimal_env();
        env::set_var("ENTITLEMENT_ENGINE__ESCROW__COMMISSION_BPS", "250");
        env::set_var("ENTITLEMENT_ENGINE__SUBSCRIPTION__MONTHLY_PRICE", "9900");
        env::set_var("ENTITLEMENT_ENGINE__STORAGE__PREVIEW_UNITS", "3");
        env::set_var("ENTITLEMENT_ENGINE__LOGGING__JSON", "true");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.escrow.commission_bps, 250);
        assert_eq!(config.subscription.monthly_price, 9900);
        assert_eq!(config.storage.delivery_policy().preview_units, 3);
        assert!(config.logging.json);
    }

    #[test]
    fn test_missing_required_section_fails_to_load() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        env::set_var("ENTITLEMENT_ENGINE__DATABASE__URL", "postgresql://test@localhost/test");
        let result = AppConfig::load();
        clear_env();

        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
