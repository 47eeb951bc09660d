//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid timeout for {0}")]
    InvalidTimeout(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid Razorpay key id format")]
    InvalidGatewayKey,

    #[error("Invalid currency code: {0}")]
    InvalidCurrency(String),

    #[error("Invalid URL for {0}")]
    InvalidUrl(&'static str),

    #[error("Preview units must be between 1 and 100")]
    InvalidPreviewUnits,

    #[error("Commission rate must be at most 10000 basis points")]
    InvalidCommissionRate,

    #[error("Plan price for {0} must be positive")]
    InvalidPlanPrice(&'static str),

    #[error("Sweep interval must be between 1 minute and 7 days")]
    InvalidSweepInterval,

    #[error("Invalid log filter directive: {0}")]
    InvalidLogFilter(String),
}
