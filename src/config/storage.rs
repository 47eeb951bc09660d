//! Content delivery configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::DeliveryPolicy;

/// Signed CDN configuration and artifact policy
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Base URL signed delivery links are built on
    pub delivery_base_url: String,

    /// Admin API used for asset metadata and deletion
    pub admin_api_url: String,

    pub api_key: String,

    /// Shared secret for delivery signatures
    pub signing_secret: SecretString,

    #[serde(default = "default_ttl")]
    pub full_ttl_secs: u64,

    #[serde(default = "default_ttl")]
    pub preview_ttl_secs: u64,

    /// Leading pages exposed by a preview
    #[serde(default = "default_preview_units")]
    pub preview_units: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Artifact policy derived from the configured lifetimes.
    pub fn delivery_policy(&self) -> DeliveryPolicy {
        DeliveryPolicy {
            full_ttl: Duration::from_secs(self.full_ttl_secs),
            preview_ttl: Duration::from_secs(self.preview_ttl_secs),
            preview_units: self.preview_units,
            ..DeliveryPolicy::default()
        }
    }

    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.delivery_base_url.is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE__DELIVERY_BASE_URL"));
        }
        if self.admin_api_url.is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE__ADMIN_API_URL"));
        }
        if self.api_key.is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE__API_KEY"));
        }
        if self.signing_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE__SIGNING_SECRET"));
        }
        if !is_http_url(&self.delivery_base_url) {
            return Err(ValidationError::InvalidUrl("storage delivery_base_url"));
        }
        if !is_http_url(&self.admin_api_url) {
            return Err(ValidationError::InvalidUrl("storage admin_api_url"));
        }
        if self.full_ttl_secs == 0 || self.preview_ttl_secs == 0 {
            return Err(ValidationError::InvalidTimeout("artifact lifetime"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("storage provider"));
        }
        if self.preview_units == 0 || self.preview_units > 100 {
            return Err(ValidationError::InvalidPreviewUnits);
        }
        Ok(())
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

fn default_ttl() -> u64 {
    3600
}

fn default_preview_units() -> u32 {
    5
}

fn default_timeout() -> u64 {
    10
}
