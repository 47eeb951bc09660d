//! Payment gateway configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::foundation::Currency;

/// Payment configuration (Razorpay)
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Razorpay key id (rzp_test_... or rzp_live_...)
    pub key_id: String,

    /// Razorpay key secret; also signs checkout callbacks
    pub key_secret: SecretString,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// ISO 4217 code used for every order
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Gateway call timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl PaymentConfig {
    pub fn is_test_mode(&self) -> bool {
        self.key_id.starts_with("rzp_test_")
    }

    pub fn is_live_mode(&self) -> bool {
        self.key_id.starts_with("rzp_live_")
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parsed order currency.
    pub fn currency(&self) -> Result<Currency, ValidationError> {
        Currency::new(&self.currency).map_err(|_| ValidationError::InvalidCurrency(self.currency.clone()))
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        use secrecy::ExposeSecret;

        if self.key_id.is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__KEY_ID"));
        }
        if self.key_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("PAYMENT__KEY_SECRET"));
        }
        if !self.is_test_mode() && !self.is_live_mode() {
            return Err(ValidationError::InvalidGatewayKey);
        }
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://") {
            return Err(ValidationError::InvalidUrl("payment api_base_url"));
        }
        if self.timeout_secs == 0 || self.timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout("payment gateway"));
        }
        self.currency()?;
        Ok(())
    }
}

fn default_api_base_url() -> String {
    "https://api.razorpay.com".to_string()
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(key_id: &str, secret: &str) -> PaymentConfig {
        PaymentConfig {
            key_id: key_id.to_string(),
            key_secret: SecretString::new(secret.to_string()),
            api_base_url: default_api_base_url(),
            currency: default_currency(),
            timeout_secs: default_timeout(),
        }
    }

    #[test]
    fn test_modes() {
        assert!(config("rzp_test_abc", "s").is_test_mode());
        assert!(config("rzp_live_abc", "s").is_live_mode());
    }

    #[test]
    fn test_validation_requires_secret() {
        assert_eq!(
            config("rzp_test_abc", "").validate(),
            Err(ValidationError::MissingRequired("PAYMENT__KEY_SECRET"))
        );
    }

    #[test]
    fn test_validation_rejects_foreign_key() {
        assert_eq!(
            config("sk_test_abc", "s").validate(),
            Err(ValidationError::InvalidGatewayKey)
        );
    }

    #[test]
    fn test_validation_requires_test_or_live_key() {
        assert_eq!(
            config("rzp_abc", "s").validate(),
            Err(ValidationError::InvalidGatewayKey)
        );
        assert!(config("rzp_live_abc", "s").validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_currency() {
        let mut c = config("rzp_test_abc", "s");
        c.currency = "rupees".to_string();
        assert!(matches!(c.validate(), Err(ValidationError::InvalidCurrency(_))));
    }

    #[test]
    fn test_valid_config() {
        let c = config("rzp_test_abc", "s");
        assert!(c.validate().is_ok());
        assert_eq!(c.currency().unwrap().as_str(), "INR");
        assert_eq!(c.timeout(), Duration::from_secs(10));
    }
}
