//! Razorpay payment gateway adapter.
//!
//! Opens orders through the Orders API and verifies checkout callbacks.
//!
//! # Security
//!
//! - Callback signature is `hex(HMAC-SHA256(key_secret, "{order_id}|{payment_id}"))`
//! - Comparison is constant-time
//! - Credentials are held in `secrecy::SecretString`
//!
//! # Configuration
//!
//! ```ignore
//! let config = RazorpayConfig::new(key_id, key_secret)
//!     .with_timeout(Duration::from_secs(10));
//! let gateway = RazorpayGateway::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Currency, Money};
use crate::ports::{
    ExternalOrder, ExternalOrderRequest, GatewayError, GatewayErrorCode, PaymentGateway,
};

use super::signature;

const DEFAULT_BASE_URL: &str = "https://api.razorpay.com";

/// Razorpay API configuration.
#[derive(Clone)]
pub struct RazorpayConfig {
    /// Public key id (rzp_live_... or rzp_test_...).
    key_id: String,

    /// Key secret; also the callback signing secret.
    key_secret: SecretString,

    api_base_url: String,

    /// Upper bound on any single API call.
    timeout: Duration,
}

impl RazorpayConfig {
    pub fn new(key_id: impl Into<String>, key_secret: SecretString) -> Self {
        Self {
            key_id: key_id.into(),
            key_secret,
            api_base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Razorpay implementation of `PaymentGateway`.
pub struct RazorpayGateway {
    config: RazorpayConfig,
    http_client: reqwest::Client,
}

impl RazorpayGateway {
    pub fn new(config: RazorpayConfig) -> Result<Self, GatewayError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            config,
            http_client,
        })
    }
}

#[derive(Debug, Serialize)]
struct CreateOrderBody<'a> {
    amount: i64,
    currency: &'a str,
    receipt: String,
}

#[derive(Debug, Deserialize)]
struct RazorpayOrder {
    id: String,
    amount: i64,
    currency: String,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorBody {
    error: RazorpayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct RazorpayErrorDetail {
    code: Option<String>,
    description: Option<String>,
}

/// Maps a non-success response to a gateway error.
fn error_from_response(status: reqwest::StatusCode, body: &str) -> GatewayError {
    let parsed = serde_json::from_str::<RazorpayErrorBody>(body).ok();
    let description = parsed
        .as_ref()
        .and_then(|b| b.error.description.clone())
        .unwrap_or_else(|| body.to_string());

    let code = match status.as_u16() {
        401 | 403 => GatewayErrorCode::AuthenticationError,
        429 => GatewayErrorCode::RateLimited,
        400..=499 => GatewayErrorCode::InvalidRequest,
        _ => GatewayErrorCode::NetworkError,
    };

    let err = GatewayError::new(code, format!("Razorpay API error ({}): {}", status, description));
    match parsed.and_then(|b| b.error.code) {
        Some(provider_code) => err.with_provider_code(provider_code),
        None => err,
    }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        request: ExternalOrderRequest,
    ) -> Result<ExternalOrder, GatewayError> {
        let url = format!("{}/v1/orders", self.config.api_base_url);
        let body = CreateOrderBody {
            amount: request.amount.minor_units(),
            currency: request.currency.as_str(),
            receipt: request.receipt.to_string(),
        };

        let response = self
            .http_client
            .post(&url)
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, error = %error_text, "Razorpay create_order failed");
            return Err(error_from_response(status, &error_text));
        }

        let order: RazorpayOrder = response.json().await.map_err(|e| {
            GatewayError::invalid_response(format!("Failed to parse Razorpay order: {}", e))
        })?;

        let amount = Money::from_minor(order.amount)
            .map_err(|e| GatewayError::invalid_response(e.to_string()))?;
        let currency = Currency::new(&order.currency)
            .map_err(|e| GatewayError::invalid_response(e.to_string()))?;

        tracing::debug!(
            external_order_id = %order.id,
            receipt = %request.receipt,
            "Razorpay order created"
        );
        Ok(ExternalOrder {
            id: order.id,
            amount,
            currency,
        })
    }

    fn verify_signature(
        &self,
        external_order_id: &str,
        external_payment_id: &str,
        signature: &str,
    ) -> bool {
        signature::verify(
            &self.config.key_secret,
            external_order_id,
            external_payment_id,
            signature,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway(secret: &str) -> RazorpayGateway {
        RazorpayGateway::new(RazorpayConfig::new(
            "rzp_test_key",
            SecretString::new(secret.to_string()),
        ))
        .unwrap()
    }

    #[test]
    fn verifies_callback_signed_with_key_secret() {
        let secret = SecretString::new("rzp_secret".to_string());
        let sig = signature::sign(&secret, "order_A", "pay_B");
        let gw = gateway("rzp_secret");

        assert!(gw.verify_signature("order_A", "pay_B", &sig));
        assert!(!gw.verify_signature("order_A", "pay_C", &sig));
        assert!(!gw.verify_signature("order_A", "pay_B", "deadbeef"));
    }

    #[test]
    fn other_secret_does_not_verify() {
        let sig = signature::sign(&SecretString::new("attacker".to_string()), "order_A", "pay_B");
        assert!(!gateway("rzp_secret").verify_signature("order_A", "pay_B", &sig));
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = RazorpayConfig::new("k", SecretString::new("s".to_string()))
            .with_base_url("http://localhost:9000/");
        assert_eq!(config.api_base_url, "http://localhost:9000");
    }

    #[test]
    fn error_mapping_uses_status_and_provider_code() {
        let body = r#"{"error":{"code":"BAD_REQUEST_ERROR","description":"amount too small"}}"#;
        let err = error_from_response(reqwest::StatusCode::BAD_REQUEST, body);
        assert_eq!(err.code, GatewayErrorCode::InvalidRequest);
        assert_eq!(err.provider_code.as_deref(), Some("BAD_REQUEST_ERROR"));
        assert!(err.message.contains("amount too small"));
        assert!(!err.retryable);

        let err = error_from_response(reqwest::StatusCode::UNAUTHORIZED, "");
        assert_eq!(err.code, GatewayErrorCode::AuthenticationError);

        let err = error_from_response(reqwest::StatusCode::BAD_GATEWAY, "upstream");
        assert!(err.retryable);
    }

    #[tokio::test]
    async fn unreachable_gateway_is_retryable_network_error() {
        let gw = RazorpayGateway::new(
            RazorpayConfig::new("k", SecretString::new("s".to_string()))
                .with_base_url("http://127.0.0.1:1")
                .with_timeout(Duration::from_millis(500)),
        )
        .unwrap();

        let err = gw
            .create_order(ExternalOrderRequest {
                amount: Money::from_minor(100).unwrap(),
                currency: Currency::new("INR").unwrap(),
                receipt: crate::domain::foundation::PaymentId::new(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, GatewayErrorCode::NetworkError);
        assert!(err.retryable);
    }
}
