//! Payment gateway port.
//!
//! Defines the contract for the external gateway that opens orders and
//! signs payment callbacks.
//!
//! # Design
//!
//! - **Gateway agnostic**: any provider with order ids and signed callbacks fits
//! - **Real verification**: `verify_signature` must check a cryptographic
//!   signature against the shared secret; adapters never hardcode success
//! - **Bounded**: network calls carry the client timeout from configuration

use crate::domain::foundation::{Currency, Money, PaymentId};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for payment gateway integrations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open an order with the gateway.
    ///
    /// Returns the gateway's order id, which becomes the payment's
    /// external order id.
    async fn create_order(&self, request: ExternalOrderRequest)
        -> Result<ExternalOrder, GatewayError>;

    /// Check a callback signature over `(order id, payment id)`.
    ///
    /// Pure computation against the shared secret; never touches the network.
    fn verify_signature(
        &self,
        external_order_id: &str,
        external_payment_id: &str,
        signature: &str,
    ) -> bool;
}

/// Request to open a gateway order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalOrderRequest {
    pub amount: Money,
    pub currency: Currency,
    /// Our local id, passed as the gateway receipt for cross-referencing.
    pub receipt: PaymentId,
}

/// Gateway order as returned by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalOrder {
    pub id: String,
    pub amount: Money,
    pub currency: Currency,
}

/// Gateway error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayErrorCode {
    /// Could not reach the gateway or it timed out.
    NetworkError,

    /// Gateway rejected our credentials.
    AuthenticationError,

    /// Gateway rejected the request body.
    InvalidRequest,

    /// Gateway returned something we could not parse.
    InvalidResponse,

    /// Gateway is throttling us.
    RateLimited,
}

impl GatewayErrorCode {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GatewayErrorCode::NetworkError | GatewayErrorCode::RateLimited
        )
    }
}

/// Error returned by gateway adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub code: GatewayErrorCode,
    pub message: String,
    /// Provider's own error code, when it sent one.
    pub provider_code: Option<String>,
    pub retryable: bool,
}

impl GatewayError {
    pub fn new(code: GatewayErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::NetworkError, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorCode::InvalidResponse, message)
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for GatewayError {}
