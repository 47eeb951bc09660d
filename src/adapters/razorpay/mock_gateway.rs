//! Mock payment gateway for testing.
//!
//! Opens orders locally and verifies signatures with the real HMAC scheme,
//! so tests sign callbacks exactly as the gateway would. Supports:
//! - Outage injection for the next `create_order`
//! - Request tracking

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use secrecy::SecretString;
use uuid::Uuid;

use crate::ports::{ExternalOrder, ExternalOrderRequest, GatewayError, PaymentGateway};

use super::signature;

/// Mock gateway for testing.
///
/// # Example
///
/// ```ignore
/// let gateway = MockPaymentGateway::new("test_secret");
/// let order = gateway.create_order(request).await?;
/// let sig = gateway.sign(&order.id, "pay_1");
/// assert!(gateway.verify_signature(&order.id, "pay_1", &sig));
/// ```
pub struct MockPaymentGateway {
    secret: SecretString,
    fail_next: AtomicBool,
    requests: Mutex<Vec<ExternalOrderRequest>>,
}

impl MockPaymentGateway {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
            fail_next: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Produce the signature the gateway would attach to a callback.
    pub fn sign(&self, external_order_id: &str, external_payment_id: &str) -> String {
        signature::sign(&self.secret, external_order_id, external_payment_id)
    }

    /// Make the next `create_order` fail with a network error.
    pub fn fail_next_order(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// Order requests received so far.
    pub fn requests(&self) -> Vec<ExternalOrderRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_order(
        &self,
        request: ExternalOrderRequest,
    ) -> Result<ExternalOrder, GatewayError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(GatewayError::network("mock gateway unavailable"));
        }

        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        Ok(ExternalOrder {
            id: format!("order_{}", Uuid::new_v4().simple()),
            amount: request.amount,
            currency: request.currency,
        })
    }

    fn verify_signature(
        &self,
        external_order_id: &str,
        external_payment_id: &str,
        signature: &str,
    ) -> bool {
        signature::verify(&self.secret, external_order_id, external_payment_id, signature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{Currency, Money, PaymentId};

    fn request() -> ExternalOrderRequest {
        ExternalOrderRequest {
            amount: Money::from_minor(500).unwrap(),
            currency: Currency::new("INR").unwrap(),
            receipt: PaymentId::new(),
        }
    }

    #[tokio::test]
    async fn orders_get_unique_ids_and_are_tracked() {
        let gw = MockPaymentGateway::new("s");
        let a = gw.create_order(request()).await.unwrap();
        let b = gw.create_order(request()).await.unwrap();
        assert_ne!(a.id, b.id);
        assert!(a.id.starts_with("order_"));
        assert_eq!(gw.requests().len(), 2);
    }

    #[tokio::test]
    async fn fail_next_order_fails_exactly_once() {
        let gw = MockPaymentGateway::new("s");
        gw.fail_next_order();
        assert!(gw.create_order(request()).await.unwrap_err().retryable);
        assert!(gw.create_order(request()).await.is_ok());
    }

    #[test]
    fn sign_round_trips_through_verify() {
        let gw = MockPaymentGateway::new("s");
        let sig = gw.sign("order_1", "pay_1");
        assert!(gw.verify_signature("order_1", "pay_1", &sig));
        assert!(!gw.verify_signature("order_1", "pay_2", &sig));
    }
}
