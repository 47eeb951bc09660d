//! Razorpay payment gateway adapter.
//!
//! Implements the `PaymentGateway` port:
//! - Order creation through the Orders API
//! - Checkout callback signature verification
//!
//! # Security
//!
//! - Signatures use HMAC-SHA256 with constant-time comparison
//! - Secrets are handled via `secrecy::SecretString`

mod mock_gateway;
mod razorpay_gateway;
pub mod signature;

pub use mock_gateway::MockPaymentGateway;
pub use razorpay_gateway::{RazorpayConfig, RazorpayGateway};
