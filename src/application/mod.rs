//! Application layer - engine components.
//!
//! Each component is constructed with injected ports and orchestrates
//! domain operations. Leaf-first:
//!
//! - `SubscriptionLifecycle`, `OwnershipGrantor` - entitlement grants
//! - `PaymentLedger` - gateway callbacks to captured payments and grants
//! - `EntitlementResolver` - FULL vs PREVIEW decisions
//! - `ContentAccessIssuer` - signed delivery artifacts
//! - `ContentReader` - read-item orchestration
//! - `EscrowLedger` - marketplace settlement
//! - `ExpirySweeper` - scheduled expiry

mod content_access_issuer;
mod content_reader;
mod entitlement_resolver;
mod errors;
mod escrow_ledger;
mod expiry_sweeper;
mod ownership_grantor;
mod payment_ledger;
mod subscription_lifecycle;

pub use content_access_issuer::{ContentAccessIssuer, DeliveryPolicy};
pub use content_reader::{ContentReader, ItemAccess};
pub use entitlement_resolver::EntitlementResolver;
pub use errors::EngineError;
pub use escrow_ledger::EscrowLedger;
pub use expiry_sweeper::ExpirySweeper;
pub use ownership_grantor::OwnershipGrantor;
pub use payment_ledger::{
    CreateOrderCommand, PaymentLedger, VerifyPaymentCommand, DEFAULT_GRANT_GRACE,
};
pub use subscription_lifecycle::SubscriptionLifecycle;
