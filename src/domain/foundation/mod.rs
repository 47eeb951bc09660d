//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, error types and the state machine
//! trait that form the vocabulary of the entitlement engine.

mod errors;
mod events;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{EventEnvelope, EventId};
pub use ids::{ItemId, OrderId, OwnershipId, PaymentId, SubscriptionId, UserId};
pub use money::{CommissionRate, Currency, Money};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
