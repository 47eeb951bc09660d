//! In-memory repository adapters.
//!
//! Used by unit and integration tests and for running the engine without a
//! database. Conditional updates hold a `tokio::sync::RwLock` write guard
//! across the check and the write, so they keep the same atomicity the
//! Postgres adapters get from guarded `UPDATE`s.

mod item_repository;
mod order_repository;
mod ownership_repository;
mod payment_repository;
mod subscription_cache;
mod subscription_repository;

pub use item_repository::InMemoryItemRepository;
pub use order_repository::InMemoryOrderRepository;
pub use ownership_repository::InMemoryOwnershipRepository;
pub use payment_repository::InMemoryPaymentRepository;
pub use subscription_cache::InMemorySubscriptionCache;
pub use subscription_repository::InMemorySubscriptionRepository;
