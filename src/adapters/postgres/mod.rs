//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresPaymentRepository` - Payments with guarded status updates
//! - `PostgresSubscriptionRepository` - Transactional supersede-and-insert
//! - `PostgresOwnershipRepository` - `ON CONFLICT DO NOTHING` grants
//! - `PostgresItemRepository` - Item reads and lazy length backfill
//! - `PostgresOrderRepository` - Escrow compare-and-set
//! - `PostgresSubscriptionCache` - Per-user subscription mirror
//! - `PostgresOutboxPublisher` - Grant events into the outbox table
//!
//! Schema lives in `migrations/`.

mod item_repository;
mod order_repository;
mod outbox_publisher;
mod ownership_repository;
mod payment_repository;
mod subscription_cache;
mod subscription_repository;

pub use item_repository::PostgresItemRepository;
pub use order_repository::PostgresOrderRepository;
pub use outbox_publisher::PostgresOutboxPublisher;
pub use ownership_repository::PostgresOwnershipRepository;
pub use payment_repository::PostgresPaymentRepository;
pub use subscription_cache::PostgresSubscriptionCache;
pub use subscription_repository::PostgresSubscriptionRepository;

use std::fmt::Display;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Maps a sqlx failure to a database error with context.
fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::database(context, e)
}

/// Maps an unparseable stored value to a database error.
///
/// A bad row is a storage fault, never caller input.
fn corrupt<E: Display>(column: &'static str) -> impl Fn(E) -> DomainError {
    move |e| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid {} in stored row: {}", column, e),
        )
    }
}
