//! Event publisher adapters.
//!
//! - `InMemoryEventPublisher` - Captures events for test assertions
//! - `PostgresOutboxPublisher` (in `postgres`) - Durable outbox rows for relay

mod in_memory;

pub use in_memory::InMemoryEventPublisher;
