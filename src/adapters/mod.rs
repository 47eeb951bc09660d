//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the engine to external systems:
//! - `razorpay` - Payment gateway (orders, callback signatures)
//! - `storage` - Signed CDN delivery and asset metadata
//! - `postgres` - Repositories, subscription mirror and event outbox
//! - `events` - In-memory event capture
//! - `memory` - In-memory repositories for tests and local runs

pub mod events;
pub mod memory;
pub mod postgres;
pub mod razorpay;
pub mod storage;

mod signing;

pub use events::InMemoryEventPublisher;
pub use razorpay::{MockPaymentGateway, RazorpayConfig, RazorpayGateway};
pub use storage::{InMemoryStorageProvider, SignedCdnConfig, SignedCdnStorage, StorageFault};
