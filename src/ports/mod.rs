//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Collaborator Ports
//!
//! - `PaymentGateway` - Opens gateway orders, verifies callback signatures
//! - `StorageProvider` - Asset length, signed delivery URLs, deletion
//! - `EventPublisher` - Outbound "grant happened" events
//!
//! ## Repository Ports
//!
//! - `PaymentRepository` - Payment rows with conditional capture
//! - `SubscriptionRepository` - Supersede-and-insert activation, conditional expiry
//! - `OwnershipRepository` - Unique (user, item) grants
//! - `ItemRepository` - Item reads and lazy length backfill
//! - `OrderRepository` - Escrow compare-and-set
//! - `SubscriptionCache` - Denormalized subscription mirror on user records

mod event_publisher;
mod item_repository;
mod order_repository;
mod ownership_repository;
mod payment_gateway;
mod payment_repository;
mod storage_provider;
mod subscription_cache;
mod subscription_repository;

pub use event_publisher::EventPublisher;
pub use item_repository::ItemRepository;
pub use order_repository::{EscrowChange, OrderRepository};
pub use ownership_repository::OwnershipRepository;
pub use payment_gateway::{
    ExternalOrder, ExternalOrderRequest, GatewayError, GatewayErrorCode, PaymentGateway,
};
pub use payment_repository::{CaptureOutcome, PaymentRepository};
pub use storage_provider::{
    DeliveryHints, SignedScope, SignedUrl, SignedUrlRequest, StorageError, StorageProvider,
};
pub use subscription_cache::SubscriptionCache;
pub use subscription_repository::SubscriptionRepository;
