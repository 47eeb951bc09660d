//! Storage Adapters
//!
//! Implementations of the `StorageProvider` port.
//!
//! ## Available Adapters
//!
//! - **SignedCdnStorage** - HMAC-signed CDN delivery plus admin API metadata
//! - **InMemoryStorageProvider** - In-memory assets with fault injection (testing)
//!
//! ## Usage
//!
//! ```ignore
//! // Production
//! let storage = SignedCdnStorage::new(SignedCdnConfig::new(cdn, admin, key, secret))?;
//!
//! // Testing
//! let storage = InMemoryStorageProvider::new("https://cdn.test");
//! storage.inject(StorageFault::UnsignedOnce).await;
//! ```

mod in_memory_storage;
mod signed_cdn_storage;

pub use in_memory_storage::{InMemoryStorageProvider, StorageFault};
pub use signed_cdn_storage::{SignedCdnConfig, SignedCdnStorage};
