//! Item reader port.
//!
//! Items are owned by the catalog service; the engine reads them and may
//! backfill the cached length.

use crate::domain::catalog::Item;
use crate::domain::foundation::{DomainError, ItemId};
use async_trait::async_trait;

#[async_trait]
pub trait ItemRepository: Send + Sync {
    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, DomainError>;

    /// Store the length only if none is cached yet.
    ///
    /// Returns whether this call wrote it.
    async fn record_length(&self, id: &ItemId, length: u32) -> Result<bool, DomainError>;
}
