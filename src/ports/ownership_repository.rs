//! Ownership repository port.

use crate::domain::foundation::{DomainError, ItemId, UserId};
use crate::domain::ownership::OwnershipRecord;
use async_trait::async_trait;

/// Persistence for perpetual ownership records.
///
/// Implementations must enforce uniqueness of `(user_id, item_id)` in the
/// store itself, not by checking first.
#[async_trait]
pub trait OwnershipRepository: Send + Sync {
    /// Insert `record` unless the pair already exists.
    ///
    /// Returns the stored record: the new one, or the pre-existing one.
    async fn find_or_create(&self, record: &OwnershipRecord) -> Result<OwnershipRecord, DomainError>;

    async fn exists(&self, user_id: &UserId, item_id: &ItemId) -> Result<bool, DomainError>;

    async fn find(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
    ) -> Result<Option<OwnershipRecord>, DomainError>;
}
