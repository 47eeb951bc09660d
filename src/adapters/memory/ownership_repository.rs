//! In-memory ownership repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ItemId, UserId};
use crate::domain::ownership::OwnershipRecord;
use crate::ports::OwnershipRepository;

/// Ownership keyed by `(user, item)`; the map key is the uniqueness constraint.
#[derive(Default)]
pub struct InMemoryOwnershipRepository {
    records: RwLock<HashMap<(UserId, ItemId), OwnershipRecord>>,
}

impl InMemoryOwnershipRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OwnershipRepository for InMemoryOwnershipRepository {
    async fn find_or_create(&self, record: &OwnershipRecord) -> Result<OwnershipRecord, DomainError> {
        let mut records = self.records.write().await;
        let stored = records
            .entry((record.user_id.clone(), record.item_id))
            .or_insert_with(|| record.clone());
        Ok(stored.clone())
    }

    async fn exists(&self, user_id: &UserId, item_id: &ItemId) -> Result<bool, DomainError> {
        Ok(self
            .records
            .read()
            .await
            .contains_key(&(user_id.clone(), *item_id)))
    }

    async fn find(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
    ) -> Result<Option<OwnershipRecord>, DomainError> {
        Ok(self
            .records
            .read()
            .await
            .get(&(user_id.clone(), *item_id))
            .cloned())
    }
}
