//! In-memory item reader.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::catalog::Item;
use crate::domain::foundation::{DomainError, ItemId};
use crate::ports::ItemRepository;

#[derive(Default)]
pub struct InMemoryItemRepository {
    items: RwLock<HashMap<ItemId, Item>>,
}

impl InMemoryItemRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an item, replacing any with the same id.
    pub async fn insert(&self, item: Item) {
        self.items.write().await.insert(item.id, item);
    }
}

#[async_trait]
impl ItemRepository for InMemoryItemRepository {
    async fn find_by_id(&self, id: &ItemId) -> Result<Option<Item>, DomainError> {
        Ok(self.items.read().await.get(id).cloned())
    }

    async fn record_length(&self, id: &ItemId, length: u32) -> Result<bool, DomainError> {
        let mut items = self.items.write().await;
        match items.get_mut(id) {
            Some(item) if item.cached_length.is_none() => {
                item.cached_length = Some(length);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{ContentRef, Visibility};

    #[tokio::test]
    async fn record_length_writes_once() {
        let repo = InMemoryItemRepository::new();
        let item = Item::new(
            ItemId::new(),
            "Dune",
            Visibility::Premium,
            ContentRef::new("books/dune.pdf").unwrap(),
        );
        repo.insert(item.clone()).await;

        assert!(repo.record_length(&item.id, 400).await.unwrap());
        assert!(!repo.record_length(&item.id, 401).await.unwrap());
        assert!(!repo.record_length(&ItemId::new(), 1).await.unwrap());

        let stored = repo.find_by_id(&item.id).await.unwrap().unwrap();
        assert_eq!(stored.cached_length, Some(400));
    }
}
