//! ContentReader - the read-item flow: load, resolve, issue.

use std::sync::Arc;

use tracing::debug;

use crate::domain::access::{AccessArtifact, AccessDecision, Actor};
use crate::domain::foundation::ItemId;
use crate::ports::ItemRepository;

use super::{ContentAccessIssuer, EngineError, EntitlementResolver};

/// What a reader gets back for one item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemAccess {
    pub decision: AccessDecision,
    pub artifact: AccessArtifact,
}

pub struct ContentReader {
    items: Arc<dyn ItemRepository>,
    resolver: Arc<EntitlementResolver>,
    issuer: Arc<ContentAccessIssuer>,
}

impl ContentReader {
    pub fn new(
        items: Arc<dyn ItemRepository>,
        resolver: Arc<EntitlementResolver>,
        issuer: Arc<ContentAccessIssuer>,
    ) -> Self {
        Self {
            items,
            resolver,
            issuer,
        }
    }

    pub async fn read(&self, actor: &Actor, item_id: &ItemId) -> Result<ItemAccess, EngineError> {
        let item = self
            .items
            .find_by_id(item_id)
            .await?
            .ok_or_else(|| EngineError::not_found("item", item_id))?;

        let decision = self.resolver.resolve(actor, &item).await?;
        let artifact = self.issuer.issue(&item, decision.tier).await?;

        debug!(
            item_id = %item_id,
            tier = %decision.tier,
            reason = ?decision.reason,
            degraded = artifact.is_degraded(),
            "Issued access artifact"
        );
        Ok(ItemAccess { decision, artifact })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryItemRepository, InMemoryOwnershipRepository, InMemorySubscriptionCache,
        InMemorySubscriptionRepository,
    };
    use crate::adapters::storage::InMemoryStorageProvider;
    use crate::application::{DeliveryPolicy, OwnershipGrantor, SubscriptionLifecycle};
    use crate::domain::access::AccessTier;
    use crate::domain::catalog::{ContentRef, Item, Visibility};
    use crate::domain::foundation::UserId;

    async fn reader_with(item: &Item) -> (ContentReader, Arc<OwnershipGrantor>) {
        let items = Arc::new(InMemoryItemRepository::new());
        items.insert(item.clone()).await;
        let storage = Arc::new(InMemoryStorageProvider::new("https://cdn.test"));
        storage.put_asset(&item.content_ref, 100).await;

        let grantor = Arc::new(OwnershipGrantor::new(Arc::new(
            InMemoryOwnershipRepository::new(),
        )));
        let lifecycle = Arc::new(SubscriptionLifecycle::new(
            Arc::new(InMemorySubscriptionRepository::new()),
            Arc::new(InMemorySubscriptionCache::new()),
        ));
        let resolver = Arc::new(EntitlementResolver::new(grantor.clone(), lifecycle));
        let issuer = Arc::new(ContentAccessIssuer::new(
            storage,
            items.clone(),
            DeliveryPolicy::default(),
        ));
        (ContentReader::new(items, resolver, issuer), grantor)
    }

    fn premium_item() -> Item {
        Item::new(
            ItemId::new(),
            "Piranesi",
            Visibility::Premium,
            ContentRef::new("books/piranesi.pdf").unwrap(),
        )
    }

    #[tokio::test]
    async fn unknown_item_is_not_found() {
        let (reader, _) = reader_with(&premium_item()).await;
        let err = reader.read(&Actor::Anonymous, &ItemId::new()).await.unwrap_err();
        assert!(matches!(err, EngineError::NotFound { resource: "item", .. }));
    }

    #[tokio::test]
    async fn non_owner_reads_preview() {
        let item = premium_item();
        let (reader, _) = reader_with(&item).await;
        let access = reader
            .read(&Actor::Member(UserId::new("u1").unwrap()), &item.id)
            .await
            .unwrap();
        assert_eq!(access.decision.tier, AccessTier::Preview);
        assert!(access.artifact.is_preview);
        assert_eq!(access.artifact.total_length, 100);
    }

    #[tokio::test]
    async fn owner_reads_full() {
        let item = premium_item();
        let (reader, grantor) = reader_with(&item).await;
        let user = UserId::new("u1").unwrap();
        grantor.grant(&user, &item.id, None).await.unwrap();

        let access = reader.read(&Actor::Member(user), &item.id).await.unwrap();
        assert_eq!(access.decision.tier, AccessTier::Full);
        assert!(!access.artifact.is_preview);
    }
}
