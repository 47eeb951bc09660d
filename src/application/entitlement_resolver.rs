//! EntitlementResolver - decides FULL or PREVIEW for an (actor, item) pair.
//!
//! Rule order:
//!
//! 1. Admins get FULL
//! 2. Public items are FULL for everyone
//! 3. Authenticated owners get FULL
//! 4. A live subscription gives FULL
//! 5. Everyone else gets PREVIEW
//!
//! The first two rules short-circuit before any subscription lookup, so
//! trivially granted reads never trigger an expiry write.

use std::sync::Arc;

use tracing::debug;

use crate::domain::access::{AccessDecision, AccessReason, Actor};
use crate::domain::catalog::Item;
use crate::domain::foundation::Timestamp;

use super::{EngineError, OwnershipGrantor, SubscriptionLifecycle};

pub struct EntitlementResolver {
    ownership: Arc<OwnershipGrantor>,
    subscriptions: Arc<SubscriptionLifecycle>,
}

impl EntitlementResolver {
    pub fn new(ownership: Arc<OwnershipGrantor>, subscriptions: Arc<SubscriptionLifecycle>) -> Self {
        Self {
            ownership,
            subscriptions,
        }
    }

    pub async fn resolve(&self, actor: &Actor, item: &Item) -> Result<AccessDecision, EngineError> {
        if actor.is_admin() {
            return Ok(AccessDecision::full(AccessReason::Admin));
        }
        if item.is_public() {
            return Ok(AccessDecision::full(AccessReason::PublicItem));
        }

        let Some(user_id) = actor.user_id() else {
            return Ok(AccessDecision::preview());
        };

        if self.ownership.exists(user_id, &item.id).await? {
            return Ok(AccessDecision::full(AccessReason::Owned));
        }

        // Validates against the row's end date; the user-record mirror is never consulted.
        if let Some(subscription) = self.subscriptions.current_for(user_id).await? {
            if subscription.is_live(&Timestamp::now()) {
                return Ok(AccessDecision::full(AccessReason::Subscribed));
            }
        }

        debug!(user_id = %user_id, item_id = %item.id, "Resolved to preview");
        Ok(AccessDecision::preview())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryOwnershipRepository, InMemorySubscriptionCache, InMemorySubscriptionRepository,
    };
    use crate::domain::access::AccessTier;
    use crate::domain::catalog::{ContentRef, Visibility};
    use crate::domain::foundation::{ItemId, Money, UserId};
    use crate::domain::subscription::{Plan, Subscription, SubscriptionStatus};
    use crate::ports::{SubscriptionCache, SubscriptionRepository};
    use proptest::prelude::*;

    struct Fixture {
        subscriptions_repo: Arc<InMemorySubscriptionRepository>,
        cache: Arc<InMemorySubscriptionCache>,
        ownership: Arc<OwnershipGrantor>,
        lifecycle: Arc<SubscriptionLifecycle>,
        resolver: EntitlementResolver,
    }

    fn fixture() -> Fixture {
        let subscriptions_repo = Arc::new(InMemorySubscriptionRepository::new());
        let cache = Arc::new(InMemorySubscriptionCache::new());
        let ownership = Arc::new(OwnershipGrantor::new(Arc::new(
            InMemoryOwnershipRepository::new(),
        )));
        let lifecycle = Arc::new(SubscriptionLifecycle::new(
            subscriptions_repo.clone(),
            cache.clone(),
        ));
        let resolver = EntitlementResolver::new(ownership.clone(), lifecycle.clone());
        Fixture {
            subscriptions_repo,
            cache,
            ownership,
            lifecycle,
            resolver,
        }
    }

    fn item(visibility: Visibility) -> Item {
        Item::new(
            ItemId::new(),
            "The Left Hand of Darkness",
            visibility,
            ContentRef::new("books/lhod.pdf").unwrap(),
        )
    }

    fn monthly() -> Plan {
        Plan::new("monthly", 1, Money::from_minor(19_900).unwrap()).unwrap()
    }

    fn member(id: &str) -> Actor {
        Actor::Member(UserId::new(id).unwrap())
    }

    async fn seed_lapsed(f: &Fixture, user_id: &UserId) -> Subscription {
        let now = Timestamp::now();
        let mut sub = Subscription::activate(user_id.clone(), &monthly(), now.minus_days(40));
        sub.end_at = now.minus_days(1);
        f.subscriptions_repo.activate(&sub).await.unwrap();
        f.cache.set_active(user_id, sub.start_at, sub.end_at).await.unwrap();
        sub
    }

    #[tokio::test]
    async fn admin_gets_full_on_premium() {
        let f = fixture();
        let actor = Actor::Admin(UserId::new("root").unwrap());
        let decision = f.resolver.resolve(&actor, &item(Visibility::Premium)).await.unwrap();
        assert_eq!(decision, AccessDecision::full(AccessReason::Admin));
    }

    #[tokio::test]
    async fn public_item_short_circuits_before_subscription_lookup() {
        let f = fixture();
        let user = UserId::new("u1").unwrap();
        let lapsed = seed_lapsed(&f, &user).await;

        let decision = f
            .resolver
            .resolve(&Actor::Member(user), &item(Visibility::Public))
            .await
            .unwrap();
        assert_eq!(decision.reason, AccessReason::PublicItem);

        // No self-heal write happened.
        let row = f.subscriptions_repo.find_by_id(&lapsed.id).await.unwrap().unwrap();
        assert_eq!(row.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn anonymous_gets_preview_on_premium() {
        let f = fixture();
        let decision = f
            .resolver
            .resolve(&Actor::Anonymous, &item(Visibility::Premium))
            .await
            .unwrap();
        assert_eq!(decision.tier, AccessTier::Preview);
    }

    #[tokio::test]
    async fn owner_gets_full_even_with_expired_subscription() {
        let f = fixture();
        let user = UserId::new("u1").unwrap();
        let book = item(Visibility::Premium);
        seed_lapsed(&f, &user).await;
        f.ownership.grant(&user, &book.id, None).await.unwrap();

        let decision = f.resolver.resolve(&Actor::Member(user), &book).await.unwrap();
        assert_eq!(decision, AccessDecision::full(AccessReason::Owned));
    }

    #[tokio::test]
    async fn live_subscriber_gets_full() {
        let f = fixture();
        let user = UserId::new("u1").unwrap();
        f.lifecycle.activate(&user, &monthly()).await.unwrap();

        let decision = f
            .resolver
            .resolve(&Actor::Member(user), &item(Visibility::Premium))
            .await
            .unwrap();
        assert_eq!(decision, AccessDecision::full(AccessReason::Subscribed));
    }

    #[tokio::test]
    async fn lapsed_subscriber_gets_preview_and_row_is_expired() {
        let f = fixture();
        let user = UserId::new("u1").unwrap();
        let lapsed = seed_lapsed(&f, &user).await;

        let decision = f
            .resolver
            .resolve(&Actor::Member(user), &item(Visibility::Premium))
            .await
            .unwrap();
        assert_eq!(decision.tier, AccessTier::Preview);

        let row = f.subscriptions_repo.find_by_id(&lapsed.id).await.unwrap().unwrap();
        assert_eq!(row.status, SubscriptionStatus::Expired);
    }

    #[tokio::test]
    async fn stale_active_cache_does_not_grant_access() {
        let f = fixture();
        let user = UserId::new("u1").unwrap();
        seed_lapsed(&f, &user).await;
        // Cache claims active far into the future.
        f.cache
            .set_active(&user, Timestamp::now(), Timestamp::now().add_days(365))
            .await
            .unwrap();

        let decision = f
            .resolver
            .resolve(&member("u1"), &item(Visibility::Premium))
            .await
            .unwrap();
        assert_eq!(decision.tier, AccessTier::Preview);
    }

    proptest! {
        #[test]
        fn public_items_are_always_full(owns in any::<bool>(), subscribed in any::<bool>(), anon in any::<bool>()) {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            runtime.block_on(async {
                let f = fixture();
                let user = UserId::new("u1").unwrap();
                let book = item(Visibility::Public);
                if owns {
                    f.ownership.grant(&user, &book.id, None).await.unwrap();
                }
                if subscribed {
                    f.lifecycle.activate(&user, &monthly()).await.unwrap();
                } else {
                    seed_lapsed(&f, &user).await;
                }
                let actor = if anon { Actor::Anonymous } else { Actor::Member(user) };
                let decision = f.resolver.resolve(&actor, &book).await.unwrap();
                assert_eq!(decision.tier, AccessTier::Full);
            });
        }
    }
}
