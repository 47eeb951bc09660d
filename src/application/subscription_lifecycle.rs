//! SubscriptionLifecycle - activation, expiry sweep and self-healing reads.
//!
//! All mutations go through the repository's conditional updates. The sweep
//! and the read path may run concurrently; both converge on the same
//! `status = active AND end_at < now` update, so whichever runs second is a
//! no-op.

use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::domain::foundation::{Timestamp, UserId};
use crate::domain::subscription::{Plan, Subscription};
use crate::ports::{SubscriptionCache, SubscriptionRepository};

use super::EngineError;

pub struct SubscriptionLifecycle {
    subscriptions: Arc<dyn SubscriptionRepository>,
    cache: Arc<dyn SubscriptionCache>,
}

impl SubscriptionLifecycle {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        cache: Arc<dyn SubscriptionCache>,
    ) -> Self {
        Self {
            subscriptions,
            cache,
        }
    }

    /// Starts a new active subscription, superseding any current one.
    ///
    /// If the user-record mirror cannot be written, the new row is moved to
    /// `failed` and an error is returned.
    pub async fn activate(&self, user_id: &UserId, plan: &Plan) -> Result<Subscription, EngineError> {
        let now = Timestamp::now();
        let subscription = Subscription::activate(user_id.clone(), plan, now);

        let superseded = self.subscriptions.activate(&subscription).await?;

        let mirrored = self
            .cache
            .set_active(user_id, subscription.start_at, subscription.end_at)
            .await;
        if let Err(mirror_err) = mirrored {
            error!(
                user_id = %user_id,
                subscription_id = %subscription.id,
                error = %mirror_err,
                "Failed to mirror subscription onto user record; marking subscription failed"
            );
            if let Err(fail_err) = self.subscriptions.mark_failed(&subscription.id, now).await {
                error!(
                    subscription_id = %subscription.id,
                    error = %fail_err,
                    "Failed to mark unmirrored subscription as failed"
                );
            }
            return Err(EngineError::infrastructure(format!(
                "subscription cache mirror failed: {}",
                mirror_err
            )));
        }

        info!(
            user_id = %user_id,
            subscription_id = %subscription.id,
            plan = %subscription.plan,
            end_at = %subscription.end_at,
            superseded,
            "Subscription activated"
        );
        Ok(subscription)
    }

    /// Expires every lapsed active subscription. Returns how many changed.
    ///
    /// Safe to call any number of times; a repeat call against the same
    /// data returns 0.
    pub async fn expire_lapsed(&self) -> Result<u64, EngineError> {
        let now = Timestamp::now();
        let expired = self.subscriptions.expire_lapsed(now).await?;

        let mirrors = expired
            .iter()
            .map(|sub| self.cache.set_expired_if_matches(&sub.user_id, sub.end_at));
        for (sub, result) in expired.iter().zip(join_all(mirrors).await) {
            if let Err(e) = result {
                warn!(
                    user_id = %sub.user_id,
                    subscription_id = %sub.id,
                    error = %e,
                    "Failed to mirror expiry onto user record"
                );
            }
        }

        if !expired.is_empty() {
            info!(count = expired.len(), "Expired lapsed subscriptions");
        }
        Ok(expired.len() as u64)
    }

    /// The user's live subscription, if any.
    ///
    /// A row still marked active past its end date is expired in place
    /// before returning `None`.
    pub async fn current_for(&self, user_id: &UserId) -> Result<Option<Subscription>, EngineError> {
        let Some(subscription) = self.subscriptions.find_active(user_id).await? else {
            return Ok(None);
        };

        let now = Timestamp::now();
        if !subscription.is_lapsed(&now) {
            return Ok(Some(subscription));
        }

        let transitioned = self
            .subscriptions
            .expire_if_lapsed(&subscription.id, now)
            .await?;
        if transitioned {
            debug!(
                user_id = %user_id,
                subscription_id = %subscription.id,
                "Expired lapsed subscription on read"
            );
            if let Err(e) = self
                .cache
                .set_expired_if_matches(user_id, subscription.end_at)
                .await
            {
                warn!(user_id = %user_id, error = %e, "Failed to mirror expiry onto user record");
            }
        }
        Ok(None)
    }

    /// Full subscription history for a user, newest first.
    pub async fn history(&self, user_id: &UserId) -> Result<Vec<Subscription>, EngineError> {
        Ok(self.subscriptions.find_by_user(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemorySubscriptionCache, InMemorySubscriptionRepository};
    use crate::domain::foundation::Money;
    use crate::domain::subscription::SubscriptionStatus;
    use proptest::prelude::*;

    fn monthly() -> Plan {
        Plan::new("monthly", 1, Money::from_minor(19_900).unwrap()).unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    struct Fixture {
        repo: Arc<InMemorySubscriptionRepository>,
        cache: Arc<InMemorySubscriptionCache>,
        lifecycle: SubscriptionLifecycle,
    }

    fn fixture() -> Fixture {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let cache = Arc::new(InMemorySubscriptionCache::new());
        let lifecycle = SubscriptionLifecycle::new(repo.clone(), cache.clone());
        Fixture {
            repo,
            cache,
            lifecycle,
        }
    }

    /// Seeds an active row whose end date is already in the past.
    async fn seed_lapsed(f: &Fixture, user_id: &UserId) -> Subscription {
        let now = Timestamp::now();
        let mut sub = Subscription::activate(user_id.clone(), &monthly(), now.minus_days(40));
        sub.end_at = now.minus_days(1);
        f.repo.activate(&sub).await.unwrap();
        f.cache.set_active(user_id, sub.start_at, sub.end_at).await.unwrap();
        sub
    }

    #[tokio::test]
    async fn activate_mirrors_onto_cache() {
        let f = fixture();
        let u = user("u1");
        let sub = f.lifecycle.activate(&u, &monthly()).await.unwrap();

        let cached = f.cache.get(&u).await.unwrap().unwrap();
        assert_eq!(cached.status, SubscriptionStatus::Active);
        assert_eq!(cached.end_at, sub.end_at);
    }

    #[tokio::test]
    async fn late_mirror_write_from_superseded_activation_is_ignored() {
        let f = fixture();
        let u = user("u1");
        let stale = Subscription::activate(u.clone(), &monthly(), Timestamp::now().minus_days(1));
        let current = f.lifecycle.activate(&u, &monthly()).await.unwrap();

        f.cache.set_active(&u, stale.start_at, stale.end_at).await.unwrap();

        let cached = f.cache.get(&u).await.unwrap().unwrap();
        assert_eq!(cached.end_at, current.end_at);
    }

    #[tokio::test]
    async fn activate_supersedes_previous_active_row() {
        let f = fixture();
        let u = user("u1");
        let first = f.lifecycle.activate(&u, &monthly()).await.unwrap();
        let second = f.lifecycle.activate(&u, &monthly()).await.unwrap();

        let first = f.repo.find_by_id(&first.id).await.unwrap().unwrap();
        assert_eq!(first.status, SubscriptionStatus::Expired);
        let active = f.repo.find_active(&u).await.unwrap().unwrap();
        assert_eq!(active.id, second.id);
    }

    #[tokio::test]
    async fn activate_marks_row_failed_when_mirror_fails() {
        let f = fixture();
        let u = user("u1");
        f.cache.fail_writes(true);

        let err = f.lifecycle.activate(&u, &monthly()).await.unwrap_err();
        assert!(matches!(err, EngineError::Infrastructure(_)));

        let rows = f.repo.find_by_user(&u).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, SubscriptionStatus::Failed);
        assert!(f.repo.find_active(&u).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn expire_lapsed_twice_second_call_is_zero() {
        let f = fixture();
        seed_lapsed(&f, &user("u1")).await;
        seed_lapsed(&f, &user("u2")).await;
        f.lifecycle.activate(&user("u3"), &monthly()).await.unwrap();

        assert_eq!(f.lifecycle.expire_lapsed().await.unwrap(), 2);
        assert_eq!(f.lifecycle.expire_lapsed().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn expire_lapsed_mirrors_cache() {
        let f = fixture();
        let u = user("u1");
        seed_lapsed(&f, &u).await;

        f.lifecycle.expire_lapsed().await.unwrap();
        let cached = f.cache.get(&u).await.unwrap().unwrap();
        assert_eq!(cached.status, SubscriptionStatus::Expired);
    }

    #[tokio::test]
    async fn current_for_self_heals_lapsed_row() {
        let f = fixture();
        let u = user("u1");
        let sub = seed_lapsed(&f, &u).await;

        assert!(f.lifecycle.current_for(&u).await.unwrap().is_none());
        let stored = f.repo.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SubscriptionStatus::Expired);

        // Sweep after the read finds nothing left to do.
        assert_eq!(f.lifecycle.expire_lapsed().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn current_for_returns_live_row() {
        let f = fixture();
        let u = user("u1");
        let sub = f.lifecycle.activate(&u, &monthly()).await.unwrap();
        assert_eq!(f.lifecycle.current_for(&u).await.unwrap(), Some(sub));
    }

    #[tokio::test]
    async fn concurrent_self_heal_and_sweep_transition_once() {
        let f = fixture();
        let u = user("u1");
        seed_lapsed(&f, &u).await;

        let (read, swept) = tokio::join!(f.lifecycle.current_for(&u), f.lifecycle.expire_lapsed());
        assert!(read.unwrap().is_none());
        assert!(swept.unwrap() <= 1);
        let rows = f.repo.find_by_user(&u).await.unwrap();
        assert_eq!(rows[0].status, SubscriptionStatus::Expired);
    }

    #[tokio::test]
    async fn concurrent_activations_leave_one_active() {
        let f = fixture();
        let u = user("u1");
        let plan = monthly();

        let activations = (0..8).map(|_| f.lifecycle.activate(&u, &plan));
        for result in join_all(activations).await {
            result.unwrap();
        }

        let rows = f.repo.find_by_user(&u).await.unwrap();
        assert_eq!(rows.len(), 8);
        let active = rows
            .iter()
            .filter(|s| s.status == SubscriptionStatus::Active)
            .count();
        assert_eq!(active, 1);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Activate(usize),
        MirrorFailure(usize),
        Sweep,
        Read(usize),
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            (0..3usize).prop_map(Step::Activate),
            (0..3usize).prop_map(Step::MirrorFailure),
            Just(Step::Sweep),
            (0..3usize).prop_map(Step::Read),
        ]
    }

    proptest! {
        #[test]
        fn at_most_one_active_row_per_user(steps in prop::collection::vec(step(), 1..24)) {
            let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            runtime.block_on(async {
                let f = fixture();
                let users: Vec<UserId> = (0..3).map(|i| user(&format!("u{}", i))).collect();

                for step in &steps {
                    match step {
                        Step::Activate(i) => {
                            f.lifecycle.activate(&users[*i], &monthly()).await.unwrap();
                        }
                        Step::MirrorFailure(i) => {
                            f.cache.fail_writes(true);
                            assert!(f.lifecycle.activate(&users[*i], &monthly()).await.is_err());
                            f.cache.fail_writes(false);
                        }
                        Step::Sweep => {
                            f.lifecycle.expire_lapsed().await.unwrap();
                        }
                        Step::Read(i) => {
                            f.lifecycle.current_for(&users[*i]).await.unwrap();
                        }
                    }

                    for u in &users {
                        let active = f
                            .repo
                            .find_by_user(u)
                            .await
                            .unwrap()
                            .iter()
                            .filter(|s| s.status == SubscriptionStatus::Active)
                            .count();
                        assert!(active <= 1, "user {} has {} active rows", u, active);
                    }
                }
            });
        }
    }
}
