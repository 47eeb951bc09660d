//! In-memory subscription repository.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::{Subscription, SubscriptionStatus};
use crate::ports::SubscriptionRepository;

/// Append-only subscription rows. Supersede-and-insert runs under a single
/// write lock, standing in for the transaction the Postgres adapter uses.
#[derive(Default)]
pub struct InMemorySubscriptionRepository {
    rows: RwLock<Vec<Subscription>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn activate(&self, subscription: &Subscription) -> Result<u64, DomainError> {
        let mut rows = self.rows.write().await;
        let mut superseded = 0;
        for row in rows
            .iter_mut()
            .filter(|r| r.user_id == subscription.user_id && r.status == SubscriptionStatus::Active)
        {
            row.expire(subscription.start_at)?;
            superseded += 1;
        }
        rows.push(subscription.clone());
        Ok(superseded)
    }

    async fn find_active(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .find(|r| &r.user_id == user_id && r.status == SubscriptionStatus::Active)
            .cloned())
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        Ok(self.rows.read().await.iter().find(|r| &r.id == id).cloned())
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError> {
        // Rows are appended in activation order.
        Ok(self
            .rows
            .read()
            .await
            .iter()
            .rev()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn expire_if_lapsed(
        &self,
        id: &SubscriptionId,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        let mut rows = self.rows.write().await;
        match rows.iter_mut().find(|r| &r.id == id) {
            Some(row) if row.is_lapsed(&now) => {
                row.expire(now)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn expire_lapsed(&self, now: Timestamp) -> Result<Vec<Subscription>, DomainError> {
        let mut rows = self.rows.write().await;
        let mut expired = Vec::new();
        for row in rows.iter_mut().filter(|r| r.is_lapsed(&now)) {
            row.expire(now)?;
            expired.push(row.clone());
        }
        Ok(expired)
    }

    async fn mark_failed(&self, id: &SubscriptionId, now: Timestamp) -> Result<bool, DomainError> {
        let mut rows = self.rows.write().await;
        match rows
            .iter_mut()
            .find(|r| &r.id == id && r.status == SubscriptionStatus::Active)
        {
            Some(row) => {
                row.fail(now)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Money;
    use crate::domain::subscription::Plan;

    fn activate(user: &str) -> Subscription {
        let plan = Plan::new("monthly", 1, Money::from_minor(100).unwrap()).unwrap();
        Subscription::activate(UserId::new(user).unwrap(), &plan, Timestamp::now())
    }

    #[tokio::test]
    async fn activation_supersedes_only_that_users_active_row() {
        let repo = InMemorySubscriptionRepository::new();
        let a1 = activate("a");
        let b1 = activate("b");
        repo.activate(&a1).await.unwrap();
        repo.activate(&b1).await.unwrap();

        let a2 = activate("a");
        assert_eq!(repo.activate(&a2).await.unwrap(), 1);

        let a = UserId::new("a").unwrap();
        assert_eq!(repo.find_active(&a).await.unwrap().unwrap().id, a2.id);
        let history = repo.find_by_user(&a).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, a2.id);
        assert_eq!(history[1].status, SubscriptionStatus::Expired);
        assert_eq!(
            repo.find_by_id(&b1.id).await.unwrap().unwrap().status,
            SubscriptionStatus::Active
        );
    }

    #[tokio::test]
    async fn expire_if_lapsed_ignores_live_rows() {
        let repo = InMemorySubscriptionRepository::new();
        let sub = activate("a");
        repo.activate(&sub).await.unwrap();
        assert!(!repo.expire_if_lapsed(&sub.id, Timestamp::now()).await.unwrap());
        assert!(repo.expire_lapsed(Timestamp::now()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mark_failed_only_moves_active_rows() {
        let repo = InMemorySubscriptionRepository::new();
        let sub = activate("a");
        repo.activate(&sub).await.unwrap();
        assert!(repo.mark_failed(&sub.id, Timestamp::now()).await.unwrap());
        assert!(!repo.mark_failed(&sub.id, Timestamp::now()).await.unwrap());
    }
}
