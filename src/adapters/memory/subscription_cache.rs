//! In-memory subscription mirror.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::domain::subscription::{CachedSubscription, SubscriptionStatus};
use crate::ports::SubscriptionCache;

#[derive(Default)]
pub struct InMemorySubscriptionCache {
    entries: RwLock<HashMap<UserId, CachedSubscription>>,
    fail_writes: AtomicBool,
}

impl InMemorySubscriptionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every write fails with a database error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), DomainError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                "subscription cache unavailable",
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionCache for InMemorySubscriptionCache {
    async fn set_active(
        &self,
        user_id: &UserId,
        start_at: Timestamp,
        end_at: Timestamp,
    ) -> Result<(), DomainError> {
        self.check_writable()?;
        let mut entries = self.entries.write().await;
        if let Some(existing) = entries.get(user_id) {
            if existing.start_at.is_after(&start_at) {
                return Ok(());
            }
        }
        entries.insert(
            user_id.clone(),
            CachedSubscription {
                status: SubscriptionStatus::Active,
                start_at,
                end_at,
            },
        );
        Ok(())
    }

    async fn set_expired_if_matches(
        &self,
        user_id: &UserId,
        end_at: Timestamp,
    ) -> Result<(), DomainError> {
        self.check_writable()?;
        if let Some(entry) = self.entries.write().await.get_mut(user_id) {
            if entry.end_at == end_at {
                entry.status = SubscriptionStatus::Expired;
            }
        }
        Ok(())
    }

    async fn get(&self, user_id: &UserId) -> Result<Option<CachedSubscription>, DomainError> {
        Ok(self.entries.read().await.get(user_id).copied())
    }
}
