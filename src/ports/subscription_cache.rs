//! Port for the denormalized "current subscription" mirror on user records.
//!
//! A read-side projection for fast profile reads. Nothing in the engine
//! makes access decisions from it.

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::subscription::CachedSubscription;
use async_trait::async_trait;

#[async_trait]
pub trait SubscriptionCache: Send + Sync {
    /// Mirror `{status: active, end}` onto the user.
    ///
    /// Ignored when the mirror already holds an activation that started
    /// later, so concurrent activations settle on the newest one.
    async fn set_active(
        &self,
        user_id: &UserId,
        start_at: Timestamp,
        end_at: Timestamp,
    ) -> Result<(), DomainError>;

    /// Mirror `expired`, but only if the cache still shows this `end_at`.
    ///
    /// Keeps a late sweep from clobbering a newer activation.
    async fn set_expired_if_matches(
        &self,
        user_id: &UserId,
        end_at: Timestamp,
    ) -> Result<(), DomainError>;

    async fn get(&self, user_id: &UserId) -> Result<Option<CachedSubscription>, DomainError>;
}
