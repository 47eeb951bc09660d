//! Subscription repository port (write side).
//!
//! # Design
//!
//! - **Append-only rows**: activation inserts; nothing is deleted
//! - **One active per user**: supersede and insert happen atomically
//! - **Conditional expiry**: every expire is scoped to `status = active AND
//!   end_at < now`, so the sweep and read-path self-healing can interleave

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::Subscription;
use async_trait::async_trait;

#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Mark every active row of the user expired, then insert `subscription`.
    ///
    /// Both steps commit together. Returns how many rows were superseded.
    async fn activate(&self, subscription: &Subscription) -> Result<u64, DomainError>;

    /// The user's active row, if any. No expiry check.
    async fn find_active(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError>;

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError>;

    /// All rows for a user, newest first.
    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError>;

    /// Expire one row if it is still active and lapsed at `now`.
    ///
    /// Returns whether this call performed the transition.
    async fn expire_if_lapsed(
        &self,
        id: &SubscriptionId,
        now: Timestamp,
    ) -> Result<bool, DomainError>;

    /// Expire every active row with `end_at < now`. Returns the rows changed.
    async fn expire_lapsed(&self, now: Timestamp) -> Result<Vec<Subscription>, DomainError>;

    /// Move an active row to failed.
    ///
    /// Returns whether the row was active.
    async fn mark_failed(&self, id: &SubscriptionId, now: Timestamp) -> Result<bool, DomainError>;
}
