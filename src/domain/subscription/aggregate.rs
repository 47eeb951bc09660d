//! Subscription aggregate.
//!
//! Each activation inserts a new row; older rows are superseded by being
//! marked expired, never deleted. At most one row per user is active.

use crate::domain::foundation::{StateMachine, SubscriptionId, Timestamp, UserId, ValidationError};
use serde::{Deserialize, Serialize};

use super::{Plan, SubscriptionStatus};

/// A time-boxed subscription entitlement.
///
/// # Invariants
///
/// - `start_at <= end_at`
/// - Only `Active` rows grant access, and only while `end_at >= now`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub plan: String,
    pub status: SubscriptionStatus,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Subscription {
    /// Builds a new active row running for the plan's duration from `now`.
    pub fn activate(user_id: UserId, plan: &Plan, now: Timestamp) -> Self {
        Self {
            id: SubscriptionId::new(),
            user_id,
            plan: plan.name.clone(),
            status: SubscriptionStatus::Active,
            start_at: now,
            end_at: now.add_months(plan.duration_months),
            updated_at: now,
        }
    }

    /// Active and not past its end date.
    pub fn is_live(&self, now: &Timestamp) -> bool {
        self.status == SubscriptionStatus::Active && !self.end_at.is_before(now)
    }

    /// Still marked active although the end date has passed.
    pub fn is_lapsed(&self, now: &Timestamp) -> bool {
        self.status == SubscriptionStatus::Active && self.end_at.is_before(now)
    }

    pub fn expire(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(SubscriptionStatus::Expired)?;
        self.updated_at = now;
        Ok(())
    }

    pub fn fail(&mut self, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(SubscriptionStatus::Failed)?;
        self.updated_at = now;
        Ok(())
    }
}

/// Denormalized subscription summary mirrored onto the user record.
///
/// A read-side projection only; access decisions always go back to the
/// subscription row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedSubscription {
    pub status: SubscriptionStatus,
    pub start_at: Timestamp,
    pub end_at: Timestamp,
}
