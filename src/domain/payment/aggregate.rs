//! Payment aggregate.
//!
//! One row per external gateway order. The payment row is the single
//! source of truth for whether money was received.

use crate::domain::foundation::{
    Currency, Money, PaymentId, StateMachine, Timestamp, UserId, ValidationError,
};
use serde::{Deserialize, Serialize};

use super::{GrantStatus, PaymentPurpose, PaymentStatus};

/// Payment aggregate.
///
/// # Invariants
///
/// - `external_order_id` is unique across all payments
/// - `external_payment_id` and `signature` are set iff status is `Captured`
/// - Status changes at most once after creation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub id: PaymentId,
    pub user_id: UserId,
    pub external_order_id: String,
    pub external_payment_id: Option<String>,
    pub signature: Option<String>,
    pub amount: Money,
    pub currency: Currency,
    pub status: PaymentStatus,
    pub purpose: PaymentPurpose,
    pub grant_status: GrantStatus,
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Payment {
    /// Creates a payment for a freshly opened gateway order.
    pub fn open(
        id: PaymentId,
        user_id: UserId,
        external_order_id: impl Into<String>,
        amount: Money,
        currency: Currency,
        purpose: PaymentPurpose,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            user_id,
            external_order_id: external_order_id.into(),
            external_payment_id: None,
            signature: None,
            amount,
            currency,
            status: PaymentStatus::Created,
            purpose,
            grant_status: GrantStatus::Pending,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_captured(&self) -> bool {
        self.status == PaymentStatus::Captured
    }

    /// Applies a verified capture.
    pub fn capture(
        &mut self,
        external_payment_id: impl Into<String>,
        signature: impl Into<String>,
        now: Timestamp,
    ) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(PaymentStatus::Captured)?;
        self.external_payment_id = Some(external_payment_id.into());
        self.signature = Some(signature.into());
        self.updated_at = now;
        Ok(())
    }

    /// Records a failed attempt.
    pub fn fail(&mut self, reason: impl Into<String>, now: Timestamp) -> Result<(), ValidationError> {
        self.status = self.status.transition_to(PaymentStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        self.updated_at = now;
        Ok(())
    }

    /// True when money was received but no entitlement followed.
    ///
    /// A `pending` grant counts once it has been left untouched since
    /// before `stalled_before`; younger rows may still have a grant in flight.
    pub fn needs_reconciliation(&self, stalled_before: &Timestamp) -> bool {
        if !self.is_captured() {
            return false;
        }
        match self.grant_status {
            GrantStatus::Failed => true,
            GrantStatus::Pending => self.updated_at.is_before(stalled_before),
            GrantStatus::Granted => false,
        }
    }
}
