//! Payment repository port.
//!
//! Every mutation is conditional on the current status so concurrent
//! callback deliveries converge instead of double-applying.

use crate::domain::foundation::{DomainError, PaymentId, Timestamp};
use crate::domain::payment::{GrantStatus, Payment};
use async_trait::async_trait;

/// Result of a conditional capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// This call moved the row from created to captured.
    Captured(Payment),

    /// Another call got there first; the row is returned unchanged.
    AlreadyCaptured(Payment),
}

impl CaptureOutcome {
    pub fn payment(&self) -> &Payment {
        match self {
            CaptureOutcome::Captured(p) | CaptureOutcome::AlreadyCaptured(p) => p,
        }
    }

    pub fn into_payment(self) -> Payment {
        match self {
            CaptureOutcome::Captured(p) | CaptureOutcome::AlreadyCaptured(p) => p,
        }
    }
}

#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Insert a new payment.
    ///
    /// # Errors
    ///
    /// - `DuplicateExternalOrder` if the external order id already exists
    /// - `DatabaseError` on persistence failure
    async fn save(&self, payment: &Payment) -> Result<(), DomainError>;

    async fn find_by_external_order_id(
        &self,
        external_order_id: &str,
    ) -> Result<Option<Payment>, DomainError>;

    /// Move `created -> captured`, guarded by the current status.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` if no row has this external order id
    /// - `InvalidStateTransition` if the row is `failed`
    async fn capture(
        &self,
        external_order_id: &str,
        external_payment_id: &str,
        signature: &str,
        now: Timestamp,
    ) -> Result<CaptureOutcome, DomainError>;

    /// Move `created -> failed`, guarded by the current status.
    ///
    /// # Errors
    ///
    /// - `PaymentNotFound` if no row has this external order id
    /// - `InvalidStateTransition` if the row is not `created`
    async fn mark_failed(
        &self,
        external_order_id: &str,
        reason: &str,
        now: Timestamp,
    ) -> Result<Payment, DomainError>;

    /// Record the outcome of the post-capture grant.
    async fn record_grant(
        &self,
        id: &PaymentId,
        status: GrantStatus,
        now: Timestamp,
    ) -> Result<(), DomainError>;

    /// Captured payments whose grant failed, or is still pending and was
    /// last touched before `stalled_before`. Oldest first.
    async fn list_pending_reconciliation(
        &self,
        stalled_before: Timestamp,
    ) -> Result<Vec<Payment>, DomainError>;
}
