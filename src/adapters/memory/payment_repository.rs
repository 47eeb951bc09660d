//! In-memory payment repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, PaymentId, Timestamp};
use crate::domain::payment::{GrantStatus, Payment, PaymentStatus};
use crate::ports::{CaptureOutcome, PaymentRepository};

/// Payments keyed by external order id. Each conditional update holds the
/// write lock across check and write, mirroring a guarded `UPDATE`.
#[derive(Default)]
pub struct InMemoryPaymentRepository {
    payments: RwLock<HashMap<String, Payment>>,
}

impl InMemoryPaymentRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.payments.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl PaymentRepository for InMemoryPaymentRepository {
    async fn save(&self, payment: &Payment) -> Result<(), DomainError> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&payment.external_order_id) {
            return Err(DomainError::new(
                ErrorCode::DuplicateExternalOrder,
                format!("external order {} already recorded", payment.external_order_id),
            ));
        }
        payments.insert(payment.external_order_id.clone(), payment.clone());
        Ok(())
    }

    async fn find_by_external_order_id(
        &self,
        external_order_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        Ok(self.payments.read().await.get(external_order_id).cloned())
    }

    async fn capture(
        &self,
        external_order_id: &str,
        external_payment_id: &str,
        signature: &str,
        now: Timestamp,
    ) -> Result<CaptureOutcome, DomainError> {
        let mut payments = self.payments.write().await;
        let payment = payments
            .get_mut(external_order_id)
            .ok_or_else(|| DomainError::not_found(ErrorCode::PaymentNotFound, external_order_id))?;

        match payment.status {
            PaymentStatus::Captured => Ok(CaptureOutcome::AlreadyCaptured(payment.clone())),
            PaymentStatus::Failed => Err(DomainError::invalid_transition(
                "payment",
                payment.status.as_str(),
                "capture",
            )),
            PaymentStatus::Created => {
                payment.capture(external_payment_id, signature, now)?;
                Ok(CaptureOutcome::Captured(payment.clone()))
            }
        }
    }

    async fn mark_failed(
        &self,
        external_order_id: &str,
        reason: &str,
        now: Timestamp,
    ) -> Result<Payment, DomainError> {
        let mut payments = self.payments.write().await;
        let payment = payments
            .get_mut(external_order_id)
            .ok_or_else(|| DomainError::not_found(ErrorCode::PaymentNotFound, external_order_id))?;

        if payment.status != PaymentStatus::Created {
            return Err(DomainError::invalid_transition(
                "payment",
                payment.status.as_str(),
                "mark failed",
            ));
        }
        payment.fail(reason, now)?;
        Ok(payment.clone())
    }

    async fn record_grant(
        &self,
        id: &PaymentId,
        status: GrantStatus,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let mut payments = self.payments.write().await;
        let payment = payments
            .values_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| DomainError::not_found(ErrorCode::PaymentNotFound, id))?;
        payment.grant_status = status;
        payment.updated_at = now;
        Ok(())
    }

    async fn list_pending_reconciliation(
        &self,
        stalled_before: Timestamp,
    ) -> Result<Vec<Payment>, DomainError> {
        let mut pending: Vec<Payment> = self
            .payments
            .read()
            .await
            .values()
            .filter(|p| p.needs_reconciliation(&stalled_before))
            .cloned()
            .collect();
        pending.sort_by_key(|p| *p.created_at.as_datetime());
        Ok(pending)
    }
}
