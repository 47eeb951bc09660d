//! PostgreSQL implementation of PaymentRepository.
//!
//! Status changes are single guarded `UPDATE ... WHERE status = 'created'`
//! statements; when zero rows match, the row is re-read to tell a duplicate
//! capture apart from a conflict.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    Currency, DomainError, ErrorCode, ItemId, Money, PaymentId, Timestamp, UserId,
};
use crate::domain::payment::{GrantStatus, Payment, PaymentPurpose, PaymentStatus};
use crate::ports::{CaptureOutcome, PaymentRepository};

use super::{corrupt, db_error};

const PAYMENT_COLUMNS: &str = r#"
    id, user_id, external_order_id, external_payment_id, signature, amount_minor,
    currency, status, purpose, plan, item_id, grant_status, failure_reason,
    created_at, updated_at
"#;

pub struct PostgresPaymentRepository {
    pool: PgPool,
}

impl PostgresPaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch(&self, external_order_id: &str) -> Result<Option<Payment>, DomainError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payments WHERE external_order_id = $1",
            PAYMENT_COLUMNS
        ))
        .bind(external_order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find payment"))?;

        row.map(Payment::try_from).transpose()
    }
}

/// Database row representation of a payment.
#[derive(Debug, sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    user_id: String,
    external_order_id: String,
    external_payment_id: Option<String>,
    signature: Option<String>,
    amount_minor: i64,
    currency: String,
    status: String,
    purpose: String,
    plan: Option<String>,
    item_id: Option<Uuid>,
    grant_status: String,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = DomainError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let purpose = PaymentPurpose::from_parts(
            &row.purpose,
            row.plan.as_deref(),
            row.item_id.map(ItemId::from_uuid),
        )
        .map_err(corrupt("purpose"))?;

        Ok(Payment {
            id: PaymentId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(corrupt("user_id"))?,
            external_order_id: row.external_order_id,
            external_payment_id: row.external_payment_id,
            signature: row.signature,
            amount: Money::from_minor(row.amount_minor).map_err(corrupt("amount_minor"))?,
            currency: Currency::new(&row.currency).map_err(corrupt("currency"))?,
            status: row.status.parse().map_err(corrupt("status"))?,
            purpose,
            grant_status: row.grant_status.parse().map_err(corrupt("grant_status"))?,
            failure_reason: row.failure_reason,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl PaymentRepository for PostgresPaymentRepository {
    async fn save(&self, payment: &Payment) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, user_id, external_order_id, external_payment_id, signature, amount_minor,
                currency, status, purpose, plan, item_id, grant_status, failure_reason,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(payment.id.as_uuid())
        .bind(payment.user_id.as_str())
        .bind(&payment.external_order_id)
        .bind(&payment.external_payment_id)
        .bind(&payment.signature)
        .bind(payment.amount.minor_units())
        .bind(payment.currency.as_str())
        .bind(payment.status.as_str())
        .bind(payment.purpose.kind())
        .bind(payment.purpose.plan())
        .bind(payment.purpose.item_id().map(|id| *id.as_uuid()))
        .bind(payment.grant_status.as_str())
        .bind(&payment.failure_reason)
        .bind(payment.created_at.as_datetime())
        .bind(payment.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("payments_external_order_id_key") {
                    return DomainError::new(
                        ErrorCode::DuplicateExternalOrder,
                        format!("external order {} already recorded", payment.external_order_id),
                    );
                }
            }
            DomainError::database("Failed to save payment", e)
        })?;

        Ok(())
    }

    async fn find_by_external_order_id(
        &self,
        external_order_id: &str,
    ) -> Result<Option<Payment>, DomainError> {
        self.fetch(external_order_id).await
    }

    async fn capture(
        &self,
        external_order_id: &str,
        external_payment_id: &str,
        signature: &str,
        now: Timestamp,
    ) -> Result<CaptureOutcome, DomainError> {
        let updated: Option<PaymentRow> = sqlx::query_as(&format!(
            r#"
            UPDATE payments SET
                status = 'captured',
                external_payment_id = $2,
                signature = $3,
                updated_at = $4
            WHERE external_order_id = $1 AND status = 'created'
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(external_order_id)
        .bind(external_payment_id)
        .bind(signature)
        .bind(now.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to capture payment"))?;

        if let Some(row) = updated {
            return Ok(CaptureOutcome::Captured(Payment::try_from(row)?));
        }

        let existing = self
            .fetch(external_order_id)
            .await?
            .ok_or_else(|| DomainError::not_found(ErrorCode::PaymentNotFound, external_order_id))?;
        match existing.status {
            PaymentStatus::Captured => Ok(CaptureOutcome::AlreadyCaptured(existing)),
            status => Err(DomainError::invalid_transition(
                "payment",
                status.as_str(),
                "capture",
            )),
        }
    }

    async fn mark_failed(
        &self,
        external_order_id: &str,
        reason: &str,
        now: Timestamp,
    ) -> Result<Payment, DomainError> {
        let updated: Option<PaymentRow> = sqlx::query_as(&format!(
            r#"
            UPDATE payments SET
                status = 'failed',
                failure_reason = $2,
                updated_at = $3
            WHERE external_order_id = $1 AND status = 'created'
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(external_order_id)
        .bind(reason)
        .bind(now.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to mark payment failed"))?;

        if let Some(row) = updated {
            return Payment::try_from(row);
        }

        let existing = self
            .fetch(external_order_id)
            .await?
            .ok_or_else(|| DomainError::not_found(ErrorCode::PaymentNotFound, external_order_id))?;
        Err(DomainError::invalid_transition(
            "payment",
            existing.status.as_str(),
            "mark failed",
        ))
    }

    async fn record_grant(
        &self,
        id: &PaymentId,
        status: GrantStatus,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            "UPDATE payments SET grant_status = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to record grant status"))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::not_found(ErrorCode::PaymentNotFound, id));
        }
        Ok(())
    }

    async fn list_pending_reconciliation(
        &self,
        stalled_before: Timestamp,
    ) -> Result<Vec<Payment>, DomainError> {
        let rows: Vec<PaymentRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM payments
            WHERE status = 'captured'
              AND (grant_status = 'failed'
                   OR (grant_status = 'pending' AND updated_at < $1))
            ORDER BY created_at ASC
            "#,
            PAYMENT_COLUMNS
        ))
        .bind(stalled_before.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list payments pending reconciliation"))?;

        rows.into_iter().map(Payment::try_from).collect()
    }
}
