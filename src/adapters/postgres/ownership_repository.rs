//! PostgreSQL implementation of OwnershipRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainError, ErrorCode, ItemId, OwnershipId, PaymentId, Timestamp, UserId,
};
use crate::domain::ownership::OwnershipRecord;
use crate::ports::OwnershipRepository;

use super::{corrupt, db_error};

pub struct PostgresOwnershipRepository {
    pool: PgPool,
}

impl PostgresOwnershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OwnershipRow {
    id: Uuid,
    user_id: String,
    item_id: Uuid,
    purchased_at: DateTime<Utc>,
    payment_id: Option<Uuid>,
}

impl TryFrom<OwnershipRow> for OwnershipRecord {
    type Error = DomainError;

    fn try_from(row: OwnershipRow) -> Result<Self, Self::Error> {
        Ok(OwnershipRecord {
            id: OwnershipId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(corrupt("user_id"))?,
            item_id: ItemId::from_uuid(row.item_id),
            purchased_at: Timestamp::from_datetime(row.purchased_at),
            payment_id: row.payment_id.map(PaymentId::from_uuid),
        })
    }
}

#[async_trait]
impl OwnershipRepository for PostgresOwnershipRepository {
    async fn find_or_create(&self, record: &OwnershipRecord) -> Result<OwnershipRecord, DomainError> {
        let inserted: Option<OwnershipRow> = sqlx::query_as(
            r#"
            INSERT INTO ownerships (id, user_id, item_id, purchased_at, payment_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, item_id) DO NOTHING
            RETURNING id, user_id, item_id, purchased_at, payment_id
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(record.user_id.as_str())
        .bind(record.item_id.as_uuid())
        .bind(record.purchased_at.as_datetime())
        .bind(record.payment_id.map(|id| *id.as_uuid()))
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to insert ownership"))?;

        if let Some(row) = inserted {
            return OwnershipRecord::try_from(row);
        }

        // The pair already existed; return the original grant.
        self.find(&record.user_id, &record.item_id).await?.ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                "ownership conflict reported but no row found",
            )
        })
    }

    async fn exists(&self, user_id: &UserId, item_id: &ItemId) -> Result<bool, DomainError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM ownerships WHERE user_id = $1 AND item_id = $2)",
        )
        .bind(user_id.as_str())
        .bind(item_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to check ownership"))?;

        Ok(exists)
    }

    async fn find(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
    ) -> Result<Option<OwnershipRecord>, DomainError> {
        let row: Option<OwnershipRow> = sqlx::query_as(
            r#"
            SELECT id, user_id, item_id, purchased_at, payment_id
            FROM ownerships
            WHERE user_id = $1 AND item_id = $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(item_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find ownership"))?;

        row.map(OwnershipRecord::try_from).transpose()
    }
}
