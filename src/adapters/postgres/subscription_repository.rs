//! PostgreSQL implementation of SubscriptionRepository.
//!
//! The partial unique index `subscriptions_one_active_per_user` enforces one
//! active row per user. Activation supersedes and inserts in one transaction;
//! when two activations for the same user race, the loser hits the index and
//! is retried against the winner's committed row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, SubscriptionId, Timestamp, UserId};
use crate::domain::subscription::Subscription;
use crate::ports::SubscriptionRepository;

use super::{corrupt, db_error};

const ONE_ACTIVE_INDEX: &str = "subscriptions_one_active_per_user";
const MAX_ACTIVATION_ATTEMPTS: u32 = 3;

const SUBSCRIPTION_COLUMNS: &str = "id, user_id, plan, status, start_at, end_at, updated_at";

pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn try_activate(&self, subscription: &Subscription) -> Result<u64, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let superseded = sqlx::query(
            r#"
            UPDATE subscriptions SET status = 'expired', updated_at = $2
            WHERE user_id = $1 AND status = 'active'
            "#,
        )
        .bind(subscription.user_id.as_str())
        .bind(subscription.start_at.as_datetime())
        .execute(&mut *tx)
        .await?
        .rows_affected();

        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, user_id, plan, status, start_at, end_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.user_id.as_str())
        .bind(&subscription.plan)
        .bind(subscription.status.as_str())
        .bind(subscription.start_at.as_datetime())
        .bind(subscription.end_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(superseded)
    }
}

fn is_one_active_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.constraint() == Some(ONE_ACTIVE_INDEX))
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    user_id: String,
    plan: String,
    status: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            user_id: UserId::new(row.user_id).map_err(corrupt("user_id"))?,
            plan: row.plan,
            status: row.status.parse().map_err(corrupt("status"))?,
            start_at: Timestamp::from_datetime(row.start_at),
            end_at: Timestamp::from_datetime(row.end_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn activate(&self, subscription: &Subscription) -> Result<u64, DomainError> {
        let mut attempt = 1;
        loop {
            match self.try_activate(subscription).await {
                Ok(superseded) => return Ok(superseded),
                Err(e) if is_one_active_violation(&e) && attempt < MAX_ACTIVATION_ATTEMPTS => {
                    tracing::debug!(
                        user_id = %subscription.user_id,
                        attempt,
                        "Concurrent activation committed first; retrying supersede"
                    );
                    attempt += 1;
                }
                Err(e) => return Err(DomainError::database("Failed to activate subscription", e)),
            }
        }
    }

    async fn find_active(&self, user_id: &UserId) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1 AND status = 'active'",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find active subscription"))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE id = $1",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find subscription"))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_by_user(&self, user_id: &UserId) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            "SELECT {} FROM subscriptions WHERE user_id = $1 ORDER BY start_at DESC",
            SUBSCRIPTION_COLUMNS
        ))
        .bind(user_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list subscriptions"))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn expire_if_lapsed(
        &self,
        id: &SubscriptionId,
        now: Timestamp,
    ) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET status = 'expired', updated_at = $2
            WHERE id = $1 AND status = 'active' AND end_at < $2
            "#,
        )
        .bind(id.as_uuid())
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to expire subscription"))?;

        Ok(result.rows_affected() == 1)
    }

    async fn expire_lapsed(&self, now: Timestamp) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            r#"
            UPDATE subscriptions SET status = 'expired', updated_at = $1
            WHERE status = 'active' AND end_at < $1
            RETURNING {}
            "#,
            SUBSCRIPTION_COLUMNS
        ))
        .bind(now.as_datetime())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to expire lapsed subscriptions"))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn mark_failed(&self, id: &SubscriptionId, now: Timestamp) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET status = 'failed', updated_at = $2
            WHERE id = $1 AND status = 'active'
            "#,
        )
        .bind(id.as_uuid())
        .bind(now.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mark subscription failed"))?;

        Ok(result.rows_affected() == 1)
    }
}
