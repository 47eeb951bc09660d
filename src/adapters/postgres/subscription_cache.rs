//! PostgreSQL implementation of SubscriptionCache.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::domain::subscription::CachedSubscription;
use crate::ports::SubscriptionCache;

use super::{corrupt, db_error};

/// Mirror stored in `user_subscription_cache`, one row per user.
pub struct PostgresSubscriptionCache {
    pool: PgPool,
}

impl PostgresSubscriptionCache {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct CacheRow {
    status: String,
    start_at: DateTime<Utc>,
    end_at: DateTime<Utc>,
}

#[async_trait]
impl SubscriptionCache for PostgresSubscriptionCache {
    async fn set_active(
        &self,
        user_id: &UserId,
        start_at: Timestamp,
        end_at: Timestamp,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO user_subscription_cache (user_id, status, start_at, end_at, updated_at)
            VALUES ($1, 'active', $2, $3, now())
            ON CONFLICT (user_id) DO UPDATE SET
                status = 'active',
                start_at = EXCLUDED.start_at,
                end_at = EXCLUDED.end_at,
                updated_at = now()
            WHERE user_subscription_cache.start_at <= EXCLUDED.start_at
            "#,
        )
        .bind(user_id.as_str())
        .bind(start_at.as_datetime())
        .bind(end_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mirror active subscription"))?;

        Ok(())
    }

    async fn set_expired_if_matches(
        &self,
        user_id: &UserId,
        end_at: Timestamp,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE user_subscription_cache SET status = 'expired', updated_at = now()
            WHERE user_id = $1 AND end_at = $2
            "#,
        )
        .bind(user_id.as_str())
        .bind(end_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mirror expired subscription"))?;

        Ok(())
    }

    async fn get(&self, user_id: &UserId) -> Result<Option<CachedSubscription>, DomainError> {
        let row: Option<CacheRow> = sqlx::query_as(
            "SELECT status, start_at, end_at FROM user_subscription_cache WHERE user_id = $1",
        )
        .bind(user_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to read subscription mirror"))?;

        row.map(|r| -> Result<CachedSubscription, DomainError> {
            Ok(CachedSubscription {
                status: r.status.parse().map_err(corrupt("status"))?,
                start_at: Timestamp::from_datetime(r.start_at),
                end_at: Timestamp::from_datetime(r.end_at),
            })
        })
        .transpose()
    }
}
