//! PostgreSQL outbox publisher.
//!
//! Writes each envelope to `entitlement_outbox`; a relay outside the engine
//! delivers pending rows and stamps `published_at`. The event id is the
//! primary key, so republishing the same envelope is a no-op.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, EventEnvelope};
use crate::ports::EventPublisher;

use super::db_error;

pub struct PostgresOutboxPublisher {
    pool: PgPool,
}

impl PostgresOutboxPublisher {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventPublisher for PostgresOutboxPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO entitlement_outbox (
                event_id, event_type, schema_version, aggregate_id, aggregate_type,
                occurred_at, payload
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (event_id) DO NOTHING
            "#,
        )
        .bind(event.event_id.as_str())
        .bind(&event.event_type)
        .bind(event.schema_version as i32)
        .bind(&event.aggregate_id)
        .bind(&event.aggregate_type)
        .bind(event.occurred_at.as_datetime())
        .bind(&event.payload)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to write outbox event"))?;

        tracing::debug!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            "Event written to outbox"
        );
        Ok(())
    }
}
