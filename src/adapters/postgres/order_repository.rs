//! PostgreSQL implementation of OrderRepository.
//!
//! Escrow transitions are one `UPDATE ... WHERE escrow_status = $expected`;
//! zero affected rows means another transition committed first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::escrow::{EscrowStatus, Order, Settlement};
use crate::domain::foundation::{DomainError, Money, OrderId, Timestamp, UserId};
use crate::ports::{EscrowChange, OrderRepository};

use super::{corrupt, db_error};

pub struct PostgresOrderRepository {
    pool: PgPool,
}

impl PostgresOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    buyer_id: String,
    total_amount_minor: i64,
    order_type: String,
    payment_status: String,
    delivery_status: String,
    escrow_status: Option<String>,
    commission_minor: Option<i64>,
    payout_minor: Option<i64>,
    commission_rate_bps: Option<i32>,
    released_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn settlement(&self) -> Result<Option<Settlement>, DomainError> {
        let (Some(commission), Some(payout), Some(bps), Some(released_at)) = (
            self.commission_minor,
            self.payout_minor,
            self.commission_rate_bps,
            self.released_at,
        ) else {
            return Ok(None);
        };

        Ok(Some(Settlement {
            commission: Money::from_minor(commission).map_err(corrupt("commission_minor"))?,
            payout: Money::from_minor(payout).map_err(corrupt("payout_minor"))?,
            commission_rate_bps: u32::try_from(bps).map_err(corrupt("commission_rate_bps"))?,
            released_at: Timestamp::from_datetime(released_at),
        }))
    }
}

impl TryFrom<OrderRow> for Order {
    type Error = DomainError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let settlement = row.settlement()?;
        let escrow_status: Option<EscrowStatus> = row
            .escrow_status
            .as_deref()
            .map(str::parse)
            .transpose()
            .map_err(corrupt("escrow_status"))?;

        Ok(Order {
            id: OrderId::from_uuid(row.id),
            buyer_id: UserId::new(row.buyer_id).map_err(corrupt("buyer_id"))?,
            total_amount: Money::from_minor(row.total_amount_minor)
                .map_err(corrupt("total_amount_minor"))?,
            order_type: row.order_type.parse().map_err(corrupt("order_type"))?,
            payment_status: row.payment_status.parse().map_err(corrupt("payment_status"))?,
            delivery_status: row.delivery_status.parse().map_err(corrupt("delivery_status"))?,
            escrow_status,
            settlement,
        })
    }
}

#[async_trait]
impl OrderRepository for PostgresOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        let row: Option<OrderRow> = sqlx::query_as(
            r#"
            SELECT id, buyer_id, total_amount_minor, order_type, payment_status,
                   delivery_status, escrow_status, commission_minor, payout_minor,
                   commission_rate_bps, released_at
            FROM orders
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to find order"))?;

        row.map(Order::try_from).transpose()
    }

    async fn compare_and_set_escrow(&self, change: &EscrowChange) -> Result<bool, DomainError> {
        let settlement = change.settlement;
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                escrow_status = $3,
                commission_minor = COALESCE($4, commission_minor),
                payout_minor = COALESCE($5, payout_minor),
                commission_rate_bps = COALESCE($6, commission_rate_bps),
                released_at = COALESCE($7, released_at),
                payment_status = COALESCE($8, payment_status)
            WHERE id = $1 AND escrow_status = $2
            "#,
        )
        .bind(change.order_id.as_uuid())
        .bind(change.expected.as_str())
        .bind(change.target.as_str())
        .bind(settlement.map(|s| s.commission.minor_units()))
        .bind(settlement.map(|s| s.payout.minor_units()))
        .bind(settlement.map(|s| s.commission_rate_bps as i32))
        .bind(settlement.map(|s| *s.released_at.as_datetime()))
        .bind(change.payment_status.map(|s| s.as_str()))
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to update escrow status"))?;

        Ok(result.rows_affected() == 1)
    }
}
