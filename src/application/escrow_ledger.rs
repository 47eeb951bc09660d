//! EscrowLedger - admin-driven settlement of marketplace orders.
//!
//! Each transition is computed on a loaded snapshot and persisted with a
//! compare-and-set on the escrow status it was computed from. A lost race
//! surfaces as `StateConflict` carrying the state that won.

use std::sync::Arc;

use tracing::info;

use crate::domain::escrow::{EscrowRejection, EscrowStatus, Order, Settlement};
use crate::domain::foundation::{CommissionRate, OrderId, Timestamp};
use crate::ports::{EscrowChange, OrderRepository};

use super::EngineError;

pub struct EscrowLedger {
    orders: Arc<dyn OrderRepository>,
    commission_rate: CommissionRate,
}

impl EscrowLedger {
    pub fn new(orders: Arc<dyn OrderRepository>, commission_rate: CommissionRate) -> Self {
        Self {
            orders,
            commission_rate,
        }
    }

    /// Releases held funds to the seller net of commission.
    ///
    /// Commission uses the rate configured now, not at order creation. The
    /// resulting settlement is stored once and never recomputed.
    pub async fn release(&self, order_id: &OrderId) -> Result<Settlement, EngineError> {
        let rate = self.commission_rate;
        let order = self
            .transition(order_id, "release", |order| {
                order.release(rate, Timestamp::now())
            })
            .await?;

        let settlement = order.settlement.ok_or_else(|| {
            EngineError::infrastructure(format!("order {} released without settlement", order_id))
        })?;
        info!(
            order_id = %order_id,
            commission = %settlement.commission,
            payout = %settlement.payout,
            commission_rate_bps = settlement.commission_rate_bps,
            "Escrow released"
        );
        Ok(settlement)
    }

    /// Freezes held funds pending dispute resolution.
    pub async fn dispute(&self, order_id: &OrderId) -> Result<Order, EngineError> {
        let order = self.transition(order_id, "dispute", Order::dispute).await?;
        info!(order_id = %order_id, "Escrow disputed");
        Ok(order)
    }

    /// Returns held or disputed funds to the buyer.
    pub async fn refund(&self, order_id: &OrderId) -> Result<Order, EngineError> {
        let order = self.transition(order_id, "refund", Order::refund).await?;
        info!(order_id = %order_id, "Escrow refunded");
        Ok(order)
    }

    async fn transition<F>(
        &self,
        order_id: &OrderId,
        attempted: &'static str,
        apply: F,
    ) -> Result<Order, EngineError>
    where
        F: FnOnce(&mut Order) -> Result<EscrowStatus, EscrowRejection>,
    {
        let mut order = self
            .orders
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| EngineError::not_found("order", order_id))?;

        let prior = apply(&mut order).map_err(|r| rejection_error(order_id, attempted, r))?;
        let change = EscrowChange::from_order(&order, prior).ok_or_else(|| {
            EngineError::infrastructure(format!("order {} lost its escrow status", order_id))
        })?;

        if !self.orders.compare_and_set_escrow(&change).await? {
            let current = self
                .orders
                .find_by_id(order_id)
                .await?
                .and_then(|o| o.escrow_status)
                .map(|s| s.to_string())
                .unwrap_or_else(|| "unknown".to_string());
            return Err(EngineError::state_conflict("escrow", current, attempted));
        }
        Ok(order)
    }
}

fn rejection_error(order_id: &OrderId, attempted: &str, rejection: EscrowRejection) -> EngineError {
    match rejection {
        EscrowRejection::NotMarketplace => EngineError::validation(
            "order_type",
            format!("order {} is a direct order and carries no escrow", order_id),
        ),
        EscrowRejection::WrongState { current, .. } => {
            EngineError::state_conflict("escrow", current.to_string(), attempted)
        }
        EscrowRejection::NotDelivered(status) => EngineError::validation(
            "delivery_status",
            format!("order must be delivered before release, is {}", status),
        ),
        EscrowRejection::NotPaid(status) => EngineError::validation(
            "payment_status",
            format!("order must be paid before release, is {}", status),
        ),
    }
}
