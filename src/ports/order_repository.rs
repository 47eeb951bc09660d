//! Order repository port for escrow settlement.

use crate::domain::escrow::{EscrowStatus, Order, OrderPaymentStatus, Settlement};
use crate::domain::foundation::{DomainError, OrderId};
use async_trait::async_trait;

/// A compare-and-set on an order's escrow status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EscrowChange {
    pub order_id: OrderId,
    /// Status the caller computed the change from.
    pub expected: EscrowStatus,
    pub target: EscrowStatus,
    /// Written on release only.
    pub settlement: Option<Settlement>,
    /// Written on refund only.
    pub payment_status: Option<OrderPaymentStatus>,
}

impl EscrowChange {
    /// Builds the change that takes `order` from `expected` to its current state.
    pub fn from_order(order: &Order, expected: EscrowStatus) -> Option<Self> {
        let target = order.escrow_status?;
        Some(Self {
            order_id: order.id,
            expected,
            target,
            settlement: order.settlement.filter(|_| target == EscrowStatus::Released),
            payment_status: (target == EscrowStatus::Refunded).then_some(order.payment_status),
        })
    }
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError>;

    /// Apply `change` only if the stored escrow status equals `change.expected`.
    ///
    /// Returns whether the row was updated.
    async fn compare_and_set_escrow(&self, change: &EscrowChange) -> Result<bool, DomainError>;
}
