//! In-memory order repository with escrow compare-and-set.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::escrow::Order;
use crate::domain::foundation::{DomainError, OrderId};
use crate::ports::{EscrowChange, OrderRepository};

#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, order: Order) {
        self.orders.write().await.insert(order.id, order);
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError> {
        Ok(self.orders.read().await.get(id).cloned())
    }

    async fn compare_and_set_escrow(&self, change: &EscrowChange) -> Result<bool, DomainError> {
        let mut orders = self.orders.write().await;
        let Some(order) = orders.get_mut(&change.order_id) else {
            return Ok(false);
        };
        if order.escrow_status != Some(change.expected) {
            return Ok(false);
        }

        order.escrow_status = Some(change.target);
        if let Some(settlement) = change.settlement {
            order.settlement = Some(settlement);
        }
        if let Some(payment_status) = change.payment_status {
            order.payment_status = payment_status;
        }
        Ok(true)
    }
}
