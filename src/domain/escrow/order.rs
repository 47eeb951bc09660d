//! Marketplace order aggregate and its escrow transitions.
//!
//! Transitions are computed here against an in-memory snapshot; the
//! repository persists them with a compare-and-set on the prior escrow
//! status so two admins cannot both release the same order.

use crate::domain::foundation::{
    CommissionRate, Money, OrderId, StateMachine, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};

use super::{DeliveryStatus, EscrowStatus, OrderPaymentStatus, OrderType};

/// Financial outcome of a release. Written once, never recomputed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub commission: Money,
    pub payout: Money,
    pub commission_rate_bps: u32,
    pub released_at: Timestamp,
}

/// Why an escrow transition was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscrowRejection {
    /// Direct orders carry no escrow.
    NotMarketplace,

    /// Escrow is not in a state that permits the transition.
    WrongState {
        current: EscrowStatus,
        target: EscrowStatus,
    },

    NotDelivered(DeliveryStatus),

    NotPaid(OrderPaymentStatus),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub total_amount: Money,
    pub order_type: OrderType,
    pub payment_status: OrderPaymentStatus,
    pub delivery_status: DeliveryStatus,
    /// Present only on marketplace orders.
    pub escrow_status: Option<EscrowStatus>,
    pub settlement: Option<Settlement>,
}

impl Order {
    /// A new marketplace order with funds held.
    pub fn marketplace(buyer_id: UserId, total_amount: Money) -> Self {
        Self {
            id: OrderId::new(),
            buyer_id,
            total_amount,
            order_type: OrderType::Marketplace,
            payment_status: OrderPaymentStatus::Pending,
            delivery_status: DeliveryStatus::Processing,
            escrow_status: Some(EscrowStatus::Held),
            settlement: None,
        }
    }

    /// A new direct order; no escrow.
    pub fn direct(buyer_id: UserId, total_amount: Money) -> Self {
        Self {
            order_type: OrderType::Direct,
            escrow_status: None,
            ..Self::marketplace(buyer_id, total_amount)
        }
    }

    fn escrow_transition(&self, target: EscrowStatus) -> Result<EscrowStatus, EscrowRejection> {
        let current = match (self.order_type, self.escrow_status) {
            (OrderType::Marketplace, Some(status)) => status,
            _ => return Err(EscrowRejection::NotMarketplace),
        };
        if !current.can_transition_to(&target) {
            return Err(EscrowRejection::WrongState { current, target });
        }
        Ok(current)
    }

    /// Releases held funds, computing commission at the current rate.
    ///
    /// Returns the escrow status the release was computed from.
    pub fn release(
        &mut self,
        rate: CommissionRate,
        now: Timestamp,
    ) -> Result<EscrowStatus, EscrowRejection> {
        let prior = self.escrow_transition(EscrowStatus::Released)?;
        if self.delivery_status != DeliveryStatus::Delivered {
            return Err(EscrowRejection::NotDelivered(self.delivery_status));
        }
        if self.payment_status != OrderPaymentStatus::Paid {
            return Err(EscrowRejection::NotPaid(self.payment_status));
        }

        let (commission, payout) = rate.split(self.total_amount);
        self.escrow_status = Some(EscrowStatus::Released);
        self.settlement = Some(Settlement {
            commission,
            payout,
            commission_rate_bps: rate.bps(),
            released_at: now,
        });
        Ok(prior)
    }

    pub fn dispute(&mut self) -> Result<EscrowStatus, EscrowRejection> {
        let prior = self.escrow_transition(EscrowStatus::Disputed)?;
        self.escrow_status = Some(EscrowStatus::Disputed);
        Ok(prior)
    }

    /// Returns funds to the buyer; also flips payment status to refunded.
    pub fn refund(&mut self) -> Result<EscrowStatus, EscrowRejection> {
        let prior = self.escrow_transition(EscrowStatus::Refunded)?;
        self.escrow_status = Some(EscrowStatus::Refunded);
        self.payment_status = OrderPaymentStatus::Refunded;
        Ok(prior)
    }
}
