//! Ownership domain - perpetual per-item grants.

use crate::domain::foundation::{ItemId, OwnershipId, PaymentId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Perpetual right of one user to one item.
///
/// The `(user_id, item_id)` pair is unique; re-granting returns the
/// existing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnershipRecord {
    pub id: OwnershipId,
    pub user_id: UserId,
    pub item_id: ItemId,
    pub purchased_at: Timestamp,
    /// Payment that bought the item, when granted through a purchase.
    pub payment_id: Option<PaymentId>,
}

impl OwnershipRecord {
    pub fn new(
        user_id: UserId,
        item_id: ItemId,
        payment_id: Option<PaymentId>,
        purchased_at: Timestamp,
    ) -> Self {
        Self {
            id: OwnershipId::new(),
            user_id,
            item_id,
            purchased_at,
            payment_id,
        }
    }

    pub fn covers(&self, user_id: &UserId, item_id: &ItemId) -> bool {
        &self.user_id == user_id && &self.item_id == item_id
    }
}
