//! "Grant happened" signals emitted after a successful entitlement grant.

use crate::domain::foundation::{
    EventEnvelope, ItemId, OwnershipId, PaymentId, SubscriptionId, Timestamp, UserId,
};
use serde::{Deserialize, Serialize};

pub const SUBSCRIPTION_ACTIVATED: &str = "entitlement.subscription_activated.v1";
pub const ITEM_PURCHASED: &str = "entitlement.item_purchased.v1";

/// Entitlement granted to a user. Consumed by notification fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "grant", rename_all = "snake_case")]
pub enum EntitlementGranted {
    SubscriptionActivated {
        user_id: UserId,
        subscription_id: SubscriptionId,
        plan: String,
        end_at: Timestamp,
        payment_id: Option<PaymentId>,
    },
    ItemPurchased {
        user_id: UserId,
        item_id: ItemId,
        ownership_id: OwnershipId,
        payment_id: Option<PaymentId>,
    },
}

impl EntitlementGranted {
    pub fn event_type(&self) -> &'static str {
        match self {
            EntitlementGranted::SubscriptionActivated { .. } => SUBSCRIPTION_ACTIVATED,
            EntitlementGranted::ItemPurchased { .. } => ITEM_PURCHASED,
        }
    }

    fn aggregate(&self) -> (String, &'static str) {
        match self {
            EntitlementGranted::SubscriptionActivated {
                subscription_id, ..
            } => (subscription_id.to_string(), "Subscription"),
            EntitlementGranted::ItemPurchased { ownership_id, .. } => {
                (ownership_id.to_string(), "Ownership")
            }
        }
    }

    /// Wraps the event for the publisher.
    pub fn to_envelope(&self) -> Result<EventEnvelope, serde_json::Error> {
        let payload = serde_json::to_value(self)?;
        let (aggregate_id, aggregate_type) = self.aggregate();
        Ok(EventEnvelope::new(
            self.event_type(),
            aggregate_id,
            aggregate_type,
            payload,
        ))
    }
}
