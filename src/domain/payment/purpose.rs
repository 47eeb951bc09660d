//! What a payment buys.

use crate::domain::foundation::{ItemId, ValidationError};
use serde::{Deserialize, Serialize};

/// Purpose-specific reference carried by a payment.
///
/// Encoded as a sum type so a subscription payment can never lack a plan
/// and an item purchase can never lack an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PaymentPurpose {
    Subscription { plan: String },
    ItemPurchase { item_id: ItemId },
}

impl PaymentPurpose {
    /// Builds a purpose from loosely-typed parts, as stored or received.
    pub fn from_parts(
        kind: &str,
        plan: Option<&str>,
        item_id: Option<ItemId>,
    ) -> Result<Self, ValidationError> {
        match kind {
            "subscription" => {
                let plan = plan
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| ValidationError::empty_field("plan"))?;
                Ok(PaymentPurpose::Subscription {
                    plan: plan.to_string(),
                })
            }
            "item_purchase" => {
                let item_id = item_id.ok_or_else(|| ValidationError::empty_field("item_id"))?;
                Ok(PaymentPurpose::ItemPurchase { item_id })
            }
            other => Err(ValidationError::invalid_format(
                "purpose",
                format!("unknown purpose '{}'", other),
            )),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            PaymentPurpose::Subscription { .. } => "subscription",
            PaymentPurpose::ItemPurchase { .. } => "item_purchase",
        }
    }

    pub fn plan(&self) -> Option<&str> {
        match self {
            PaymentPurpose::Subscription { plan } => Some(plan),
            PaymentPurpose::ItemPurchase { .. } => None,
        }
    }

    pub fn item_id(&self) -> Option<ItemId> {
        match self {
            PaymentPurpose::ItemPurchase { item_id } => Some(*item_id),
            PaymentPurpose::Subscription { .. } => None,
        }
    }
}
