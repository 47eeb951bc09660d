//! OwnershipGrantor - idempotent perpetual grants for single-item purchases.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::foundation::{ItemId, PaymentId, Timestamp, UserId};
use crate::domain::ownership::OwnershipRecord;
use crate::ports::OwnershipRepository;

use super::EngineError;

pub struct OwnershipGrantor {
    ownership: Arc<dyn OwnershipRepository>,
}

impl OwnershipGrantor {
    pub fn new(ownership: Arc<dyn OwnershipRepository>) -> Self {
        Self { ownership }
    }

    /// Grants `item_id` to `user_id`. Repeated grants return the existing record.
    pub async fn grant(
        &self,
        user_id: &UserId,
        item_id: &ItemId,
        payment_id: Option<PaymentId>,
    ) -> Result<OwnershipRecord, EngineError> {
        let candidate =
            OwnershipRecord::new(user_id.clone(), *item_id, payment_id, Timestamp::now());
        let stored = self.ownership.find_or_create(&candidate).await?;

        if stored.id == candidate.id {
            info!(user_id = %user_id, item_id = %item_id, "Ownership granted");
        } else {
            debug!(user_id = %user_id, item_id = %item_id, "Ownership already held");
        }
        Ok(stored)
    }

    pub async fn exists(&self, user_id: &UserId, item_id: &ItemId) -> Result<bool, EngineError> {
        Ok(self.ownership.exists(user_id, item_id).await?)
    }
}
