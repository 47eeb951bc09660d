//! In-memory event publisher for testing.
//!
//! Captures published envelopes for assertions and can be switched into a
//! failing mode to exercise publish-failure paths.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::EventPublisher;

/// In-memory event publisher.
///
/// # Example
///
/// ```ignore
/// let events = Arc::new(InMemoryEventPublisher::new());
/// ledger.verify_and_capture(cmd).await?;
/// assert_eq!(events.published_types().await, vec![ITEM_PURCHASED.to_string()]);
/// ```
#[derive(Default)]
pub struct InMemoryEventPublisher {
    published: RwLock<Vec<EventEnvelope>>,
    fail: AtomicBool,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    pub async fn published(&self) -> Vec<EventEnvelope> {
        self.published.read().await.clone()
    }

    /// Event types in publish order.
    pub async fn published_types(&self) -> Vec<String> {
        self.published
            .read()
            .await
            .iter()
            .map(|e| e.event_type.clone())
            .collect()
    }

    pub async fn events_for_aggregate(&self, aggregate_id: &str) -> Vec<EventEnvelope> {
        self.published
            .read()
            .await
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect()
    }

    /// While set, `publish` fails and records nothing.
    pub fn fail_publishes(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::InternalError,
                "event publisher unavailable",
            ));
        }
        self.published.write().await.push(event);
        Ok(())
    }
}
