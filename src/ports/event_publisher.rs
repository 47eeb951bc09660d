//! Event publisher port for outbound grant notifications.
//!
//! Grants are committed before publishing; a publish failure never undoes
//! a grant. Callers log and move on.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing domain events.
///
/// Implementations must ensure:
/// - Events are delivered at-least-once (consumers may see duplicates)
/// - Errors are propagated to the caller
///
/// # Example
///
/// ```ignore
/// let event = EntitlementGranted::ItemPurchased { .. }.to_envelope()?;
/// publisher.publish(event).await?;
/// ```
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event.
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Publish several events in order, stopping at the first failure.
    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}
