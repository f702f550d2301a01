//! EventPublisher port - Interface for publishing domain events.
//!
//! Payment handlers emit lifecycle events (capacity reserved, order created,
//! payment captured, payment failed) for analytics and notification
//! collaborators without knowing the transport behind this port.
//!
//! Emission is best-effort by contract: callers on the payment path log a
//! publish failure and carry on, so a broken event pipe can never roll back
//! a captured payment.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Port for publishing domain events.
///
/// Implementations must ensure:
/// - Events are delivered at-least-once (handlers may receive duplicates)
/// - `publish_all` preserves the order of the given events
/// - Errors are propagated to the caller, who decides whether they matter
///
/// # Example
///
/// ```ignore
/// let envelope = event.to_envelope().with_metadata(EventMetadata::for_user(user_id));
/// publisher.publish(envelope).await?;
/// ```
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a single event.
    ///
    /// The envelope carries the event id for deduplication, the event type
    /// for routing, and aggregate context for correlation.
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Publish multiple events in order.
    ///
    /// Adapters without transactional delivery publish sequentially and
    /// stop at the first failure.
    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError>;
}
