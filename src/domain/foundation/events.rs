//! Event infrastructure for best-effort domain event publishing.
//!
//! This module provides the core types for the analytics/notification fan-out:
//! - `DomainEventId` - Unique identifier for event instances
//! - `EventMetadata` - Tracing and correlation context
//! - `EventEnvelope` - Transport wrapper for domain events
//! - `DomainEvent` - Trait that all domain events implement
//!
//! Emission is fire-and-forget: publishers may fail and callers log and move
//! on, so there is no replay, upcasting, or schema-migration machinery here.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

use super::Timestamp;

// ============================================
// DomainEvent Trait
// ============================================

/// Trait that all domain events must implement.
///
/// Provides the contract for event identification and routing. For types
/// that also implement `Serialize`, `to_envelope()` is available via the
/// `SerializableDomainEvent` extension trait.
pub trait DomainEvent: Send + Sync {
    /// Returns the event type string (e.g., "payment.captured").
    /// Used for routing and filtering.
    fn event_type(&self) -> &'static str;

    /// Returns the ID of the aggregate that emitted this event.
    fn aggregate_id(&self) -> String;

    /// Returns the type of aggregate (e.g., "PaymentOrder").
    fn aggregate_type(&self) -> &'static str;

    /// Returns when the event occurred.
    fn occurred_at(&self) -> Timestamp;
}

/// Extension trait that provides `to_envelope()` for serializable domain
/// events.
///
/// Automatically implemented for any type that implements both `DomainEvent`
/// and `Serialize`, so event authors never write envelope plumbing.
pub trait SerializableDomainEvent: DomainEvent + Serialize {
    /// Wraps the event in a transport envelope with a fresh instance id.
    fn to_envelope(&self) -> EventEnvelope {
        EventEnvelope {
            event_id: DomainEventId::new(),
            event_type: self.event_type().to_string(),
            aggregate_id: self.aggregate_id(),
            aggregate_type: self.aggregate_type().to_string(),
            occurred_at: self.occurred_at(),
            payload: serde_json::to_value(self).unwrap_or(JsonValue::Null),
            metadata: EventMetadata::default(),
        }
    }
}

impl<T: DomainEvent + Serialize> SerializableDomainEvent for T {}

// ============================================
// DomainEventId
// ============================================

/// Unique identifier for a single published event instance.
///
/// Distinct from `EventId`, which identifies a ticketed event in the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DomainEventId(Uuid);

impl DomainEventId {
    /// Creates a new random event instance id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an id from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DomainEventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DomainEventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================
// EventMetadata
// ============================================

/// Correlation context attached to every envelope.
///
/// All fields are optional; producers fill what they know.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Groups events belonging to one logical operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// The event or command that caused this one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<String>,

    /// The user on whose behalf the event was emitted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl EventMetadata {
    /// Metadata carrying only the acting user.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }
}

// ============================================
// EventEnvelope
// ============================================

/// Transport wrapper around a serialized domain event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// Unique id of this event instance.
    pub event_id: DomainEventId,

    /// Routing key, e.g. "payment.captured".
    pub event_type: String,

    /// Id of the emitting aggregate.
    pub aggregate_id: String,

    /// Type of the emitting aggregate, e.g. "PaymentOrder".
    pub aggregate_type: String,

    /// When the underlying domain event occurred.
    pub occurred_at: Timestamp,

    /// The serialized event body.
    pub payload: JsonValue,

    /// Correlation context.
    pub metadata: EventMetadata,
}

impl EventEnvelope {
    /// Attaches metadata to the envelope.
    pub fn with_metadata(mut self, metadata: EventMetadata) -> Self {
        self.metadata = metadata;
        self
    }
}
