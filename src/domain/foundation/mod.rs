//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, error types, and event
//! infrastructure that form the vocabulary of the Gatherpay domain.

mod errors;
mod events;
mod identity;
mod ids;
mod money;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{
    DomainEvent, DomainEventId, EventEnvelope, EventMetadata, SerializableDomainEvent,
};
pub use identity::{CallerIdentity, IdentityRole};
pub use ids::{EventId, LedgerEntryId, OrderId, ReservationKey, UserId, WebhookId};
pub use money::{format_amount, parse_amount, round_half_up};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
