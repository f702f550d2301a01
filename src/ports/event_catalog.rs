//! Event catalog port for ticketed event lookups.
//!
//! The payment flow consumes a narrow slice of the event domain: enough to
//! price an order, label it for the gateway, and bound capacity checks.
//! Whatever owns the full event lifecycle stays behind this interface.
//!
//! # Design
//!
//! - **Read-only**: payments never mutate event state
//! - **Narrow view**: only the fields order creation and capacity checks need
//! - **Option for absence**: a missing event is a lookup miss, not an error

use crate::domain::foundation::EventId;
use crate::domain::payments::PaymentError;
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Port for reading ticketed event listings.
#[async_trait]
pub trait EventCatalog: Send + Sync {
    /// Look up the listing for an event.
    ///
    /// Returns `None` when no such event exists.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Infrastructure` on lookup failure.
    async fn find_listing(&self, event_id: &EventId) -> Result<Option<EventListing>, PaymentError>;
}

/// The slice of an event the payment flow needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventListing {
    /// Event identifier.
    pub id: EventId,

    /// Event title, used as the gateway `productinfo` label.
    pub title: String,

    /// Whether attending requires payment.
    pub is_paid: bool,

    /// Price per seat.
    pub ticket_price: Decimal,

    /// Maximum seats across all attendees.
    pub max_capacity: u32,
}

impl EventListing {
    /// Seats still available given the current going count.
    ///
    /// Saturates at zero when the ledger already meets or exceeds capacity.
    pub fn remaining_capacity(&self, going_count: u32) -> u32 {
        self.max_capacity.saturating_sub(going_count)
    }

    /// Whether `requested` seats fit within the remaining capacity.
    pub fn can_accommodate(&self, going_count: u32, requested: u32) -> bool {
        requested <= self.remaining_capacity(going_count)
    }
}
