//! Payment domain events.
//!
//! Events emitted after payment lifecycle changes, consumed by the
//! analytics/notification collaborators. Emission is best-effort and must
//! never block or fail the payment transaction itself.
//!
//! # Event Naming Convention
//!
//! Events are named in past tense to indicate something that has already
//! happened: `PaymentCaptured` not `CapturePayment`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainEvent, EventId, OrderId, ReservationKey, Timestamp, UserId};

/// Events that occur during the payment order lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentEvent {
    /// Seats were provisionally held for a user.
    ///
    /// Trigger: reserve-capacity endpoint
    CapacityReserved {
        reservation_key: ReservationKey,
        event_id: EventId,
        user_id: UserId,
        seats: u32,
        expires_at: Timestamp,
        occurred_at: Timestamp,
    },

    /// A payment order was created and its redirect payload handed out.
    ///
    /// Trigger: create-order endpoint
    OrderCreated {
        order_id: OrderId,
        event_id: EventId,
        user_id: UserId,
        amount: Decimal,
        currency: String,
        occurred_at: Timestamp,
    },

    /// The gateway confirmed capture and the ticket was fulfilled.
    ///
    /// State transition: created/pending -> paid
    ///
    /// Trigger: authenticated success webhook
    PaymentCaptured {
        order_id: OrderId,
        event_id: EventId,
        user_id: UserId,
        seats: u32,
        amount: Decimal,
        platform_fee_amount: Decimal,
        occurred_at: Timestamp,
    },

    /// The gateway reported a failed payment attempt.
    ///
    /// State transition: created/pending -> failed
    ///
    /// Trigger: authenticated failure webhook
    PaymentFailed {
        order_id: OrderId,
        event_id: EventId,
        user_id: UserId,
        reason: String,
        occurred_at: Timestamp,
    },
}

impl PaymentEvent {
    /// Returns the user the event concerns, for envelope metadata.
    pub fn user_id(&self) -> &UserId {
        match self {
            PaymentEvent::CapacityReserved { user_id, .. }
            | PaymentEvent::OrderCreated { user_id, .. }
            | PaymentEvent::PaymentCaptured { user_id, .. }
            | PaymentEvent::PaymentFailed { user_id, .. } => user_id,
        }
    }

    /// Returns the ticketed event the payment concerns.
    pub fn ticketed_event_id(&self) -> &EventId {
        match self {
            PaymentEvent::CapacityReserved { event_id, .. }
            | PaymentEvent::OrderCreated { event_id, .. }
            | PaymentEvent::PaymentCaptured { event_id, .. }
            | PaymentEvent::PaymentFailed { event_id, .. } => event_id,
        }
    }
}

impl DomainEvent for PaymentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PaymentEvent::CapacityReserved { .. } => "payment.capacity_reserved",
            PaymentEvent::OrderCreated { .. } => "payment.order_created",
            PaymentEvent::PaymentCaptured { .. } => "payment.captured",
            PaymentEvent::PaymentFailed { .. } => "payment.failed",
        }
    }

    fn aggregate_id(&self) -> String {
        match self {
            PaymentEvent::CapacityReserved {
                reservation_key, ..
            } => reservation_key.to_string(),
            PaymentEvent::OrderCreated { order_id, .. }
            | PaymentEvent::PaymentCaptured { order_id, .. }
            | PaymentEvent::PaymentFailed { order_id, .. } => order_id.to_string(),
        }
    }

    fn aggregate_type(&self) -> &'static str {
        match self {
            PaymentEvent::CapacityReserved { .. } => "CapacityReservation",
            PaymentEvent::OrderCreated { .. }
            | PaymentEvent::PaymentCaptured { .. }
            | PaymentEvent::PaymentFailed { .. } => "PaymentOrder",
        }
    }

    fn occurred_at(&self) -> Timestamp {
        match self {
            PaymentEvent::CapacityReserved { occurred_at, .. }
            | PaymentEvent::OrderCreated { occurred_at, .. }
            | PaymentEvent::PaymentCaptured { occurred_at, .. }
            | PaymentEvent::PaymentFailed { occurred_at, .. } => *occurred_at,
        }
    }
}
