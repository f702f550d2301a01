//! Attendee fulfillment records.
//!
//! A customer is not considered attending until this record links them to
//! the order that paid for their seats. Records are upserted by
//! (event, user); the authoritative "going" count is always recomputed from
//! this set and never kept as a separate counter.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EventId, OrderId, Timestamp, UserId};

/// One user's paid attendance at one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub event_id: EventId,

    pub user_id: UserId,

    /// The order that paid for these seats.
    pub order_id: OrderId,

    /// Seats covered by the linked order.
    pub seats: u32,

    /// Whether payment has been captured. Always true for records created
    /// by the finalize path.
    pub paid: bool,

    /// Ticket money paid for the seats, excluding the platform fee.
    pub price_paid: Decimal,

    /// Platform fee charged on top of `price_paid`.
    pub platform_fee: Decimal,

    pub created_at: Timestamp,

    pub updated_at: Timestamp,
}

impl Attendee {
    /// Fulfillment record written by a successful payment.
    pub fn fulfilled(
        event_id: EventId,
        user_id: UserId,
        order_id: OrderId,
        seats: u32,
        price_paid: Decimal,
        platform_fee: Decimal,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            event_id,
            user_id,
            order_id,
            seats,
            paid: true,
            price_paid,
            platform_fee,
            created_at: now,
            updated_at: now,
        }
    }
}
