//! Attendance ledger port (read side).
//!
//! The attendee set is the single source of truth for who is going. The
//! public going count is recomputed from it on every call; no separate
//! counter exists to drift under partial failures. Writes happen only
//! inside the order store's success commit.

use async_trait::async_trait;

use crate::domain::foundation::{EventId, UserId};
use crate::domain::payments::{Attendee, PaymentError};

/// Reader port over the attendee/fulfillment set.
#[async_trait]
pub trait AttendanceLedger: Send + Sync {
    /// Total seats taken by paid attendees of an event.
    ///
    /// Capacity checks compare this against the event's maximum.
    async fn going_count(&self, event_id: &EventId) -> Result<u32, PaymentError>;

    /// One user's fulfillment record for an event, if any.
    async fn find(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Option<Attendee>, PaymentError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn attendance_ledger_is_object_safe() {
        fn _accepts_dyn(_ledger: &dyn AttendanceLedger) {}
    }
}
