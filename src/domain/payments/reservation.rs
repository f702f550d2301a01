//! Capacity reservation entity.
//!
//! A reservation is a time-bound, provisional hold on event seats created
//! before payment starts. It is consumed exactly once by a successful payment
//! and is never hard-deleted.
//!
//! # Design Decisions
//!
//! - **Advisory, not authoritative**: capacity is re-checked against the
//!   attendance ledger when the hold is issued and again at finalize time.
//!   There is no atomic seat counter.
//! - **Lazy expiry**: an expired, unconsumed reservation simply becomes
//!   unusable. No background sweeper is required for correctness.
//! - **One-way consumption**: `consume` is idempotent and irreversible.

use crate::domain::foundation::{
    EventId, ReservationKey, Timestamp, UserId, ValidationError,
};
use serde::{Deserialize, Serialize};

/// A provisional hold on seats for a paid event.
///
/// # Invariants
///
/// - `key` is globally unique and opaque to clients
/// - `seats_reserved >= 1`
/// - `consumed` only ever transitions false -> true
/// - At most one unconsumed reservation per (event, user) exists at a time;
///   requesting again supersedes the previous hold in place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityReservation {
    /// Opaque reservation token handed back to the client.
    pub key: ReservationKey,

    /// Event the seats are held for.
    pub event_id: EventId,

    /// User holding the seats.
    pub user_id: UserId,

    /// Number of seats held.
    pub seats_reserved: u32,

    /// Whether a successful payment has used this hold.
    pub consumed: bool,

    /// When the hold was issued.
    pub created_at: Timestamp,

    /// Absolute deadline after which the hold is unusable.
    pub expires_at: Timestamp,
}

impl CapacityReservation {
    /// Issue a fresh hold with a newly generated key.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `seats` is zero.
    pub fn create(
        event_id: EventId,
        user_id: UserId,
        seats: u32,
        ttl_minutes: i64,
    ) -> Result<Self, ValidationError> {
        if seats == 0 {
            return Err(ValidationError::out_of_range(
                "seats",
                1,
                i64::from(u32::MAX),
                0,
            ));
        }

        let now = Timestamp::now();
        Ok(Self {
            key: ReservationKey::generate(),
            event_id,
            user_id,
            seats_reserved: seats,
            consumed: false,
            created_at: now,
            expires_at: now.plus_minutes(ttl_minutes),
        })
    }

    /// Whether the hold's deadline has passed at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        !now.is_before(&self.expires_at)
    }

    /// Whether the hold can back a new payment order at `now`.
    ///
    /// A hold is usable only while unconsumed and before its deadline.
    pub fn is_usable(&self, now: Timestamp) -> bool {
        !self.consumed && !self.is_expired(now)
    }

    /// Whether this hold belongs to the given (event, user) pair.
    pub fn belongs_to(&self, event_id: &EventId, user_id: &UserId) -> bool {
        self.event_id == *event_id && self.user_id == *user_id
    }

    /// Mark the hold as used by a successful payment.
    ///
    /// Idempotent: consuming an already-consumed hold is a no-op. The
    /// transition is never reversed.
    pub fn consume(&mut self) {
        self.consumed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_reservation(ttl_minutes: i64) -> CapacityReservation {
        CapacityReservation::create(EventId::new(), UserId::new(), 2, ttl_minutes).unwrap()
    }

    // Construction tests

    #[test]
    fn create_issues_unconsumed_hold_with_fresh_key() {
        let reservation = make_reservation(15);

        assert!(!reservation.consumed);
        assert_eq!(reservation.seats_reserved, 2);
        assert!(!reservation.key.as_str().is_empty());
        assert!(reservation.created_at.is_before(&reservation.expires_at));
    }

    #[test]
    fn create_rejects_zero_seats() {
        let result = CapacityReservation::create(EventId::new(), UserId::new(), 0, 15);
        assert!(result.is_err());
    }

    #[test]
    fn consecutive_holds_get_distinct_keys() {
        let first = make_reservation(15);
        let second = make_reservation(15);
        assert_ne!(first.key, second.key);
    }

    // Expiry tests

    #[test]
    fn fresh_hold_is_usable() {
        let reservation = make_reservation(15);
        assert!(reservation.is_usable(Timestamp::now()));
    }

    #[test]
    fn hold_expires_after_deadline() {
        let reservation = make_reservation(15);
        let later = reservation.expires_at.plus_minutes(1);

        assert!(reservation.is_expired(later));
        assert!(!reservation.is_usable(later));
    }

    #[test]
    fn hold_is_expired_exactly_at_deadline() {
        let reservation = make_reservation(15);
        assert!(reservation.is_expired(reservation.expires_at));
    }

    // Consumption tests

    #[test]
    fn consume_is_one_way() {
        let mut reservation = make_reservation(15);
        reservation.consume();

        assert!(reservation.consumed);
        assert!(!reservation.is_usable(Timestamp::now()));
    }

    #[test]
    fn consume_is_idempotent() {
        let mut reservation = make_reservation(15);
        reservation.consume();
        reservation.consume();
        assert!(reservation.consumed);
    }

    // Ownership tests

    #[test]
    fn belongs_to_matches_event_and_user() {
        let reservation = make_reservation(15);

        assert!(reservation.belongs_to(&reservation.event_id, &reservation.user_id));
        assert!(!reservation.belongs_to(&EventId::new(), &reservation.user_id));
        assert!(!reservation.belongs_to(&reservation.event_id, &UserId::new()));
    }
}
