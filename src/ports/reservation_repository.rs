//! Capacity reservation repository port.
//!
//! # Design
//!
//! - **Upsert by (event, user)**: requesting a hold while an unconsumed one
//!   exists supersedes it in place with a fresh key and TTL, backed by a
//!   partial unique index instead of get-or-create sugar.
//! - **Never deleted**: consumed rows are immutable history; expired
//!   unconsumed rows simply stop validating.

use async_trait::async_trait;

use crate::domain::foundation::{EventId, ReservationKey, UserId};
use crate::domain::payments::{CapacityReservation, PaymentError};

/// Repository port for CapacityReservation persistence.
#[async_trait]
pub trait ReservationRepository: Send + Sync {
    /// Insert a fresh hold, replacing the user's live unconsumed hold for
    /// the event if one exists.
    ///
    /// # Errors
    ///
    /// - `Infrastructure` on persistence failure
    async fn upsert_active(&self, reservation: &CapacityReservation) -> Result<(), PaymentError>;

    /// Look a reservation up by its opaque key.
    ///
    /// Returns `None` for unknown keys. Expiry and consumption checks are
    /// the caller's job; this is a plain lookup.
    async fn find_by_key(
        &self,
        key: &ReservationKey,
    ) -> Result<Option<CapacityReservation>, PaymentError>;

    /// The user's live unconsumed hold for an event, if any.
    ///
    /// Used to report an existing hold back instead of stacking new ones.
    async fn find_unconsumed_for(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Option<CapacityReservation>, PaymentError>;
}
