//! ReserveCapacityHandler - Command handler for issuing seat holds on paid events.

use std::sync::Arc;

use crate::domain::foundation::{
    CallerIdentity, EventId, EventMetadata, SerializableDomainEvent, Timestamp,
};
use crate::domain::payments::{CapacityReservation, PaymentError, PaymentEvent};
use crate::ports::{AttendanceLedger, EventCatalog, EventPublisher, ReservationRepository};

/// Command to hold seats on a paid event ahead of payment.
#[derive(Debug, Clone)]
pub struct ReserveCapacityCommand {
    pub caller: CallerIdentity,
    pub event_id: EventId,
    pub seats: u32,
}

/// Result of a successful reservation.
#[derive(Debug, Clone)]
pub struct ReserveCapacityResult {
    pub reservation: CapacityReservation,
}

/// Handler for issuing capacity reservations.
///
/// A reservation is a provisional, time-bound hold: it bounds how many seats
/// an order may later claim, and it lapses on its own TTL if the user never
/// pays. Issuing a new hold replaces the caller's previous unconsumed hold
/// for the same event.
pub struct ReserveCapacityHandler {
    catalog: Arc<dyn EventCatalog>,
    reservations: Arc<dyn ReservationRepository>,
    ledger: Arc<dyn AttendanceLedger>,
    event_publisher: Arc<dyn EventPublisher>,
    ttl_minutes: i64,
}

impl ReserveCapacityHandler {
    pub fn new(
        catalog: Arc<dyn EventCatalog>,
        reservations: Arc<dyn ReservationRepository>,
        ledger: Arc<dyn AttendanceLedger>,
        event_publisher: Arc<dyn EventPublisher>,
        ttl_minutes: i64,
    ) -> Self {
        Self {
            catalog,
            reservations,
            ledger,
            event_publisher,
            ttl_minutes,
        }
    }

    pub async fn handle(
        &self,
        cmd: ReserveCapacityCommand,
    ) -> Result<ReserveCapacityResult, PaymentError> {
        // 1. The event must exist and require payment
        let listing = self
            .catalog
            .find_listing(&cmd.event_id)
            .await?
            .ok_or_else(|| PaymentError::event_not_found(cmd.event_id))?;

        if !listing.is_paid {
            return Err(PaymentError::event_not_payable(cmd.event_id));
        }

        // 2. Bound the hold by the authoritative going count
        let going = self.ledger.going_count(&cmd.event_id).await?;
        if !listing.can_accommodate(going, cmd.seats) {
            return Err(PaymentError::capacity_exceeded(
                cmd.event_id,
                cmd.seats,
                listing.remaining_capacity(going),
            ));
        }

        // 3. Issue a fresh hold, replacing any previous unconsumed one
        let reservation = CapacityReservation::create(
            cmd.event_id,
            cmd.caller.user_id,
            cmd.seats,
            self.ttl_minutes,
        )?;
        self.reservations.upsert_active(&reservation).await?;

        // 4. Emit the reservation event; a broken pipe never unwinds the hold
        let event = PaymentEvent::CapacityReserved {
            reservation_key: reservation.key.clone(),
            event_id: reservation.event_id,
            user_id: reservation.user_id,
            seats: reservation.seats_reserved,
            expires_at: reservation.expires_at,
            occurred_at: Timestamp::now(),
        };
        let envelope = event
            .to_envelope()
            .with_metadata(EventMetadata::for_user(cmd.caller.user_id.to_string()));
        if let Err(err) = self.event_publisher.publish(envelope).await {
            tracing::warn!(error = %err, "failed to publish capacity reserved event");
        }

        Ok(ReserveCapacityResult { reservation })
    }
}
