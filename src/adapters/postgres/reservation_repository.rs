//! PostgreSQL implementation of ReservationRepository.
//!
//! The one-live-hold rule rides on the partial unique index
//! `uq_capacity_reservations_active` on (event_id, user_id) where not
//! consumed; `upsert_active` targets it with `ON CONFLICT` so a repeat
//! request supersedes the previous hold in place.

use crate::domain::foundation::{EventId, ReservationKey, Timestamp, UserId};
use crate::domain::payments::{CapacityReservation, PaymentError};
use crate::ports::ReservationRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the ReservationRepository port.
pub struct PostgresReservationRepository {
    pool: PgPool,
}

impl PostgresReservationRepository {
    /// Creates a new PostgresReservationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a capacity reservation.
#[derive(Debug, sqlx::FromRow)]
struct ReservationRow {
    key: String,
    event_id: Uuid,
    user_id: Uuid,
    seats_reserved: i32,
    consumed: bool,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl TryFrom<ReservationRow> for CapacityReservation {
    type Error = PaymentError;

    fn try_from(row: ReservationRow) -> Result<Self, Self::Error> {
        Ok(CapacityReservation {
            key: ReservationKey::new(row.key).map_err(|e| {
                PaymentError::infrastructure(format!("Corrupt reservation key: {}", e))
            })?,
            event_id: EventId::from_uuid(row.event_id),
            user_id: UserId::from_uuid(row.user_id),
            seats_reserved: u32::try_from(row.seats_reserved).map_err(|_| {
                PaymentError::infrastructure(format!(
                    "Negative seat count in row: {}",
                    row.seats_reserved
                ))
            })?,
            consumed: row.consumed,
            created_at: Timestamp::from_datetime(row.created_at),
            expires_at: Timestamp::from_datetime(row.expires_at),
        })
    }
}

#[async_trait]
impl ReservationRepository for PostgresReservationRepository {
    async fn upsert_active(&self, reservation: &CapacityReservation) -> Result<(), PaymentError> {
        let seats = i32::try_from(reservation.seats_reserved).map_err(|_| {
            PaymentError::infrastructure(format!(
                "Seat count out of range: {}",
                reservation.seats_reserved
            ))
        })?;

        sqlx::query(
            r#"
            INSERT INTO capacity_reservations (
                key, event_id, user_id, seats_reserved, consumed, created_at, expires_at
            ) VALUES ($1, $2, $3, $4, FALSE, $5, $6)
            ON CONFLICT (event_id, user_id) WHERE NOT consumed DO UPDATE SET
                key = EXCLUDED.key,
                seats_reserved = EXCLUDED.seats_reserved,
                created_at = EXCLUDED.created_at,
                expires_at = EXCLUDED.expires_at
            "#,
        )
        .bind(reservation.key.as_str())
        .bind(reservation.event_id.as_uuid())
        .bind(reservation.user_id.as_uuid())
        .bind(seats)
        .bind(reservation.created_at.as_datetime())
        .bind(reservation.expires_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            PaymentError::infrastructure(format!("Failed to upsert reservation: {}", e))
        })?;

        Ok(())
    }

    async fn find_by_key(
        &self,
        key: &ReservationKey,
    ) -> Result<Option<CapacityReservation>, PaymentError> {
        let row: Option<ReservationRow> = sqlx::query_as(
            r#"
            SELECT key, event_id, user_id, seats_reserved, consumed, created_at, expires_at
            FROM capacity_reservations
            WHERE key = $1
            "#,
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            PaymentError::infrastructure(format!("Failed to find reservation: {}", e))
        })?;

        row.map(CapacityReservation::try_from).transpose()
    }

    async fn find_unconsumed_for(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Option<CapacityReservation>, PaymentError> {
        let row: Option<ReservationRow> = sqlx::query_as(
            r#"
            SELECT key, event_id, user_id, seats_reserved, consumed, created_at, expires_at
            FROM capacity_reservations
            WHERE event_id = $1 AND user_id = $2 AND NOT consumed
            "#,
        )
        .bind(event_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            PaymentError::infrastructure(format!("Failed to find reservation: {}", e))
        })?;

        row.map(CapacityReservation::try_from).transpose()
    }
}
