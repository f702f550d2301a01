//! PostgreSQL implementation of AttendanceLedger.
//!
//! The going count is an aggregate over the attendee rows on every call.
//! Nothing here writes; fulfillment rows are created only inside the order
//! store's success commit.

use crate::domain::foundation::{EventId, OrderId, Timestamp, UserId};
use crate::domain::payments::{Attendee, PaymentError};
use crate::ports::AttendanceLedger;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the AttendanceLedger port.
pub struct PostgresAttendanceLedger {
    pool: PgPool,
}

impl PostgresAttendanceLedger {
    /// Creates a new PostgresAttendanceLedger with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an attendee record.
#[derive(Debug, sqlx::FromRow)]
struct AttendeeRow {
    event_id: Uuid,
    user_id: Uuid,
    order_id: String,
    seats: i32,
    paid: bool,
    price_paid: Decimal,
    platform_fee: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AttendeeRow> for Attendee {
    type Error = PaymentError;

    fn try_from(row: AttendeeRow) -> Result<Self, Self::Error> {
        Ok(Attendee {
            event_id: EventId::from_uuid(row.event_id),
            user_id: UserId::from_uuid(row.user_id),
            order_id: OrderId::new(row.order_id)
                .map_err(|e| PaymentError::infrastructure(format!("Corrupt order id: {}", e)))?,
            seats: u32::try_from(row.seats).map_err(|_| {
                PaymentError::infrastructure(format!("Negative seat count in row: {}", row.seats))
            })?,
            paid: row.paid,
            price_paid: row.price_paid,
            platform_fee: row.platform_fee,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

#[async_trait]
impl AttendanceLedger for PostgresAttendanceLedger {
    async fn going_count(&self, event_id: &EventId) -> Result<u32, PaymentError> {
        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(seats), 0)
            FROM event_attendees
            WHERE event_id = $1 AND paid
            "#,
        )
        .bind(event_id.as_uuid())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            PaymentError::infrastructure(format!("Failed to count attendees: {}", e))
        })?;

        u32::try_from(total).map_err(|_| {
            PaymentError::infrastructure(format!("Attendee count out of range: {}", total))
        })
    }

    async fn find(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Option<Attendee>, PaymentError> {
        let row: Option<AttendeeRow> = sqlx::query_as(
            r#"
            SELECT event_id, user_id, order_id, seats, paid, price_paid,
                   platform_fee, created_at, updated_at
            FROM event_attendees
            WHERE event_id = $1 AND user_id = $2
            "#,
        )
        .bind(event_id.as_uuid())
        .bind(user_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PaymentError::infrastructure(format!("Failed to find attendee: {}", e)))?;

        row.map(Attendee::try_from).transpose()
    }
}
