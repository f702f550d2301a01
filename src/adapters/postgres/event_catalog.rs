//! PostgreSQL implementation of EventCatalog.
//!
//! Reads the events table owned by the wider platform. Payments never
//! writes to it.

use crate::domain::foundation::EventId;
use crate::domain::payments::PaymentError;
use crate::ports::{EventCatalog, EventListing};
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

/// PostgreSQL implementation of the EventCatalog port.
pub struct PostgresEventCatalog {
    pool: PgPool,
}

impl PostgresEventCatalog {
    /// Creates a new PostgresEventCatalog with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of an event listing.
#[derive(Debug, sqlx::FromRow)]
struct ListingRow {
    id: Uuid,
    title: String,
    is_paid: bool,
    ticket_price: Decimal,
    max_capacity: i32,
}

impl TryFrom<ListingRow> for EventListing {
    type Error = PaymentError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        Ok(EventListing {
            id: EventId::from_uuid(row.id),
            title: row.title,
            is_paid: row.is_paid,
            ticket_price: row.ticket_price,
            max_capacity: u32::try_from(row.max_capacity).map_err(|_| {
                PaymentError::infrastructure(format!(
                    "Negative capacity in row: {}",
                    row.max_capacity
                ))
            })?,
        })
    }
}

#[async_trait]
impl EventCatalog for PostgresEventCatalog {
    async fn find_listing(
        &self,
        event_id: &EventId,
    ) -> Result<Option<EventListing>, PaymentError> {
        let row: Option<ListingRow> = sqlx::query_as(
            r#"
            SELECT id, title, is_paid, ticket_price, max_capacity
            FROM events
            WHERE id = $1
            "#,
        )
        .bind(event_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PaymentError::infrastructure(format!("Failed to find event: {}", e)))?;

        row.map(EventListing::try_from).transpose()
    }
}
