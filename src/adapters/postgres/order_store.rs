//! PostgreSQL implementation of PaymentOrderStore.
//!
//! Persists PaymentOrder aggregates and applies the two atomic finalize
//! write-sets. Concurrency guards live here:
//!
//! - order creation serializes per (event, user) with a transaction-scoped
//!   advisory lock before the active-slot check, because "unexpired" cannot
//!   be expressed in a partial unique index predicate
//! - finalization re-reads the order's status under `FOR UPDATE`, locks any
//!   final sibling before deciding, and still catches a violation of the
//!   partial unique index `uq_payment_orders_final_slot` as the backstop

use crate::domain::foundation::{
    EventId, LedgerEntryId, OrderId, ReservationKey, Timestamp, UserId,
};
use crate::domain::payments::{
    Attendee, FinancialSnapshot, OrderStatus, PaymentError, PaymentOrder, PaymentTransaction,
    TransactionKind, TransactionStatus,
};
use crate::ports::{CommitOutcome, FailureCommit, PaymentOrderStore, SuccessCommit};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value as JsonValue;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Name of the partial unique index guarding the one-final-order invariant.
const FINAL_SLOT_INDEX: &str = "uq_payment_orders_final_slot";

const ORDER_COLUMNS: &str = r#"
    order_id, event_id, user_id, reservation_key, amount, currency, status,
    provider, provider_payment_id, transaction_id, is_final, failure_reason,
    gateway_response, base_price_per_seat, seats, platform_fee_percentage,
    platform_fee_amount, host_earning_per_seat, refund_id, refund_amount,
    refunded_at, created_at, updated_at, expires_at
"#;

/// PostgreSQL implementation of the PaymentOrderStore port.
pub struct PostgresOrderStore {
    pool: PgPool,
}

impl PostgresOrderStore {
    /// Creates a new PostgresOrderStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Re-reads the order's persisted status under a row lock.
    ///
    /// Returns `None` if the row does not exist.
    async fn lock_status(
        tx: &mut Transaction<'_, Postgres>,
        order_id: &OrderId,
    ) -> Result<Option<OrderStatus>, PaymentError> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM payment_orders WHERE order_id = $1 FOR UPDATE")
                .bind(order_id.as_str())
                .fetch_optional(&mut **tx)
                .await
                .map_err(|e| {
                    PaymentError::infrastructure(format!("Failed to lock order: {}", e))
                })?;

        status.map(|s| parse_order_status(&s)).transpose()
    }

    /// Writes every mutable aggregate field back to the order row.
    ///
    /// A violation of the final-slot index is reported as `DuplicateFinal`
    /// so the caller can roll back cleanly.
    async fn persist_settled(
        tx: &mut Transaction<'_, Postgres>,
        order: &PaymentOrder,
    ) -> Result<Option<CommitOutcome>, PaymentError> {
        let financials = order.financials.as_ref();
        let seats = financials.map(|f| seats_to_db(f.seats)).transpose()?;

        let result = sqlx::query(
            r#"
            UPDATE payment_orders SET
                status = $2,
                provider_payment_id = $3,
                transaction_id = $4,
                is_final = $5,
                failure_reason = $6,
                gateway_response = $7,
                base_price_per_seat = $8,
                seats = $9,
                platform_fee_percentage = $10,
                platform_fee_amount = $11,
                host_earning_per_seat = $12,
                updated_at = $13
            WHERE order_id = $1
            "#,
        )
        .bind(order.order_id.as_str())
        .bind(order.status.as_str())
        .bind(&order.provider_payment_id)
        .bind(&order.transaction_id)
        .bind(order.is_final)
        .bind(&order.failure_reason)
        .bind(&order.gateway_response)
        .bind(financials.map(|f| f.base_price_per_seat))
        .bind(seats)
        .bind(financials.map(|f| f.platform_fee_percentage))
        .bind(financials.map(|f| f.platform_fee_amount))
        .bind(financials.map(|f| f.host_earning_per_seat))
        .bind(order.updated_at.as_datetime())
        .execute(&mut **tx)
        .await;

        match result {
            Ok(_) => Ok(None),
            Err(e) => {
                if is_constraint_violation(&e, FINAL_SLOT_INDEX) {
                    return Ok(Some(CommitOutcome::DuplicateFinal));
                }
                Err(PaymentError::infrastructure(format!(
                    "Failed to persist settled order: {}",
                    e
                )))
            }
        }
    }

    /// Appends one immutable ledger row inside the transaction.
    async fn append_transaction(
        tx: &mut Transaction<'_, Postgres>,
        row: &PaymentTransaction,
    ) -> Result<(), PaymentError> {
        sqlx::query(
            r#"
            INSERT INTO payment_transactions (
                id, order_id, kind, amount, status, provider_transaction_id, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(row.id.as_uuid())
        .bind(row.order_id.as_str())
        .bind(row.kind.as_str())
        .bind(row.amount)
        .bind(row.status.as_str())
        .bind(&row.provider_transaction_id)
        .bind(row.created_at.as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            PaymentError::infrastructure(format!("Failed to append ledger row: {}", e))
        })?;

        Ok(())
    }
}

/// Database row representation of a payment order.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    order_id: String,
    event_id: Uuid,
    user_id: Uuid,
    reservation_key: String,
    amount: Decimal,
    currency: String,
    status: String,
    provider: String,
    provider_payment_id: Option<String>,
    transaction_id: Option<String>,
    is_final: bool,
    failure_reason: Option<String>,
    gateway_response: Option<JsonValue>,
    base_price_per_seat: Option<Decimal>,
    seats: Option<i32>,
    platform_fee_percentage: Option<Decimal>,
    platform_fee_amount: Option<Decimal>,
    host_earning_per_seat: Option<Decimal>,
    refund_id: Option<String>,
    refund_amount: Option<Decimal>,
    refunded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for PaymentOrder {
    type Error = PaymentError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = parse_order_status(&row.status)?;
        let financials = snapshot_from_columns(
            row.base_price_per_seat,
            row.seats,
            row.platform_fee_percentage,
            row.platform_fee_amount,
            row.host_earning_per_seat,
        )?;

        Ok(PaymentOrder {
            order_id: OrderId::new(row.order_id)
                .map_err(|e| PaymentError::infrastructure(format!("Corrupt order id: {}", e)))?,
            event_id: EventId::from_uuid(row.event_id),
            user_id: UserId::from_uuid(row.user_id),
            reservation_key: ReservationKey::new(row.reservation_key).map_err(|e| {
                PaymentError::infrastructure(format!("Corrupt reservation key: {}", e))
            })?,
            amount: row.amount,
            currency: row.currency,
            status,
            provider: row.provider,
            provider_payment_id: row.provider_payment_id,
            transaction_id: row.transaction_id,
            is_final: row.is_final,
            failure_reason: row.failure_reason,
            gateway_response: row.gateway_response,
            financials,
            refund_id: row.refund_id,
            refund_amount: row.refund_amount,
            refunded_at: row.refunded_at.map(Timestamp::from_datetime),
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
            expires_at: Timestamp::from_datetime(row.expires_at),
        })
    }
}

/// Database row representation of a ledger entry.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: Uuid,
    order_id: String,
    kind: String,
    amount: Decimal,
    status: String,
    provider_transaction_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for PaymentTransaction {
    type Error = PaymentError;

    fn try_from(row: TransactionRow) -> Result<Self, Self::Error> {
        Ok(PaymentTransaction {
            id: LedgerEntryId::from_uuid(row.id),
            order_id: OrderId::new(row.order_id)
                .map_err(|e| PaymentError::infrastructure(format!("Corrupt order id: {}", e)))?,
            kind: parse_transaction_kind(&row.kind)?,
            amount: row.amount,
            status: parse_transaction_status(&row.status)?,
            provider_transaction_id: row.provider_transaction_id,
            created_at: Timestamp::from_datetime(row.created_at),
        })
    }
}

fn parse_order_status(s: &str) -> Result<OrderStatus, PaymentError> {
    match s {
        "created" => Ok(OrderStatus::Created),
        "pending" => Ok(OrderStatus::Pending),
        "paid" => Ok(OrderStatus::Paid),
        "failed" => Ok(OrderStatus::Failed),
        "refunded" => Ok(OrderStatus::Refunded),
        _ => Err(PaymentError::infrastructure(format!(
            "Invalid order status value: {}",
            s
        ))),
    }
}

fn parse_transaction_kind(s: &str) -> Result<TransactionKind, PaymentError> {
    match s {
        "payment" => Ok(TransactionKind::Payment),
        "refund" => Ok(TransactionKind::Refund),
        "chargeback" => Ok(TransactionKind::Chargeback),
        _ => Err(PaymentError::infrastructure(format!(
            "Invalid transaction kind value: {}",
            s
        ))),
    }
}

fn parse_transaction_status(s: &str) -> Result<TransactionStatus, PaymentError> {
    match s {
        "completed" => Ok(TransactionStatus::Completed),
        "failed" => Ok(TransactionStatus::Failed),
        _ => Err(PaymentError::infrastructure(format!(
            "Invalid transaction status value: {}",
            s
        ))),
    }
}

fn seats_to_db(seats: u32) -> Result<i32, PaymentError> {
    i32::try_from(seats)
        .map_err(|_| PaymentError::infrastructure(format!("Seat count out of range: {}", seats)))
}

fn seats_from_db(seats: i32) -> Result<u32, PaymentError> {
    u32::try_from(seats)
        .map_err(|_| PaymentError::infrastructure(format!("Negative seat count in row: {}", seats)))
}

/// Rebuilds the financial snapshot from its five nullable columns.
///
/// All five present means finalized; all five absent means not yet. A
/// partial set is a corrupt row and is reported as such.
fn snapshot_from_columns(
    base_price_per_seat: Option<Decimal>,
    seats: Option<i32>,
    platform_fee_percentage: Option<Decimal>,
    platform_fee_amount: Option<Decimal>,
    host_earning_per_seat: Option<Decimal>,
) -> Result<Option<FinancialSnapshot>, PaymentError> {
    match (
        base_price_per_seat,
        seats,
        platform_fee_percentage,
        platform_fee_amount,
        host_earning_per_seat,
    ) {
        (None, None, None, None, None) => Ok(None),
        (Some(base), Some(seats), Some(pct), Some(fee), Some(host)) => {
            Ok(Some(FinancialSnapshot {
                base_price_per_seat: base,
                seats: seats_from_db(seats)?,
                platform_fee_percentage: pct,
                platform_fee_amount: fee,
                host_earning_per_seat: host,
            }))
        }
        _ => Err(PaymentError::infrastructure(
            "Partial financial snapshot in order row",
        )),
    }
}

fn is_constraint_violation(e: &sqlx::Error, name: &str) -> bool {
    if let sqlx::Error::Database(db_err) = e {
        return db_err.constraint() == Some(name);
    }
    false
}

#[async_trait]
impl PaymentOrderStore for PostgresOrderStore {
    async fn insert(&self, order: &PaymentOrder) -> Result<(), PaymentError> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            PaymentError::infrastructure(format!("Failed to begin transaction: {}", e))
        })?;

        // Serialize creators for this (event, user) pair. The unexpired
        // active-slot check cannot be a partial unique index because the
        // predicate would depend on now().
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1), hashtext($2))")
            .bind(order.event_id.as_uuid().to_string())
            .bind(order.user_id.as_uuid().to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                PaymentError::infrastructure(format!("Failed to take creation lock: {}", e))
            })?;

        let existing: Option<String> = sqlx::query_scalar(
            r#"
            SELECT order_id FROM payment_orders
            WHERE event_id = $1 AND user_id = $2
              AND status IN ('created', 'pending')
              AND expires_at > $3
            LIMIT 1
            "#,
        )
        .bind(order.event_id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(Timestamp::now().as_datetime())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            PaymentError::infrastructure(format!("Failed to check active orders: {}", e))
        })?;

        if let Some(existing_id) = existing {
            let existing_id = OrderId::new(existing_id)
                .map_err(|e| PaymentError::infrastructure(format!("Corrupt order id: {}", e)))?;
            return Err(PaymentError::duplicate_active_order(existing_id));
        }

        sqlx::query(
            r#"
            INSERT INTO payment_orders (
                order_id, event_id, user_id, reservation_key, amount, currency,
                status, provider, is_final, created_at, updated_at, expires_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            "#,
        )
        .bind(order.order_id.as_str())
        .bind(order.event_id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.reservation_key.as_str())
        .bind(order.amount)
        .bind(&order.currency)
        .bind(order.status.as_str())
        .bind(&order.provider)
        .bind(order.is_final)
        .bind(order.created_at.as_datetime())
        .bind(order.updated_at.as_datetime())
        .bind(order.expires_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| PaymentError::infrastructure(format!("Failed to insert order: {}", e)))?;

        tx.commit().await.map_err(|e| {
            PaymentError::infrastructure(format!("Failed to commit order insert: {}", e))
        })?;

        Ok(())
    }

    async fn find_by_order_id(
        &self,
        order_id: &str,
    ) -> Result<Option<PaymentOrder>, PaymentError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            "SELECT {} FROM payment_orders WHERE order_id = $1",
            ORDER_COLUMNS
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PaymentError::infrastructure(format!("Failed to find order: {}", e)))?;

        row.map(PaymentOrder::try_from).transpose()
    }

    async fn find_active_for(
        &self,
        event_id: &EventId,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<Option<PaymentOrder>, PaymentError> {
        let row: Option<OrderRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM payment_orders
            WHERE event_id = $1 AND user_id = $2
              AND status IN ('created', 'pending')
              AND expires_at > $3
            ORDER BY created_at DESC
            LIMIT 1
            "#,
            ORDER_COLUMNS
        ))
        .bind(event_id.as_uuid())
        .bind(user_id.as_uuid())
        .bind(now.as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            PaymentError::infrastructure(format!("Failed to find active order: {}", e))
        })?;

        row.map(PaymentOrder::try_from).transpose()
    }

    async fn mark_pending(&self, order_id: &OrderId) -> Result<(), PaymentError> {
        // No-op when the order already moved past created.
        sqlx::query(
            r#"
            UPDATE payment_orders SET status = 'pending', updated_at = $2
            WHERE order_id = $1 AND status = 'created'
            "#,
        )
        .bind(order_id.as_str())
        .bind(Timestamp::now().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            PaymentError::infrastructure(format!("Failed to mark order pending: {}", e))
        })?;

        Ok(())
    }

    async fn commit_success(&self, commit: SuccessCommit) -> Result<CommitOutcome, PaymentError> {
        let order = &commit.order;

        let mut tx = self.pool.begin().await.map_err(|e| {
            PaymentError::infrastructure(format!("Failed to begin transaction: {}", e))
        })?;

        let Some(status) = Self::lock_status(&mut tx, &order.order_id).await? else {
            return Err(PaymentError::order_not_found(order.order_id.as_str()));
        };
        if status.is_settled() {
            return Ok(CommitOutcome::AlreadySettled);
        }

        // Lock any final sibling before deciding. Waiting on the row lock
        // means an in-flight finalizer for another order of this pair
        // commits or aborts before we look.
        let final_sibling: Option<String> = sqlx::query_scalar(
            r#"
            SELECT order_id FROM payment_orders
            WHERE event_id = $1 AND user_id = $2 AND is_final AND order_id <> $3
            FOR UPDATE
            "#,
        )
        .bind(order.event_id.as_uuid())
        .bind(order.user_id.as_uuid())
        .bind(order.order_id.as_str())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            PaymentError::infrastructure(format!("Failed to check final sibling: {}", e))
        })?;

        if final_sibling.is_some() {
            return Ok(CommitOutcome::DuplicateFinal);
        }

        if let Some(outcome) = Self::persist_settled(&mut tx, order).await? {
            return Ok(outcome);
        }

        Self::append_transaction(&mut tx, &commit.transaction).await?;

        let attendee = &commit.attendee;
        sqlx::query(
            r#"
            INSERT INTO event_attendees (
                event_id, user_id, order_id, seats, paid, price_paid,
                platform_fee, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (event_id, user_id) DO UPDATE SET
                order_id = EXCLUDED.order_id,
                seats = EXCLUDED.seats,
                paid = EXCLUDED.paid,
                price_paid = EXCLUDED.price_paid,
                platform_fee = EXCLUDED.platform_fee,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(attendee.event_id.as_uuid())
        .bind(attendee.user_id.as_uuid())
        .bind(attendee.order_id.as_str())
        .bind(seats_to_db(attendee.seats)?)
        .bind(attendee.paid)
        .bind(attendee.price_paid)
        .bind(attendee.platform_fee)
        .bind(attendee.created_at.as_datetime())
        .bind(attendee.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| PaymentError::infrastructure(format!("Failed to upsert attendee: {}", e)))?;

        sqlx::query("UPDATE capacity_reservations SET consumed = TRUE WHERE key = $1")
            .bind(commit.reservation_key.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                PaymentError::infrastructure(format!("Failed to consume reservation: {}", e))
            })?;

        tx.commit().await.map_err(|e| {
            PaymentError::infrastructure(format!("Failed to commit success write-set: {}", e))
        })?;

        Ok(CommitOutcome::Applied)
    }

    async fn commit_failure(&self, commit: FailureCommit) -> Result<CommitOutcome, PaymentError> {
        let order = &commit.order;

        let mut tx = self.pool.begin().await.map_err(|e| {
            PaymentError::infrastructure(format!("Failed to begin transaction: {}", e))
        })?;

        let Some(status) = Self::lock_status(&mut tx, &order.order_id).await? else {
            return Err(PaymentError::order_not_found(order.order_id.as_str()));
        };
        if status.is_settled() {
            return Ok(CommitOutcome::AlreadySettled);
        }

        if let Some(outcome) = Self::persist_settled(&mut tx, order).await? {
            return Ok(outcome);
        }

        Self::append_transaction(&mut tx, &commit.transaction).await?;

        tx.commit().await.map_err(|e| {
            PaymentError::infrastructure(format!("Failed to commit failure write-set: {}", e))
        })?;

        Ok(CommitOutcome::Applied)
    }

    async fn transactions_for(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<PaymentTransaction>, PaymentError> {
        let rows: Vec<TransactionRow> = sqlx::query_as(
            r#"
            SELECT id, order_id, kind, amount, status, provider_transaction_id, created_at
            FROM payment_transactions
            WHERE order_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(order_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PaymentError::infrastructure(format!("Failed to list ledger rows: {}", e)))?;

        rows.into_iter().map(PaymentTransaction::try_from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn parse_order_status_accepts_all_values() {
        assert_eq!(parse_order_status("created").unwrap(), OrderStatus::Created);
        assert_eq!(parse_order_status("pending").unwrap(), OrderStatus::Pending);
        assert_eq!(parse_order_status("paid").unwrap(), OrderStatus::Paid);
        assert_eq!(parse_order_status("failed").unwrap(), OrderStatus::Failed);
        assert_eq!(
            parse_order_status("refunded").unwrap(),
            OrderStatus::Refunded
        );
    }

    #[test]
    fn parse_order_status_rejects_unknown_values() {
        assert!(parse_order_status("settled").is_err());
        assert!(parse_order_status("").is_err());
    }

    #[test]
    fn parse_transaction_kind_roundtrips() {
        for kind in [
            TransactionKind::Payment,
            TransactionKind::Refund,
            TransactionKind::Chargeback,
        ] {
            assert_eq!(parse_transaction_kind(kind.as_str()).unwrap(), kind);
        }
    }

    #[test]
    fn parse_transaction_status_roundtrips() {
        for status in [TransactionStatus::Completed, TransactionStatus::Failed] {
            assert_eq!(parse_transaction_status(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn seat_conversion_rejects_negative_rows() {
        assert!(seats_from_db(-1).is_err());
        assert_eq!(seats_from_db(3).unwrap(), 3);
        assert_eq!(seats_to_db(3).unwrap(), 3);
    }

    #[test]
    fn snapshot_rebuilds_when_all_columns_present() {
        let snapshot = snapshot_from_columns(
            Some(dec("100.00")),
            Some(3),
            Some(dec("10")),
            Some(dec("30.00")),
            Some(dec("100.00")),
        )
        .unwrap()
        .unwrap();

        assert_eq!(snapshot.base_price_per_seat, dec("100.00"));
        assert_eq!(snapshot.seats, 3);
        assert_eq!(snapshot.platform_fee_amount, dec("30.00"));
    }

    #[test]
    fn snapshot_absent_when_all_columns_null() {
        let snapshot =
            snapshot_from_columns(None, None, None, None, None).unwrap();
        assert!(snapshot.is_none());
    }

    #[test]
    fn partial_snapshot_is_a_corrupt_row() {
        let result = snapshot_from_columns(Some(dec("100.00")), None, None, None, None);
        assert!(result.is_err());
    }
}
