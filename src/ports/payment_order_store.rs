//! Payment order store port.
//!
//! Defines the contract for persisting PaymentOrder aggregates and for the
//! two atomic finalize commits. The orchestrator computes the full write-set
//! outside the store; the store's only job is to apply it in one transaction
//! with the concurrency guards the schema provides.
//!
//! # Design
//!
//! - **Re-check inside the transaction**: both commit methods re-read the
//!   order's persisted status under lock before mutating, so a redelivered
//!   webhook or a lost race becomes a clean `AlreadySettled` no-op.
//! - **Finality via unique index**: a partial unique index on
//!   (event_id, user_id) where is_final holds invariant "at most one final
//!   order per pair"; a violation surfaces as `DuplicateFinal`.
//! - **Orders are never deleted**: failed and expired orders remain as
//!   audit history.

use async_trait::async_trait;

use crate::domain::foundation::{EventId, OrderId, ReservationKey, Timestamp, UserId};
use crate::domain::payments::{Attendee, PaymentError, PaymentOrder, PaymentTransaction};

/// Write-set applied atomically when a payment succeeds.
///
/// `order` carries the already-finalized aggregate state (status paid,
/// snapshot set, is_final true); the commit persists it together with its
/// side effects or not at all.
#[derive(Debug, Clone)]
pub struct SuccessCommit {
    /// Finalized aggregate state to persist.
    pub order: PaymentOrder,

    /// Completed ledger row to append.
    pub transaction: PaymentTransaction,

    /// Fulfillment record to upsert by (event, user).
    pub attendee: Attendee,

    /// Reservation to mark consumed.
    pub reservation_key: ReservationKey,
}

/// Write-set applied atomically when a payment fails.
///
/// The reservation is deliberately absent: a failed payment leaves the hold
/// untouched so it lapses on its own TTL and the user can retry cleanly.
#[derive(Debug, Clone)]
pub struct FailureCommit {
    /// Failed aggregate state to persist.
    pub order: PaymentOrder,

    /// Failed ledger row to append.
    pub transaction: PaymentTransaction,
}

/// What an atomic commit actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The write-set was applied.
    Applied,

    /// The order was already settled when the transaction re-read it;
    /// nothing changed.
    AlreadySettled,

    /// Another order for the same (event, user) already holds is_final;
    /// the transaction rolled back.
    DuplicateFinal,
}

/// Store port for PaymentOrder persistence and atomic finalization.
#[async_trait]
pub trait PaymentOrderStore: Send + Sync {
    /// Persist a freshly created order.
    ///
    /// # Errors
    ///
    /// - `DuplicateActiveOrder` if an unexpired created/pending order for
    ///   the same (event, user) already exists, citing its order id
    /// - `Infrastructure` on persistence failure
    async fn insert(&self, order: &PaymentOrder) -> Result<(), PaymentError>;

    /// Look an order up by its transaction id.
    ///
    /// Returns `None` if no order carries this txnid. Webhook processing
    /// treats that as a terminal, logged outcome.
    async fn find_by_order_id(&self, order_id: &str)
        -> Result<Option<PaymentOrder>, PaymentError>;

    /// Find the unexpired created/pending order for (event, user), if any.
    ///
    /// Settled and expired orders never match; an expired pending order no
    /// longer blocks a fresh attempt.
    async fn find_active_for(
        &self,
        event_id: &EventId,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<Option<PaymentOrder>, PaymentError>;

    /// Record that the redirect payload was handed out (created -> pending).
    ///
    /// A no-op if the order has already moved past created.
    async fn mark_pending(&self, order_id: &OrderId) -> Result<(), PaymentError>;

    /// Apply a success write-set in one transaction.
    ///
    /// Re-reads the order's status under lock first. Persists the order,
    /// appends the ledger row, upserts the attendee, and consumes the
    /// reservation; all of it commits or none of it does.
    ///
    /// # Errors
    ///
    /// - `OrderNotFound` if the order vanished (never expected in practice)
    /// - `Infrastructure` on persistence failure
    async fn commit_success(&self, commit: SuccessCommit) -> Result<CommitOutcome, PaymentError>;

    /// Apply a failure write-set in one transaction.
    ///
    /// Same re-check discipline as `commit_success`; only the order row and
    /// the ledger row are touched.
    async fn commit_failure(&self, commit: FailureCommit) -> Result<CommitOutcome, PaymentError>;

    /// All ledger rows for an order, oldest first.
    async fn transactions_for(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<PaymentTransaction>, PaymentError>;
}
