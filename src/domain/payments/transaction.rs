//! Append-only payment transaction ledger.
//!
//! One row is appended per finalize call that actually mutates order state.
//! Rows are never updated or deleted.

use crate::domain::foundation::{LedgerEntryId, OrderId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What kind of money movement a ledger row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    /// Buyer pays for seats.
    Payment,

    /// Money returned to the buyer.
    Refund,

    /// Bank-initiated reversal.
    Chargeback,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Payment => "payment",
            TransactionKind::Refund => "refund",
            TransactionKind::Chargeback => "chargeback",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome recorded on a ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Completed => "completed",
            TransactionStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One immutable ledger row, linked to the order it settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentTransaction {
    pub id: LedgerEntryId,

    /// Order this row belongs to.
    pub order_id: OrderId,

    pub kind: TransactionKind,

    /// Amount the row accounts for; the order amount for payments.
    pub amount: Decimal,

    pub status: TransactionStatus,

    /// Gateway-side id for this movement, when the gateway supplied one.
    pub provider_transaction_id: Option<String>,

    pub created_at: Timestamp,
}

impl PaymentTransaction {
    /// Ledger row for a successful capture.
    pub fn completed_payment(
        order_id: OrderId,
        amount: Decimal,
        provider_transaction_id: Option<String>,
    ) -> Self {
        Self {
            id: LedgerEntryId::new(),
            order_id,
            kind: TransactionKind::Payment,
            amount,
            status: TransactionStatus::Completed,
            provider_transaction_id,
            created_at: Timestamp::now(),
        }
    }

    /// Ledger row for a failed capture attempt.
    pub fn failed_payment(order_id: OrderId, amount: Decimal) -> Self {
        Self {
            id: LedgerEntryId::new(),
            order_id,
            kind: TransactionKind::Payment,
            amount,
            status: TransactionStatus::Failed,
            provider_transaction_id: None,
            created_at: Timestamp::now(),
        }
    }

    /// Ledger row for a completed refund.
    pub fn completed_refund(
        order_id: OrderId,
        amount: Decimal,
        provider_transaction_id: Option<String>,
    ) -> Self {
        Self {
            id: LedgerEntryId::new(),
            order_id,
            kind: TransactionKind::Refund,
            amount,
            status: TransactionStatus::Completed,
            provider_transaction_id,
            created_at: Timestamp::now(),
        }
    }
}
