//! HTTP DTOs (Data Transfer Objects) for payments endpoints.
//!
//! These types define the JSON request/response structure for the payments
//! API. They serve as the boundary between HTTP and the application layer.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{EventId, ReservationKey};
use crate::domain::payments::{
    CapacityReservation, FinancialSnapshot, PaymentOrder, PaymentTransaction,
};
use crate::ports::RedirectPayload;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Request to hold seats on a paid event ahead of payment.
#[derive(Debug, Clone, Deserialize)]
pub struct ReserveCapacityRequest {
    /// The event to hold seats on.
    pub event_id: EventId,
    /// Number of seats to hold.
    pub seats: u32,
}

/// Request to open a payment order against a held reservation.
///
/// The contact fields ride along to the gateway's hosted page; firstname and
/// email also feed the request hash.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateOrderRequest {
    /// The event being paid for.
    pub event_id: EventId,
    /// Total amount the buyer will be charged. Accepts a decimal string.
    pub amount: Decimal,
    /// The capacity hold backing this order.
    pub reservation_key: ReservationKey,
    /// Buyer first name.
    pub firstname: String,
    /// Buyer email.
    pub email: String,
    /// Buyer phone number.
    pub phone: String,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// A capacity hold as returned to the client.
#[derive(Debug, Clone, Serialize)]
pub struct ReservationResponse {
    /// Opaque token to present when creating the order.
    pub reservation_key: String,
    /// Event the seats are held for.
    pub event_id: String,
    /// Number of seats held.
    pub seats_reserved: u32,
    /// Deadline after which the hold is unusable (ISO 8601).
    pub expires_at: String,
}

impl From<CapacityReservation> for ReservationResponse {
    fn from(reservation: CapacityReservation) -> Self {
        Self {
            reservation_key: reservation.key.to_string(),
            event_id: reservation.event_id.to_string(),
            seats_reserved: reservation.seats_reserved,
            expires_at: reservation.expires_at.as_datetime().to_rfc3339(),
        }
    }
}

/// A payment order as returned to the client.
///
/// Refund details are not flattened here; a refunded order reads
/// `status: "refunded"` and carries the refund row in its transactions.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    /// Order id, echoed to the gateway as txnid.
    pub order_id: String,
    pub event_id: String,
    pub user_id: String,
    pub reservation_key: String,
    /// Amount charged, as a decimal string.
    pub amount: String,
    pub currency: String,
    /// Lifecycle status: created, pending, paid, failed, or refunded.
    pub status: String,
    pub provider: String,
    /// Gateway-side payment id, present after settlement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_payment_id: Option<String>,
    /// Bank reference number, present after settlement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    /// True on the single authoritative paid order for this event and user.
    pub is_final: bool,
    /// Gateway-reported reason when the payment failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    /// Money split recorded when the order settled as paid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financials: Option<FinancialsResponse>,
    /// When the order was created (ISO 8601).
    pub created_at: String,
    /// Settlement deadline (ISO 8601).
    pub expires_at: String,
}

impl From<PaymentOrder> for OrderResponse {
    fn from(order: PaymentOrder) -> Self {
        Self {
            order_id: order.order_id.to_string(),
            event_id: order.event_id.to_string(),
            user_id: order.user_id.to_string(),
            reservation_key: order.reservation_key.to_string(),
            amount: order.amount.to_string(),
            currency: order.currency,
            status: order.status.as_str().to_string(),
            provider: order.provider,
            provider_payment_id: order.provider_payment_id,
            transaction_id: order.transaction_id,
            is_final: order.is_final,
            failure_reason: order.failure_reason,
            financials: order.financials.map(FinancialsResponse::from),
            created_at: order.created_at.as_datetime().to_rfc3339(),
            expires_at: order.expires_at.as_datetime().to_rfc3339(),
        }
    }
}

/// The immutable money split on a paid order.
#[derive(Debug, Clone, Serialize)]
pub struct FinancialsResponse {
    pub base_price_per_seat: String,
    pub seats: u32,
    pub platform_fee_percentage: String,
    pub platform_fee_amount: String,
    pub host_earning_per_seat: String,
}

impl From<FinancialSnapshot> for FinancialsResponse {
    fn from(snapshot: FinancialSnapshot) -> Self {
        Self {
            base_price_per_seat: snapshot.base_price_per_seat.to_string(),
            seats: snapshot.seats,
            platform_fee_percentage: snapshot.platform_fee_percentage.to_string(),
            platform_fee_amount: snapshot.platform_fee_amount.to_string(),
            host_earning_per_seat: snapshot.host_earning_per_seat.to_string(),
        }
    }
}

/// One ledger row under an order.
#[derive(Debug, Clone, Serialize)]
pub struct TransactionResponse {
    pub id: String,
    /// Movement kind: payment, refund, or chargeback.
    pub kind: String,
    pub amount: String,
    /// Outcome: completed or failed.
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider_transaction_id: Option<String>,
    pub created_at: String,
}

impl From<PaymentTransaction> for TransactionResponse {
    fn from(transaction: PaymentTransaction) -> Self {
        Self {
            id: transaction.id.to_string(),
            kind: transaction.kind.as_str().to_string(),
            amount: transaction.amount.to_string(),
            status: transaction.status.as_str().to_string(),
            provider_transaction_id: transaction.provider_transaction_id,
            created_at: transaction.created_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Response for order creation.
///
/// Carries the order alongside the signed form payload the client
/// auto-submits to the gateway's hosted checkout page.
#[derive(Debug, Clone, Serialize)]
pub struct CreateOrderResponse {
    pub order: OrderResponse,
    pub redirect: RedirectPayload,
}

/// Response for order polling: the order with its ledger rows.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetailResponse {
    pub order: OrderResponse,
    pub transactions: Vec<TransactionResponse>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Response DTO
// ════════════════════════════════════════════════════════════════════════════════

/// Standard error response for API errors.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
    /// Additional details (optional).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Create an error response with details.
    pub fn with_details(
        error_code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}
