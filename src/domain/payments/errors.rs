//! Payment-specific error types.
//!
//! Errors covering reservation, order creation, gateway interaction, and
//! webhook-driven finalization.
//!
//! # HTTP Status Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | EventNotFound / OrderNotFound / ReservationNotFound | 404 |
//! | CapacityExceeded | 409 |
//! | DuplicateActiveOrder / DuplicateFinalOrder | 409 |
//! | InvalidReservation | 400 |
//! | EventNotPayable / ValidationFailed / MalformedWebhook | 400 |
//! | HashMismatch | 401 |
//! | CustomerIdentityRequired | 403 |
//! | GatewayMisconfigured / Infrastructure | 500 |

use crate::domain::foundation::{
    DomainError, ErrorCode, EventId, OrderId, ReservationKey, ValidationError,
};

/// Payment-specific errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// Event was not found in the catalog.
    EventNotFound(EventId),

    /// No order exists for this transaction id.
    OrderNotFound(String),

    /// No reservation exists for this key.
    ReservationNotFound(ReservationKey),

    /// The event does not require payment.
    EventNotPayable(EventId),

    /// Seats requested would push the event past capacity.
    CapacityExceeded {
        event_id: EventId,
        requested: u32,
        available: u32,
    },

    /// Reservation exists but cannot back an order.
    InvalidReservation {
        key: ReservationKey,
        reason: String,
    },

    /// An unexpired created/pending order already occupies the slot.
    /// Carries the existing order id so the caller can resume it.
    DuplicateActiveOrder {
        existing_order_id: OrderId,
    },

    /// Another order for the same (event, user) already holds is_final.
    DuplicateFinalOrder {
        event_id: EventId,
    },

    /// The requested operation does not fit the order's current status.
    InvalidState {
        current: String,
        attempted: String,
    },

    /// Reverse-hash authentication of a notification failed.
    HashMismatch,

    /// Inbound webhook payload failed field validation.
    MalformedWebhook {
        field: String,
        message: String,
    },

    /// Only the customer identity may pay; operators are rejected outright.
    CustomerIdentityRequired,

    /// Validation failed.
    ValidationFailed {
        field: String,
        message: String,
    },

    /// Gateway credentials are missing or unusable.
    GatewayMisconfigured(String),

    /// Infrastructure error.
    Infrastructure(String),
}

impl PaymentError {
    // Constructor functions for cleaner error creation

    pub fn event_not_found(event_id: EventId) -> Self {
        PaymentError::EventNotFound(event_id)
    }

    pub fn order_not_found(txnid: impl Into<String>) -> Self {
        PaymentError::OrderNotFound(txnid.into())
    }

    pub fn reservation_not_found(key: ReservationKey) -> Self {
        PaymentError::ReservationNotFound(key)
    }

    pub fn event_not_payable(event_id: EventId) -> Self {
        PaymentError::EventNotPayable(event_id)
    }

    pub fn capacity_exceeded(event_id: EventId, requested: u32, available: u32) -> Self {
        PaymentError::CapacityExceeded {
            event_id,
            requested,
            available,
        }
    }

    pub fn invalid_reservation(key: ReservationKey, reason: impl Into<String>) -> Self {
        PaymentError::InvalidReservation {
            key,
            reason: reason.into(),
        }
    }

    pub fn duplicate_active_order(existing_order_id: OrderId) -> Self {
        PaymentError::DuplicateActiveOrder { existing_order_id }
    }

    pub fn duplicate_final_order(event_id: EventId) -> Self {
        PaymentError::DuplicateFinalOrder { event_id }
    }

    pub fn invalid_state(current: impl Into<String>, attempted: impl Into<String>) -> Self {
        PaymentError::InvalidState {
            current: current.into(),
            attempted: attempted.into(),
        }
    }

    pub fn hash_mismatch() -> Self {
        PaymentError::HashMismatch
    }

    pub fn malformed_webhook(field: impl Into<String>, message: impl Into<String>) -> Self {
        PaymentError::MalformedWebhook {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn customer_identity_required() -> Self {
        PaymentError::CustomerIdentityRequired
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        PaymentError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn gateway_misconfigured(message: impl Into<String>) -> Self {
        PaymentError::GatewayMisconfigured(message.into())
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        PaymentError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PaymentError::EventNotFound(_) => ErrorCode::EventNotFound,
            PaymentError::OrderNotFound(_) => ErrorCode::OrderNotFound,
            PaymentError::ReservationNotFound(_) => ErrorCode::ReservationNotFound,
            PaymentError::EventNotPayable(_) => ErrorCode::ValidationFailed,
            PaymentError::CapacityExceeded { .. } => ErrorCode::CapacityExceeded,
            PaymentError::InvalidReservation { .. } => ErrorCode::InvalidReservation,
            PaymentError::DuplicateActiveOrder { .. } => ErrorCode::DuplicateActiveOrder,
            PaymentError::DuplicateFinalOrder { .. } => ErrorCode::DuplicateFinalOrder,
            PaymentError::InvalidState { .. } => ErrorCode::InvalidStateTransition,
            PaymentError::HashMismatch => ErrorCode::HashMismatch,
            PaymentError::MalformedWebhook { .. } => ErrorCode::MalformedWebhook,
            PaymentError::CustomerIdentityRequired => ErrorCode::Forbidden,
            PaymentError::ValidationFailed { .. } => ErrorCode::ValidationFailed,
            PaymentError::GatewayMisconfigured(_) => ErrorCode::GatewayMisconfigured,
            PaymentError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-friendly error message.
    pub fn message(&self) -> String {
        match self {
            PaymentError::EventNotFound(event_id) => format!("Event not found: {}", event_id),
            PaymentError::OrderNotFound(txnid) => {
                format!("No payment order found for transaction id: {}", txnid)
            }
            PaymentError::ReservationNotFound(key) => {
                format!("No reservation found for key: {}", key)
            }
            PaymentError::EventNotPayable(event_id) => {
                format!("Event {} does not require payment", event_id)
            }
            PaymentError::CapacityExceeded {
                event_id,
                requested,
                available,
            } => format!(
                "Event {} has {} seats left, {} requested",
                event_id, available, requested
            ),
            PaymentError::InvalidReservation { key, reason } => {
                format!("Reservation '{}' cannot be used: {}", key, reason)
            }
            PaymentError::DuplicateActiveOrder { existing_order_id } => format!(
                "An active payment order already exists: {}",
                existing_order_id
            ),
            PaymentError::DuplicateFinalOrder { event_id } => format!(
                "Another order for event {} has already been finalized",
                event_id
            ),
            PaymentError::InvalidState { current, attempted } => {
                format!("Cannot {} an order in {} status", attempted, current)
            }
            PaymentError::HashMismatch => "Webhook hash verification failed".to_string(),
            PaymentError::MalformedWebhook { field, message } => {
                format!("Malformed webhook, field '{}': {}", field, message)
            }
            PaymentError::CustomerIdentityRequired => {
                "Payment orders can only be created by the paying customer".to_string()
            }
            PaymentError::ValidationFailed { field, message } => {
                format!("Validation failed for '{}': {}", field, message)
            }
            PaymentError::GatewayMisconfigured(msg) => {
                format!("Payment gateway misconfigured: {}", msg)
            }
            PaymentError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, PaymentError::Infrastructure(_))
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for PaymentError {}

impl From<ValidationError> for PaymentError {
    fn from(err: ValidationError) -> Self {
        PaymentError::ValidationFailed {
            field: err.field().to_string(),
            message: err.to_string(),
        }
    }
}

impl From<DomainError> for PaymentError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::InvalidStateTransition => PaymentError::InvalidState {
                current: "unknown".to_string(),
                attempted: err.to_string(),
            },
            ErrorCode::ValidationFailed
            | ErrorCode::EmptyField
            | ErrorCode::OutOfRange
            | ErrorCode::InvalidFormat => PaymentError::ValidationFailed {
                field: err
                    .details
                    .get("field")
                    .cloned()
                    .unwrap_or_else(|| "unknown".to_string()),
                message: err.to_string(),
            },
            _ => PaymentError::Infrastructure(err.to_string()),
        }
    }
}

impl From<PaymentError> for DomainError {
    fn from(err: PaymentError) -> Self {
        DomainError::new(err.code(), err.message())
    }
}
