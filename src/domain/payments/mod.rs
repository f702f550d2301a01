//! Payments domain module.
//!
//! Covers the paid-event order lifecycle: capacity reservation, order
//! creation, gateway hash authentication, and webhook-driven finalization
//! with immutable financial snapshotting.
//!
//! # Module Structure
//!
//! - `reservation` - CapacityReservation time-bound seat holds
//! - `order` - PaymentOrder aggregate entity
//! - `order_status` - OrderStatus state machine
//! - `fees` - PlatformFee and the FinancialSnapshot computation
//! - `transaction` - Append-only PaymentTransaction ledger rows
//! - `attendee` - Attendee fulfillment records
//! - `gateway_hash` - PayU SHA-512 hash protocol
//! - `notification` - Inbound gateway notification parsing
//! - `webhook` - Immutable webhook delivery records
//! - `events` - Domain events for the analytics/notification fan-out
//! - `errors` - PaymentError taxonomy

mod attendee;
mod errors;
mod events;
mod fees;
mod gateway_hash;
mod notification;
mod order;
mod order_status;
mod reservation;
mod transaction;
mod webhook;

pub use attendee::Attendee;
pub use errors::PaymentError;
pub use events::PaymentEvent;
pub use fees::{FinancialSnapshot, PlatformFee};
pub use gateway_hash::GatewayHasher;
pub use notification::GatewayNotification;
pub use order::PaymentOrder;
pub use order_status::OrderStatus;
pub use reservation::CapacityReservation;
pub use transaction::{PaymentTransaction, TransactionKind, TransactionStatus};
pub use webhook::PaymentWebhook;
