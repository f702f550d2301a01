//! Payment handlers.
//!
//! Command and query handlers for the paid-ticketing flow:
//!
//! ## Commands
//! - Reserving event capacity ahead of payment
//! - Creating payment orders with their signed gateway redirects
//! - Processing asynchronous gateway webhooks (settlement lives here)
//!
//! ## Queries
//! - Get a payment order with its transaction ledger

mod create_payment_order;
mod get_payment_order;
mod process_webhook;
mod reserve_capacity;

// Commands
pub use create_payment_order::{
    CreatePaymentOrderCommand, CreatePaymentOrderHandler, CreatePaymentOrderResult,
};
pub use process_webhook::{ProcessWebhookCommand, ProcessWebhookHandler, ProcessWebhookResult};
pub use reserve_capacity::{ReserveCapacityCommand, ReserveCapacityHandler, ReserveCapacityResult};

// Queries
pub use get_payment_order::{GetPaymentOrderHandler, GetPaymentOrderQuery, GetPaymentOrderResult};
