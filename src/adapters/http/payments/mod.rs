//! HTTP adapter for payments endpoints.
//!
//! Exposes the payment lifecycle via REST API:
//! - `POST /api/payments/reservations` - Hold seats on a paid event
//! - `POST /api/payments/orders` - Open a payment order with its signed
//!   gateway redirect payload
//! - `GET /api/payments/orders/:order_id` - Order status for client polling
//! - `POST /api/payments/webhooks/payu` - Inbound gateway notification

pub mod dto;
pub mod handlers;
pub mod routes;

pub use dto::*;
pub use handlers::{AuthenticatedCaller, PaymentApiError, PaymentsAppState};
pub use routes::{payment_routes, payments_router, webhook_routes};
