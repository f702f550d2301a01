//! Axum router configuration for payments endpoints.
//!
//! This module defines the route structure for the payments API and wires
//! the routes to their corresponding handlers.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    create_order, get_order, payu_webhook, reserve_capacity, PaymentsAppState,
};

/// Create the payments API router.
///
/// # Routes
///
/// ## Customer Endpoints (require the upstream identity headers)
/// - `POST /reservations` - Hold seats on a paid event
/// - `POST /orders` - Open a payment order; the response carries the signed
///   gateway redirect payload
/// - `GET /orders/:order_id` - Order status for client polling
///
/// ## Webhook Endpoints (no identity headers, reverse-hash verified)
/// - `POST /webhooks/payu` - Inbound gateway notification
pub fn payment_routes() -> Router<PaymentsAppState> {
    Router::new()
        .route("/reservations", post(reserve_capacity))
        .route("/orders", post(create_order))
        .route("/orders/:order_id", get(get_order))
        .nest("/webhooks", webhook_routes())
}

/// Create the gateway webhook router.
///
/// Separate from the customer routes because webhook deliveries carry no
/// caller identity; they authenticate through the payload's reverse hash.
///
/// # Routes
/// - `POST /payu` - Inbound PayU notification
pub fn webhook_routes() -> Router<PaymentsAppState> {
    Router::new().route("/payu", post(payu_webhook))
}

/// Create the complete payments module router.
///
/// Suitable for mounting at `/api`, which yields:
/// - `POST /api/payments/reservations`
/// - `POST /api/payments/orders`
/// - `GET /api/payments/orders/:order_id`
/// - `POST /api/payments/webhooks/payu`
pub fn payments_router() -> Router<PaymentsAppState> {
    Router::new().nest("/payments", payment_routes())
}
