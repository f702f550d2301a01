//! Payment gateway port for hosted-checkout redirects.
//!
//! The gateway never sees an API call from us at order time. We hand the
//! customer's browser a signed form payload, the customer pays on the
//! gateway's hosted page, and the gateway calls back with a signed
//! notification. Both directions are pure hash computation, so this port is
//! synchronous.
//!
//! # Design
//!
//! - **Signed server-side**: the redirect hash is always computed here; a
//!   client-supplied hash is never trusted
//! - **Verification is binary**: an inbound notification either proves it
//!   came from the gateway or it mutates nothing
//! - **Secrets stay inside**: implementations hold key/salt; neither appears
//!   on any domain record

use crate::domain::payments::{GatewayNotification, PaymentError};
use rust_decimal::Decimal;
use serde::Serialize;

/// Port for a redirect-based payment gateway.
pub trait PaymentGateway: Send + Sync {
    /// Provider label recorded on orders and webhooks, e.g. `payu`.
    fn provider(&self) -> &str;

    /// Build the signed payload the client auto-submits to the gateway.
    ///
    /// The `amount` field of the result is rendered with exactly two decimal
    /// digits, and the hash is computed over that same rendering.
    fn build_redirect(&self, request: RedirectRequest) -> RedirectPayload;

    /// Verify an inbound notification against the reverse hash.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::HashMismatch` when the signature does not
    /// prove the notification came from the gateway. Callers must not mutate
    /// any order state after this error.
    fn verify_notification(&self, notification: &GatewayNotification) -> Result<(), PaymentError>;
}

/// Inputs for building a redirect payload.
///
/// `txnid` is the order id; `productinfo` is the event title; the contact
/// fields identify the paying customer on the gateway's hosted page.
#[derive(Debug, Clone)]
pub struct RedirectRequest {
    pub txnid: String,
    pub amount: Decimal,
    pub productinfo: String,
    pub firstname: String,
    pub email: String,
    pub phone: String,
}

/// The signed form payload handed to the client.
///
/// Field names match the gateway's form contract exactly. `key` is the
/// public merchant identifier; the salt never leaves the gateway adapter.
#[derive(Debug, Clone, Serialize)]
pub struct RedirectPayload {
    pub key: String,
    pub txnid: String,
    pub amount: String,
    pub productinfo: String,
    pub firstname: String,
    pub email: String,
    pub phone: String,
    pub surl: String,
    pub furl: String,
    pub hash: String,
}
