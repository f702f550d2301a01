//! Inbound gateway notification parsing.
//!
//! The gateway posts payment outcomes as form fields. Parsing validates the
//! required fields up front so a payload missing `txnid` is rejected before
//! any order lookup happens; the raw payload is persisted separately either
//! way.

use std::collections::HashMap;

use serde::Serialize;

use crate::domain::foundation::ValidationError;

use super::GatewayHasher;

/// Gateway status string that settles an order as paid. Anything else is
/// treated as a failure with a reason.
const SUCCESS_STATUS: &str = "success";

/// A validated gateway notification.
///
/// `amount` stays the raw string the gateway sent. The reverse hash was
/// computed over that exact string, so reformatting it would break
/// verification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GatewayNotification {
    pub status: String,
    pub txnid: String,
    pub amount: String,
    pub productinfo: String,
    pub firstname: String,
    pub email: String,
    pub hash: String,
    pub mihpayid: Option<String>,
    pub bank_ref_num: Option<String>,
    pub error: Option<String>,
    pub error_message: Option<String>,
}

impl GatewayNotification {
    /// Parses and validates the form fields of an inbound notification.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first required field that is
    /// missing or blank. Required fields: `status`, `txnid`, `amount`,
    /// `productinfo`, `firstname`, `email`, `hash`.
    pub fn parse(form: &HashMap<String, String>) -> Result<Self, ValidationError> {
        Ok(Self {
            status: required(form, "status")?,
            txnid: required(form, "txnid")?,
            amount: required(form, "amount")?,
            productinfo: required(form, "productinfo")?,
            firstname: required(form, "firstname")?,
            email: required(form, "email")?,
            hash: required(form, "hash")?,
            mihpayid: optional(form, "mihpayid"),
            bank_ref_num: optional(form, "bank_ref_num"),
            error: optional(form, "error"),
            error_message: optional(form, "error_Message"),
        })
    }

    /// Whether the gateway reports a captured payment.
    pub fn is_success(&self) -> bool {
        self.status == SUCCESS_STATUS
    }

    /// Authenticates this notification with the merchant credentials.
    ///
    /// Keeps the reverse-hash field order in exactly one place.
    pub fn verify_against(&self, hasher: &GatewayHasher) -> bool {
        hasher.verify_reverse_hash(
            &self.status,
            &self.email,
            &self.firstname,
            &self.productinfo,
            &self.amount,
            &self.txnid,
            &self.hash,
        )
    }

    /// Human-readable failure reason for the order row.
    ///
    /// Prefers the gateway's long-form message, then its short error code,
    /// then falls back to the reported status.
    pub fn failure_reason(&self) -> String {
        self.error_message
            .clone()
            .or_else(|| self.error.clone())
            .unwrap_or_else(|| format!("Payment {}", self.status))
    }
}

fn required(form: &HashMap<String, String>, field: &str) -> Result<String, ValidationError> {
    match form.get(field) {
        Some(value) if !value.trim().is_empty() => Ok(value.clone()),
        Some(_) => Err(ValidationError::empty_field(field)),
        None => Err(ValidationError::missing_field(field)),
    }
}

fn optional(form: &HashMap<String, String>, field: &str) -> Option<String> {
    form.get(field)
        .filter(|value| !value.trim().is_empty())
        .cloned()
}
