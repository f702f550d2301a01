//! Caller identity types for the domain layer.
//!
//! Authentication (phone OTP, session issuance) lives in an upstream service;
//! this crate only ever sees a validated identity. These types have no
//! provider dependencies, so any auth layer can populate them.
//!
//! # Design Decisions
//!
//! - `CallerIdentity` carries only what payment authorization needs: who the
//!   caller is and which identity class they hold.
//! - Operators are first-class here because order creation must reject them
//!   at the service boundary, not just in UI.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{UserId, ValidationError};

/// Identity class of an authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityRole {
    /// A regular attendee/customer account. The only class allowed to pay.
    Customer,
    /// Venue/operations staff. May manage events, never pay for them.
    Operator,
}

impl IdentityRole {
    /// Parses a role string as delivered by the upstream auth layer.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "customer" | "user" => Ok(Self::Customer),
            "operator" | "admin" | "staff" => Ok(Self::Operator),
            other => Err(ValidationError::invalid_format(
                "role",
                format!("unknown identity role '{}'", other),
            )),
        }
    }

    /// Stable string form for logs and headers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Operator => "operator",
        }
    }
}

impl fmt::Display for IdentityRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Validated caller identity, populated by the HTTP layer from headers
/// installed upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerIdentity {
    pub user_id: UserId,
    pub role: IdentityRole,
}

impl CallerIdentity {
    /// Creates an identity for a customer account.
    pub fn customer(user_id: UserId) -> Self {
        Self {
            user_id,
            role: IdentityRole::Customer,
        }
    }

    /// Creates an identity for an operator account.
    pub fn operator(user_id: UserId) -> Self {
        Self {
            user_id,
            role: IdentityRole::Operator,
        }
    }

    /// Returns true if the caller holds the customer identity class.
    pub fn is_customer(&self) -> bool {
        self.role == IdentityRole::Customer
    }
}
