//! Monetary amount helpers.
//!
//! All amounts in this crate are `rust_decimal::Decimal`. The gateway
//! protocol renders amounts with exactly two decimal digits, and fee
//! arithmetic rounds half-up at two decimal places; both rules live here so
//! no caller reimplements them.

use rust_decimal::{Decimal, RoundingStrategy};

use super::ValidationError;

/// Rounds an amount to two decimal places, half-up (midpoint away from zero).
pub fn round_half_up(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Renders an amount with exactly two decimal digits, e.g. `330.00`.
///
/// The value is rounded half-up first so the precision specifier only ever
/// pads, never re-rounds.
pub fn format_amount(amount: Decimal) -> String {
    format!("{:.2}", round_half_up(amount))
}

/// Parses a decimal amount string, reporting the offending field on failure.
pub fn parse_amount(field: &str, raw: &str) -> Result<Decimal, ValidationError> {
    raw.trim()
        .parse::<Decimal>()
        .map_err(|_| ValidationError::invalid_format(field, format!("'{}' is not a decimal amount", raw)))
}
