//! Platform fee and the immutable financial snapshot.
//!
//! The snapshot is computed exactly once, at finalize time, and written to the
//! order row so later fee-configuration changes can never alter what a buyer
//! was actually charged.
//!
//! # Design Decisions
//!
//! - **Fee is additive**: the platform fee sits on top of the ticket price.
//!   `host_earning_per_seat` always equals `base_price_per_seat`; the fee is
//!   never deducted from the host.
//! - **HALF_UP at 2 decimal places**: the single rounding rule for every
//!   derived amount, applied through [`round_half_up`].

use crate::domain::foundation::{round_half_up, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Platform fee rate, held as a percentage (`10` means 10%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformFee {
    percentage: Decimal,
}

impl PlatformFee {
    /// Builds a fee from a percentage value.
    ///
    /// # Errors
    ///
    /// Returns a validation error unless `0 <= percentage <= 100`.
    pub fn from_percentage(percentage: Decimal) -> Result<Self, ValidationError> {
        if percentage < Decimal::ZERO || percentage > Decimal::ONE_HUNDRED {
            return Err(ValidationError::invalid_format(
                "platform_fee_percentage",
                format!("must be between 0 and 100, got {}", percentage),
            ));
        }
        Ok(Self { percentage })
    }

    /// The percentage form, as persisted on the order row.
    pub fn percentage(&self) -> Decimal {
        self.percentage
    }

    /// The fractional form used in arithmetic (`10%` -> `0.10`).
    pub fn as_decimal(&self) -> Decimal {
        self.percentage / Decimal::ONE_HUNDRED
    }
}

/// Immutable record of the money split for one finalized order.
///
/// # Invariants
///
/// - `host_earning_per_seat == base_price_per_seat`
/// - `platform_fee_amount = round(base * fee * seats, 2, HALF_UP)`
/// - All amounts are rounded to 2 decimal places
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    /// Ticket price at finalize time.
    pub base_price_per_seat: Decimal,

    /// Seats covered by the order.
    pub seats: u32,

    /// Fee rate in effect when the snapshot was taken.
    pub platform_fee_percentage: Decimal,

    /// Total platform fee across all seats.
    pub platform_fee_amount: Decimal,

    /// What the host earns per seat. Equals the base price.
    pub host_earning_per_seat: Decimal,
}

impl FinancialSnapshot {
    /// Computes the snapshot for an order.
    pub fn compute(base_price_per_seat: Decimal, seats: u32, fee: PlatformFee) -> Self {
        let seats_dec = Decimal::from(seats);
        let platform_fee_amount =
            round_half_up(base_price_per_seat * fee.as_decimal() * seats_dec);

        Self {
            base_price_per_seat,
            seats,
            platform_fee_percentage: fee.percentage(),
            platform_fee_amount,
            host_earning_per_seat: base_price_per_seat,
        }
    }

    /// Ticket revenue before fees: `base * seats`, rounded.
    pub fn gross(&self) -> Decimal {
        round_half_up(self.base_price_per_seat * Decimal::from(self.seats))
    }

    /// What the buyer owes in total: gross plus the platform fee.
    pub fn total_due(&self) -> Decimal {
        round_half_up(self.gross() + self.platform_fee_amount)
    }

    /// What the host earns across all seats.
    pub fn host_earning_total(&self) -> Decimal {
        round_half_up(self.host_earning_per_seat * Decimal::from(self.seats))
    }
}
