//! Configuration-backed fee source.
//!
//! Serves the fee rate from deployed configuration. The rate is validated
//! once at construction; `current` can no longer fail after that.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::domain::payments::{PaymentError, PlatformFee};
use crate::ports::FeeConfigSource;

/// FeeConfigSource that returns the configured rate.
pub struct ConfigFeeSource {
    fee: PlatformFee,
}

impl ConfigFeeSource {
    /// Builds the source from a configured percentage.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` when the percentage is outside 0..=100.
    pub fn from_percentage(percentage: Decimal) -> Result<Self, PaymentError> {
        let fee = PlatformFee::from_percentage(percentage)
            .map_err(|e| PaymentError::validation("platform_fee_percentage", e.to_string()))?;
        Ok(Self { fee })
    }
}

#[async_trait]
impl FeeConfigSource for ConfigFeeSource {
    async fn current(&self) -> Result<PlatformFee, PaymentError> {
        Ok(self.fee)
    }

    async fn invalidate(&self) {
        // Nothing cached; the rate changes only with a redeploy.
    }
}
