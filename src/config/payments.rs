//! Payment lifecycle configuration

use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;

use super::error::ValidationError;

/// Tunables for the order lifecycle
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentsConfig {
    /// ISO currency code charged by the platform
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Minutes a capacity reservation stays claimable
    #[serde(default = "default_reservation_ttl")]
    pub reservation_ttl_minutes: i64,

    /// Minutes an order may sit unpaid before it expires
    #[serde(default = "default_order_ttl")]
    pub order_ttl_minutes: i64,

    /// Platform fee charged on top of the ticket price, in percent
    #[serde(with = "rust_decimal::serde::str", default = "default_fee_percentage")]
    pub platform_fee_percentage: Decimal,

    /// Minutes the cached fee percentage stays fresh
    #[serde(default = "default_fee_cache_ttl")]
    pub fee_cache_ttl_minutes: i64,
}

impl PaymentsConfig {
    /// How long cached fee configuration stays fresh.
    pub fn fee_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.fee_cache_ttl_minutes.max(0) as u64 * 60)
    }

    /// Validate payment configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.currency.is_empty() {
            return Err(ValidationError::InvalidCurrency);
        }
        if self.reservation_ttl_minutes <= 0 {
            return Err(ValidationError::InvalidTtl("reservation_ttl_minutes"));
        }
        if self.order_ttl_minutes <= 0 {
            return Err(ValidationError::InvalidTtl("order_ttl_minutes"));
        }
        if self.fee_cache_ttl_minutes <= 0 {
            return Err(ValidationError::InvalidTtl("fee_cache_ttl_minutes"));
        }
        if self.platform_fee_percentage < Decimal::ZERO
            || self.platform_fee_percentage > Decimal::new(100, 0)
        {
            return Err(ValidationError::InvalidFeePercentage);
        }
        Ok(())
    }
}

impl Default for PaymentsConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            reservation_ttl_minutes: default_reservation_ttl(),
            order_ttl_minutes: default_order_ttl(),
            platform_fee_percentage: default_fee_percentage(),
            fee_cache_ttl_minutes: default_fee_cache_ttl(),
        }
    }
}

fn default_currency() -> String {
    "INR".to_string()
}

fn default_reservation_ttl() -> i64 {
    15
}

fn default_order_ttl() -> i64 {
    10
}

fn default_fee_percentage() -> Decimal {
    Decimal::new(10, 0)
}

fn default_fee_cache_ttl() -> i64 {
    60
}
