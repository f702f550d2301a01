//! Platform fee configuration port.
//!
//! The fee rate is read-mostly operational configuration. Handlers read it
//! through this port at finalize time only; the value they read is copied
//! onto the order as an immutable snapshot, so later rate changes never
//! rewrite history.
//!
//! # Design
//!
//! - **Read at finalize**: the rate is sampled once per finalization
//! - **Cache-friendly**: implementations may serve a bounded-staleness value

use crate::domain::payments::{PaymentError, PlatformFee};
use async_trait::async_trait;

/// Port for reading the current platform fee rate.
#[async_trait]
pub trait FeeConfigSource: Send + Sync {
    /// The platform fee rate in effect right now.
    ///
    /// Implementations may return a cached value within their staleness
    /// bound; callers must treat the result as a point-in-time sample.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Infrastructure` when the rate cannot be read.
    async fn current(&self) -> Result<PlatformFee, PaymentError>;

    /// Drop any cached value so the next `current` re-reads the source.
    ///
    /// Non-caching implementations may make this a no-op.
    async fn invalidate(&self);
}
