//! TTL cache decorator for a fee source.
//!
//! Keeps the last rate read from the wrapped source for a bounded time so
//! the finalize hot path does not hit the underlying store on every webhook.
//! `invalidate` drops the cached value and forwards to the inner source.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::domain::payments::{PaymentError, PlatformFee};
use crate::ports::FeeConfigSource;

/// FeeConfigSource decorator with a bounded-staleness cache.
pub struct CachedFeeSource {
    inner: Arc<dyn FeeConfigSource>,
    ttl: Duration,
    cached: Mutex<Option<(PlatformFee, Instant)>>,
}

impl CachedFeeSource {
    /// Wraps a source with the given staleness bound.
    pub fn new(inner: Arc<dyn FeeConfigSource>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            cached: Mutex::new(None),
        }
    }

    fn fresh_value(&self) -> Option<PlatformFee> {
        let guard = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        guard
            .as_ref()
            .filter(|(_, read_at)| read_at.elapsed() < self.ttl)
            .map(|(fee, _)| *fee)
    }

    fn store(&self, fee: PlatformFee) {
        let mut guard = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        *guard = Some((fee, Instant::now()));
    }
}

#[async_trait]
impl FeeConfigSource for CachedFeeSource {
    async fn current(&self) -> Result<PlatformFee, PaymentError> {
        if let Some(fee) = self.fresh_value() {
            return Ok(fee);
        }

        // Errors are passed through uncached so a transient failure does
        // not pin a stale rate in place.
        let fee = self.inner.current().await?;
        self.store(fee);
        Ok(fee)
    }

    async fn invalidate(&self) {
        {
            let mut guard = self.cached.lock().unwrap_or_else(|e| e.into_inner());
            *guard = None;
        }
        self.inner.invalidate().await;
    }
}
