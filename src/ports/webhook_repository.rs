//! Webhook record repository port.
//!
//! The record is written before any processing begins and marked processed
//! at the end regardless of outcome, so every delivery leaves a trace even
//! when a later step throws.

use async_trait::async_trait;

use crate::domain::foundation::{Timestamp, WebhookId};
use crate::domain::payments::{PaymentError, PaymentWebhook};

/// Repository port for immutable webhook delivery records.
#[async_trait]
pub trait WebhookRepository: Send + Sync {
    /// Persist a freshly received delivery, unprocessed.
    async fn record(&self, webhook: &PaymentWebhook) -> Result<(), PaymentError>;

    /// Mark a delivery processed, with the outcome text when processing
    /// did not settle the order cleanly.
    async fn mark_processed(
        &self,
        id: &WebhookId,
        error: Option<String>,
    ) -> Result<(), PaymentError>;

    /// Fetch one delivery record.
    async fn find_by_id(&self, id: &WebhookId) -> Result<Option<PaymentWebhook>, PaymentError>;

    /// Delete processed records received before the cutoff.
    ///
    /// Storage hygiene only; correctness never depends on this running.
    /// Returns the number of rows removed.
    async fn purge_processed_before(&self, cutoff: Timestamp) -> Result<u64, PaymentError>;
}
