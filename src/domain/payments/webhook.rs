//! Immutable webhook delivery records.
//!
//! Every inbound notification is persisted verbatim before any processing
//! starts, so no delivery is ever silently lost even when a later step
//! throws. The `processed` flag is the idempotency marker for one specific
//! delivery; the payload itself is never rewritten.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::{Timestamp, WebhookId};

/// One stored webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentWebhook {
    pub id: WebhookId,

    /// Gateway that sent the notification, e.g. "payu".
    pub provider: String,

    /// Raw form fields exactly as received.
    pub payload: JsonValue,

    /// The hash field from the payload, pulled out for triage queries.
    pub signature: Option<String>,

    /// Transaction id from the payload, when one was present.
    pub txnid: Option<String>,

    /// Whether processing has run to completion for this delivery.
    pub processed: bool,

    /// Outcome text when processing did not settle the order cleanly.
    pub processing_error: Option<String>,

    pub received_at: Timestamp,

    pub processed_at: Option<Timestamp>,
}

impl PaymentWebhook {
    /// Creates an unprocessed record for a freshly received notification.
    pub fn record(
        provider: impl Into<String>,
        payload: JsonValue,
        signature: Option<String>,
        txnid: Option<String>,
    ) -> Self {
        Self {
            id: WebhookId::new(),
            provider: provider.into(),
            payload,
            signature,
            txnid,
            processed: false,
            processing_error: None,
            received_at: Timestamp::now(),
            processed_at: None,
        }
    }

    /// Marks this delivery as processed, recording the outcome.
    ///
    /// `error` is `None` when processing settled the order (or was a clean
    /// no-op), otherwise the caught error text.
    pub fn mark_processed(&mut self, error: Option<String>) {
        self.processed = true;
        self.processing_error = error;
        self.processed_at = Some(Timestamp::now());
    }
}
