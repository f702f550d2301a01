//! ProcessWebhookHandler - Command handler for asynchronous gateway
//! notifications, including the finalize-success and finalize-failure
//! settlement algorithms.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use crate::domain::foundation::{
    EventMetadata, OrderId, SerializableDomainEvent, Timestamp, WebhookId,
};
use crate::domain::payments::{
    Attendee, FinancialSnapshot, GatewayNotification, PaymentError, PaymentEvent, PaymentOrder,
    PaymentTransaction, PaymentWebhook,
};
use crate::ports::{
    CommitOutcome, EventCatalog, EventPublisher, FailureCommit, FeeConfigSource, PaymentGateway,
    PaymentOrderStore, ReservationRepository, SuccessCommit, WebhookRepository,
};

/// Command carrying one inbound gateway notification, form fields verbatim.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    pub form: HashMap<String, String>,
}

/// What processing one delivery did to the order.
#[derive(Debug, Clone)]
pub enum ProcessWebhookResult {
    /// The order settled as paid and fulfillment was written.
    Captured { order: PaymentOrder },

    /// The order settled as failed with a recorded reason.
    Failed { order: PaymentOrder },

    /// The order was already settled; this delivery changed nothing.
    AlreadySettled { order_id: OrderId },

    /// No order matches the notification's txnid; logged and dropped.
    OrderMissing { txnid: String },
}

/// Handler for inbound payment webhooks.
///
/// The raw payload is persisted before anything else, so no delivery is ever
/// lost to a later error. Verification is all-or-nothing: a notification
/// whose reverse hash does not check out cannot touch order state. Every
/// settle path re-reads the order's persisted status inside the store's
/// atomic commit, which makes redelivery of any notification a no-op.
pub struct ProcessWebhookHandler {
    webhooks: Arc<dyn WebhookRepository>,
    store: Arc<dyn PaymentOrderStore>,
    reservations: Arc<dyn ReservationRepository>,
    catalog: Arc<dyn EventCatalog>,
    fees: Arc<dyn FeeConfigSource>,
    gateway: Arc<dyn PaymentGateway>,
    event_publisher: Arc<dyn EventPublisher>,
}

impl ProcessWebhookHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        webhooks: Arc<dyn WebhookRepository>,
        store: Arc<dyn PaymentOrderStore>,
        reservations: Arc<dyn ReservationRepository>,
        catalog: Arc<dyn EventCatalog>,
        fees: Arc<dyn FeeConfigSource>,
        gateway: Arc<dyn PaymentGateway>,
        event_publisher: Arc<dyn EventPublisher>,
    ) -> Self {
        Self {
            webhooks,
            store,
            reservations,
            catalog,
            fees,
            gateway,
            event_publisher,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<ProcessWebhookResult, PaymentError> {
        // 1. Persist the delivery verbatim before any processing
        let payload = serde_json::to_value(&cmd.form).unwrap_or(JsonValue::Null);
        let webhook = PaymentWebhook::record(
            self.gateway.provider(),
            payload,
            cmd.form.get("hash").cloned(),
            cmd.form.get("txnid").cloned(),
        );
        self.webhooks.record(&webhook).await?;

        // 2. Validate required fields; a payload without txnid never reaches
        //    the order lookup
        let notification = match GatewayNotification::parse(&cmd.form) {
            Ok(notification) => notification,
            Err(err) => {
                let reason = err.to_string();
                self.mark_processed(&webhook.id, Some(reason.clone())).await;
                return Err(PaymentError::malformed_webhook(err.field(), reason));
            }
        };

        // 3. Unknown txnid is a terminal, logged outcome
        let order = match self.store.find_by_order_id(&notification.txnid).await? {
            Some(order) => order,
            None => {
                tracing::warn!(txnid = %notification.txnid, "webhook references unknown order");
                self.mark_processed(
                    &webhook.id,
                    Some(format!("no order for txnid {}", notification.txnid)),
                )
                .await;
                return Ok(ProcessWebhookResult::OrderMissing {
                    txnid: notification.txnid,
                });
            }
        };

        // 4. Authenticate before any mutation
        if let Err(err) = self.gateway.verify_notification(&notification) {
            self.mark_processed(&webhook.id, Some("hash mismatch".to_string()))
                .await;
            return Err(err);
        }

        // 5. Settle one way or the other
        let outcome = if notification.is_success() {
            self.settle_success(order, &notification).await
        } else {
            self.settle_failure(order, notification.failure_reason(), &notification)
                .await
        };

        // 6. The delivery is processed either way; errors ride on the record
        match outcome {
            Ok(result) => {
                self.mark_processed(&webhook.id, None).await;
                Ok(result)
            }
            Err(err) => {
                self.mark_processed(&webhook.id, Some(err.to_string())).await;
                Err(err)
            }
        }
    }

    /// The finalize-success settlement path.
    ///
    /// Builds the full paid write-set (order with snapshot, ledger row,
    /// fulfillment record, reservation consumption) and hands it to the
    /// store's atomic commit, which re-reads the persisted status and
    /// enforces the single-final-order rule before applying anything.
    async fn settle_success(
        &self,
        mut order: PaymentOrder,
        notification: &GatewayNotification,
    ) -> Result<ProcessWebhookResult, PaymentError> {
        if order.is_settled() {
            return Ok(ProcessWebhookResult::AlreadySettled {
                order_id: order.order_id,
            });
        }

        // An expired order fails even when the gateway reports success;
        // state integrity beats edge-case revenue capture here.
        if order.is_expired(Timestamp::now()) {
            return self
                .settle_failure(
                    order,
                    "order expired before payment confirmation".to_string(),
                    notification,
                )
                .await;
        }

        let reservation = self
            .reservations
            .find_by_key(&order.reservation_key)
            .await?
            .ok_or_else(|| {
                PaymentError::invalid_reservation(
                    order.reservation_key.clone(),
                    "reservation missing at finalize",
                )
            })?;

        let listing = self
            .catalog
            .find_listing(&order.event_id)
            .await?
            .ok_or_else(|| PaymentError::event_not_found(order.event_id))?;

        // Snapshot the financials now; later fee changes never touch this order
        let fee = self.fees.current().await?;
        let snapshot =
            FinancialSnapshot::compute(listing.ticket_price, reservation.seats_reserved, fee);

        let raw = serde_json::to_value(notification).unwrap_or(JsonValue::Null);
        order
            .finalize_success(
                snapshot.clone(),
                notification.mihpayid.clone(),
                notification.bank_ref_num.clone(),
                raw,
            )
            .map_err(PaymentError::from)?;

        let transaction = PaymentTransaction::completed_payment(
            order.order_id.clone(),
            order.amount,
            notification.mihpayid.clone(),
        );
        let attendee = Attendee::fulfilled(
            order.event_id,
            order.user_id,
            order.order_id.clone(),
            reservation.seats_reserved,
            snapshot.gross(),
            snapshot.platform_fee_amount,
        );

        let commit = SuccessCommit {
            order: order.clone(),
            transaction,
            attendee,
            reservation_key: order.reservation_key.clone(),
        };

        match self.store.commit_success(commit).await? {
            CommitOutcome::Applied => {
                self.publish_captured(&order, reservation.seats_reserved, &snapshot)
                    .await;
                Ok(ProcessWebhookResult::Captured { order })
            }
            CommitOutcome::AlreadySettled => Ok(ProcessWebhookResult::AlreadySettled {
                order_id: order.order_id,
            }),
            CommitOutcome::DuplicateFinal => {
                Err(PaymentError::duplicate_final_order(order.event_id))
            }
        }
    }

    /// The finalize-failure settlement path.
    ///
    /// Records the failure and its ledger row. The reservation is left
    /// untouched; it lapses on its own TTL so the user can retry cleanly.
    async fn settle_failure(
        &self,
        mut order: PaymentOrder,
        reason: String,
        notification: &GatewayNotification,
    ) -> Result<ProcessWebhookResult, PaymentError> {
        if order.is_settled() {
            return Ok(ProcessWebhookResult::AlreadySettled {
                order_id: order.order_id,
            });
        }

        let raw = serde_json::to_value(notification).unwrap_or(JsonValue::Null);
        order
            .finalize_failure(reason.clone(), raw)
            .map_err(PaymentError::from)?;

        let transaction = PaymentTransaction::failed_payment(order.order_id.clone(), order.amount);
        let commit = FailureCommit {
            order: order.clone(),
            transaction,
        };

        match self.store.commit_failure(commit).await? {
            CommitOutcome::Applied => {
                self.publish_failed(&order, reason).await;
                Ok(ProcessWebhookResult::Failed { order })
            }
            CommitOutcome::AlreadySettled => Ok(ProcessWebhookResult::AlreadySettled {
                order_id: order.order_id,
            }),
            CommitOutcome::DuplicateFinal => {
                Err(PaymentError::duplicate_final_order(order.event_id))
            }
        }
    }

    async fn publish_captured(&self, order: &PaymentOrder, seats: u32, snapshot: &FinancialSnapshot) {
        let event = PaymentEvent::PaymentCaptured {
            order_id: order.order_id.clone(),
            event_id: order.event_id,
            user_id: order.user_id,
            seats,
            amount: order.amount,
            platform_fee_amount: snapshot.platform_fee_amount,
            occurred_at: Timestamp::now(),
        };
        let envelope = event
            .to_envelope()
            .with_metadata(EventMetadata::for_user(order.user_id.to_string()));
        if let Err(err) = self.event_publisher.publish(envelope).await {
            tracing::warn!(error = %err, "failed to publish payment captured event");
        }
    }

    async fn publish_failed(&self, order: &PaymentOrder, reason: String) {
        let event = PaymentEvent::PaymentFailed {
            order_id: order.order_id.clone(),
            event_id: order.event_id,
            user_id: order.user_id,
            reason,
            occurred_at: Timestamp::now(),
        };
        let envelope = event
            .to_envelope()
            .with_metadata(EventMetadata::for_user(order.user_id.to_string()));
        if let Err(err) = self.event_publisher.publish(envelope).await {
            tracing::warn!(error = %err, "failed to publish payment failed event");
        }
    }

    async fn mark_processed(&self, id: &WebhookId, error: Option<String>) {
        if let Err(err) = self.webhooks.mark_processed(id, error).await {
            tracing::error!(error = %err, webhook_id = %id, "failed to mark webhook processed");
        }
    }
}
