//! Payment order aggregate entity.
//!
//! A PaymentOrder tracks one payment attempt for one (event, user) pair from
//! creation through gateway settlement. Orders are never deleted; failed and
//! expired orders stay behind as audit history.
//!
//! # Design Decisions
//!
//! - **order_id doubles as gateway txnid**: the gateway echoes it back in
//!   every notification, which is how webhooks find their order.
//! - **is_final marks the authoritative paid order**: at most one order per
//!   (event, user) ever holds it, enforced by a partial unique index. Failure
//!   never claims finality.
//! - **Snapshot at finalize only**: financial fields are absent until the
//!   success path runs, then immutable forever.
//! - **Lazy expiry**: `expires_at` is checked at point of use. An expired
//!   order refuses success even if the gateway reports one.

use crate::domain::foundation::{
    DomainError, ErrorCode, EventId, OrderId, ReservationKey, StateMachine, Timestamp, UserId,
    ValidationError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{FinancialSnapshot, OrderStatus};

/// Payment order aggregate.
///
/// # Invariants
///
/// - `order_id` is globally unique
/// - `amount > 0`
/// - `financials` is `Some` if and only if the order has been finalized
///   as paid, and is never rewritten afterwards
/// - `is_final` implies `status == Paid` (or `Refunded` after a refund)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentOrder {
    /// Unique identifier, sent to the gateway verbatim as txnid.
    pub order_id: OrderId,

    /// Event being paid for.
    pub event_id: EventId,

    /// Paying user.
    pub user_id: UserId,

    /// Capacity hold this order was created from.
    pub reservation_key: ReservationKey,

    /// Amount the buyer is charged, gross plus platform fee.
    pub amount: Decimal,

    /// ISO currency code, e.g. "INR".
    pub currency: String,

    /// Where the order sits in the payment lifecycle.
    pub status: OrderStatus,

    /// Gateway identifier, e.g. "payu".
    pub provider: String,

    /// Gateway-side payment id (mihpayid), set at finalize.
    pub provider_payment_id: Option<String>,

    /// Bank reference number, set at finalize.
    pub transaction_id: Option<String>,

    /// True on the single authoritative paid order for (event, user).
    pub is_final: bool,

    /// Gateway-reported reason when the payment failed.
    pub failure_reason: Option<String>,

    /// Raw gateway notification stored at finalize for audit.
    pub gateway_response: Option<JsonValue>,

    /// Immutable money split, written once by the success path.
    pub financials: Option<FinancialSnapshot>,

    /// Gateway refund id, if the payment was later refunded.
    pub refund_id: Option<String>,

    /// Amount returned to the buyer.
    pub refund_amount: Option<Decimal>,

    /// When the refund was recorded.
    pub refunded_at: Option<Timestamp>,

    /// When the order was created.
    pub created_at: Timestamp,

    /// When the order was last updated.
    pub updated_at: Timestamp,

    /// Absolute deadline after which the order can no longer settle.
    pub expires_at: Timestamp,
}

impl PaymentOrder {
    /// Create a new order in `Created` status with a fresh order id.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `amount` is not strictly positive
    /// or `currency` is empty.
    pub fn create(
        event_id: EventId,
        user_id: UserId,
        reservation_key: ReservationKey,
        amount: Decimal,
        currency: impl Into<String>,
        provider: impl Into<String>,
        ttl_minutes: i64,
    ) -> Result<Self, ValidationError> {
        if amount <= Decimal::ZERO {
            return Err(ValidationError::invalid_format(
                "amount",
                format!("must be positive, got {}", amount),
            ));
        }
        let currency = currency.into();
        if currency.trim().is_empty() {
            return Err(ValidationError::empty_field("currency"));
        }

        let now = Timestamp::now();
        Ok(Self {
            order_id: OrderId::generate(),
            event_id,
            user_id,
            reservation_key,
            amount,
            currency,
            status: OrderStatus::Created,
            provider: provider.into(),
            provider_payment_id: None,
            transaction_id: None,
            is_final: false,
            failure_reason: None,
            gateway_response: None,
            financials: None,
            refund_id: None,
            refund_amount: None,
            refunded_at: None,
            created_at: now,
            updated_at: now,
            expires_at: now.plus_minutes(ttl_minutes),
        })
    }

    /// Whether the order's settlement deadline has passed at `now`.
    pub fn is_expired(&self, now: Timestamp) -> bool {
        !now.is_before(&self.expires_at)
    }

    /// Whether the finalize paths consider this order done.
    pub fn is_settled(&self) -> bool {
        self.status.is_settled()
    }

    /// Whether this order still occupies the one-active-order slot.
    ///
    /// Expired orders no longer block a fresh attempt even though their
    /// status string still reads created or pending.
    pub fn blocks_new_order(&self, now: Timestamp) -> bool {
        self.status.is_active() && !self.is_expired(now)
    }

    /// Record that the redirect payload was handed to the client.
    ///
    /// # Errors
    ///
    /// Returns error if the order is not in `Created` status.
    pub fn mark_pending(&mut self) -> Result<(), DomainError> {
        self.transition_to(OrderStatus::Pending)?;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Settle the order as paid with its immutable financial snapshot.
    ///
    /// The caller is responsible for the expiry and idempotency checks;
    /// this method only enforces the state machine.
    ///
    /// # Errors
    ///
    /// Returns error if the current status cannot transition to `Paid`.
    pub fn finalize_success(
        &mut self,
        snapshot: FinancialSnapshot,
        provider_payment_id: Option<String>,
        transaction_id: Option<String>,
        gateway_response: JsonValue,
    ) -> Result<(), DomainError> {
        self.transition_to(OrderStatus::Paid)?;
        self.financials = Some(snapshot);
        self.provider_payment_id = provider_payment_id;
        self.transaction_id = transaction_id;
        self.gateway_response = Some(gateway_response);
        self.is_final = true;
        self.failure_reason = None;
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Settle the order as failed with the gateway's reason.
    ///
    /// Failed orders never claim `is_final`; the slot stays open for the
    /// user's next attempt.
    ///
    /// # Errors
    ///
    /// Returns error if the current status cannot transition to `Failed`.
    pub fn finalize_failure(
        &mut self,
        reason: impl Into<String>,
        gateway_response: JsonValue,
    ) -> Result<(), DomainError> {
        self.transition_to(OrderStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        self.gateway_response = Some(gateway_response);
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Record a refund issued outside this subsystem.
    ///
    /// # Errors
    ///
    /// Returns error unless the order is currently `Paid`.
    pub fn record_refund(
        &mut self,
        refund_id: impl Into<String>,
        refund_amount: Decimal,
    ) -> Result<(), DomainError> {
        self.transition_to(OrderStatus::Refunded)?;
        self.refund_id = Some(refund_id.into());
        self.refund_amount = Some(refund_amount);
        self.refunded_at = Some(Timestamp::now());
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Transition to a new status using the state machine.
    fn transition_to(&mut self, target: OrderStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!(
                    "Cannot transition order {} from {} to {}",
                    self.order_id, self.status, target
                ),
            )
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payments::PlatformFee;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn make_order() -> PaymentOrder {
        PaymentOrder::create(
            EventId::new(),
            UserId::new(),
            ReservationKey::generate(),
            dec("330.00"),
            "INR",
            "payu",
            10,
        )
        .unwrap()
    }

    fn make_snapshot() -> FinancialSnapshot {
        let fee = PlatformFee::from_percentage(dec("10")).unwrap();
        FinancialSnapshot::compute(dec("100.00"), 3, fee)
    }

    // Construction tests

    #[test]
    fn create_starts_in_created_status() {
        let order = make_order();

        assert_eq!(order.status, OrderStatus::Created);
        assert!(!order.is_final);
        assert!(order.financials.is_none());
        assert!(order.provider_payment_id.is_none());
        assert_eq!(order.currency, "INR");
        assert_eq!(order.provider, "payu");
    }

    #[test]
    fn create_assigns_unique_order_ids() {
        assert_ne!(make_order().order_id, make_order().order_id);
    }

    #[test]
    fn create_rejects_non_positive_amount() {
        let result = PaymentOrder::create(
            EventId::new(),
            UserId::new(),
            ReservationKey::generate(),
            Decimal::ZERO,
            "INR",
            "payu",
            10,
        );
        assert!(result.is_err());

        let result = PaymentOrder::create(
            EventId::new(),
            UserId::new(),
            ReservationKey::generate(),
            dec("-5.00"),
            "INR",
            "payu",
            10,
        );
        assert!(result.is_err());
    }

    #[test]
    fn create_rejects_empty_currency() {
        let result = PaymentOrder::create(
            EventId::new(),
            UserId::new(),
            ReservationKey::generate(),
            dec("100.00"),
            "  ",
            "payu",
            10,
        );
        assert!(result.is_err());
    }

    #[test]
    fn create_sets_expiry_from_ttl() {
        let order = make_order();
        assert!(order.created_at.is_before(&order.expires_at));
        assert!(!order.is_expired(Timestamp::now()));
        assert!(order.is_expired(order.expires_at.plus_minutes(1)));
    }

    // Lifecycle tests

    #[test]
    fn mark_pending_from_created() {
        let mut order = make_order();
        assert!(order.mark_pending().is_ok());
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn mark_pending_twice_errors() {
        let mut order = make_order();
        order.mark_pending().unwrap();

        let result = order.mark_pending();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn finalize_success_sets_snapshot_and_final_flag() {
        let mut order = make_order();
        order.mark_pending().unwrap();

        let result = order.finalize_success(
            make_snapshot(),
            Some("mih-123".to_string()),
            Some("bank-456".to_string()),
            json!({"status": "success"}),
        );

        assert!(result.is_ok());
        assert_eq!(order.status, OrderStatus::Paid);
        assert!(order.is_final);
        assert_eq!(order.provider_payment_id, Some("mih-123".to_string()));
        assert_eq!(order.transaction_id, Some("bank-456".to_string()));

        let snapshot = order.financials.unwrap();
        assert_eq!(snapshot.platform_fee_amount, dec("30.00"));
        assert_eq!(snapshot.host_earning_per_seat, dec("100.00"));
    }

    #[test]
    fn finalize_success_works_directly_from_created() {
        // A webhook can land before the redirect payload is handed out.
        let mut order = make_order();
        let result = order.finalize_success(make_snapshot(), None, None, json!({}));
        assert!(result.is_ok());
        assert_eq!(order.status, OrderStatus::Paid);
    }

    #[test]
    fn finalize_success_on_paid_order_errors() {
        let mut order = make_order();
        order
            .finalize_success(make_snapshot(), None, None, json!({}))
            .unwrap();

        let result = order.finalize_success(make_snapshot(), None, None, json!({}));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().code, ErrorCode::InvalidStateTransition);
    }

    #[test]
    fn finalize_failure_records_reason_without_final_flag() {
        let mut order = make_order();
        order.mark_pending().unwrap();

        let result = order.finalize_failure("Insufficient funds", json!({"status": "failure"}));

        assert!(result.is_ok());
        assert_eq!(order.status, OrderStatus::Failed);
        assert_eq!(order.failure_reason, Some("Insufficient funds".to_string()));
        assert!(!order.is_final);
        assert!(order.financials.is_none());
    }

    #[test]
    fn failed_order_cannot_become_paid() {
        let mut order = make_order();
        order.finalize_failure("declined", json!({})).unwrap();

        let result = order.finalize_success(make_snapshot(), None, None, json!({}));
        assert!(result.is_err());
        assert_eq!(order.status, OrderStatus::Failed);
    }

    #[test]
    fn paid_order_cannot_be_demoted_to_failed() {
        let mut order = make_order();
        order
            .finalize_success(make_snapshot(), None, None, json!({}))
            .unwrap();

        let result = order.finalize_failure("late failure delivery", json!({}));
        assert!(result.is_err());
        assert_eq!(order.status, OrderStatus::Paid);
        assert!(order.is_final);
    }

    // Active-slot tests

    #[test]
    fn created_and_pending_orders_block_new_orders() {
        let now = Timestamp::now();
        let mut order = make_order();
        assert!(order.blocks_new_order(now));

        order.mark_pending().unwrap();
        assert!(order.blocks_new_order(now));
    }

    #[test]
    fn expired_pending_order_does_not_block() {
        let mut order = make_order();
        order.mark_pending().unwrap();

        let after_expiry = order.expires_at.plus_minutes(1);
        assert!(!order.blocks_new_order(after_expiry));
    }

    #[test]
    fn settled_orders_do_not_block() {
        let now = Timestamp::now();
        let mut order = make_order();
        order.finalize_failure("declined", json!({})).unwrap();
        assert!(!order.blocks_new_order(now));
    }

    // Refund tests

    #[test]
    fn paid_order_can_record_refund() {
        let mut order = make_order();
        order
            .finalize_success(make_snapshot(), None, None, json!({}))
            .unwrap();

        let result = order.record_refund("refund-789", dec("330.00"));
        assert!(result.is_ok());
        assert_eq!(order.status, OrderStatus::Refunded);
        assert_eq!(order.refund_amount, Some(dec("330.00")));
        assert!(order.refunded_at.is_some());
    }

    #[test]
    fn unpaid_order_cannot_record_refund() {
        let mut order = make_order();
        let result = order.record_refund("refund-789", dec("330.00"));
        assert!(result.is_err());
    }
}
