//! In-memory implementation of the payment storage ports.
//!
//! One mutex guards the whole state, so each port call is atomic the same
//! way one Postgres transaction is. The commit methods mirror the real
//! store's re-check discipline: settled orders no-op, a final sibling
//! aborts with `DuplicateFinal`.
//!
//! # Note
//!
//! Lock accesses use `.expect()`, which panics if the mutex is poisoned.
//! Fine for tests and development wiring; deployments use the Postgres
//! adapters.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::domain::foundation::{EventId, OrderId, ReservationKey, Timestamp, UserId, WebhookId};
use crate::domain::payments::{
    Attendee, CapacityReservation, PaymentError, PaymentOrder, PaymentTransaction, PaymentWebhook,
};
use crate::ports::{
    AttendanceLedger, CommitOutcome, EventCatalog, EventListing, FailureCommit, PaymentOrderStore,
    ReservationRepository, SuccessCommit, WebhookRepository,
};

#[derive(Default)]
struct StoreState {
    listings: HashMap<EventId, EventListing>,
    orders: HashMap<String, PaymentOrder>,
    reservations: HashMap<String, CapacityReservation>,
    webhooks: HashMap<WebhookId, PaymentWebhook>,
    attendees: HashMap<(EventId, UserId), Attendee>,
    transactions: Vec<PaymentTransaction>,
}

/// In-memory store implementing every payment storage port.
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(StoreState::default()),
        }
    }

    /// Seeds an event listing for the catalog side.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn add_listing(&self, listing: EventListing) {
        let mut state = self.lock();
        state.listings.insert(listing.id, listing);
    }

    /// Returns a stored order by id (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn order(&self, order_id: &OrderId) -> Option<PaymentOrder> {
        self.lock().orders.get(order_id.as_str()).cloned()
    }

    /// Returns a stored reservation by key (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn reservation(&self, key: &ReservationKey) -> Option<CapacityReservation> {
        self.lock().reservations.get(key.as_str()).cloned()
    }

    /// Returns all stored webhook records (for test assertions).
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn webhooks(&self) -> Vec<PaymentWebhook> {
        self.lock().webhooks.values().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().expect("MemoryStore: lock poisoned")
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentOrderStore for MemoryStore {
    async fn insert(&self, order: &PaymentOrder) -> Result<(), PaymentError> {
        let mut state = self.lock();
        let now = Timestamp::now();

        let existing = state.orders.values().find(|candidate| {
            candidate.event_id == order.event_id
                && candidate.user_id == order.user_id
                && candidate.blocks_new_order(now)
        });
        if let Some(existing) = existing {
            return Err(PaymentError::duplicate_active_order(
                existing.order_id.clone(),
            ));
        }

        state
            .orders
            .insert(order.order_id.as_str().to_string(), order.clone());
        Ok(())
    }

    async fn find_by_order_id(
        &self,
        order_id: &str,
    ) -> Result<Option<PaymentOrder>, PaymentError> {
        Ok(self.lock().orders.get(order_id).cloned())
    }

    async fn find_active_for(
        &self,
        event_id: &EventId,
        user_id: &UserId,
        now: Timestamp,
    ) -> Result<Option<PaymentOrder>, PaymentError> {
        Ok(self
            .lock()
            .orders
            .values()
            .find(|order| {
                order.event_id == *event_id
                    && order.user_id == *user_id
                    && order.blocks_new_order(now)
            })
            .cloned())
    }

    async fn mark_pending(&self, order_id: &OrderId) -> Result<(), PaymentError> {
        let mut state = self.lock();
        if let Some(order) = state.orders.get_mut(order_id.as_str()) {
            // No-op when the order already moved past created.
            let _ = order.mark_pending();
        }
        Ok(())
    }

    async fn commit_success(&self, commit: SuccessCommit) -> Result<CommitOutcome, PaymentError> {
        let mut state = self.lock();
        let order = &commit.order;

        let Some(stored) = state.orders.get(order.order_id.as_str()) else {
            return Err(PaymentError::order_not_found(order.order_id.as_str()));
        };
        if stored.is_settled() {
            return Ok(CommitOutcome::AlreadySettled);
        }

        let final_sibling = state.orders.values().any(|candidate| {
            candidate.event_id == order.event_id
                && candidate.user_id == order.user_id
                && candidate.is_final
                && candidate.order_id != order.order_id
        });
        if final_sibling {
            return Ok(CommitOutcome::DuplicateFinal);
        }

        state
            .orders
            .insert(order.order_id.as_str().to_string(), order.clone());
        state.transactions.push(commit.transaction.clone());
        state.attendees.insert(
            (commit.attendee.event_id, commit.attendee.user_id),
            commit.attendee.clone(),
        );
        if let Some(reservation) = state.reservations.get_mut(commit.reservation_key.as_str()) {
            reservation.consume();
        }

        Ok(CommitOutcome::Applied)
    }

    async fn commit_failure(&self, commit: FailureCommit) -> Result<CommitOutcome, PaymentError> {
        let mut state = self.lock();
        let order = &commit.order;

        let Some(stored) = state.orders.get(order.order_id.as_str()) else {
            return Err(PaymentError::order_not_found(order.order_id.as_str()));
        };
        if stored.is_settled() {
            return Ok(CommitOutcome::AlreadySettled);
        }

        state
            .orders
            .insert(order.order_id.as_str().to_string(), order.clone());
        state.transactions.push(commit.transaction.clone());

        Ok(CommitOutcome::Applied)
    }

    async fn transactions_for(
        &self,
        order_id: &OrderId,
    ) -> Result<Vec<PaymentTransaction>, PaymentError> {
        Ok(self
            .lock()
            .transactions
            .iter()
            .filter(|row| row.order_id == *order_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ReservationRepository for MemoryStore {
    async fn upsert_active(&self, reservation: &CapacityReservation) -> Result<(), PaymentError> {
        let mut state = self.lock();

        // Supersede the user's live unconsumed hold for this event, if any.
        let superseded: Option<String> = state
            .reservations
            .iter()
            .find(|(_, held)| {
                !held.consumed
                    && held.event_id == reservation.event_id
                    && held.user_id == reservation.user_id
            })
            .map(|(key, _)| key.clone());
        if let Some(key) = superseded {
            state.reservations.remove(&key);
        }

        state.reservations.insert(
            reservation.key.as_str().to_string(),
            reservation.clone(),
        );
        Ok(())
    }

    async fn find_by_key(
        &self,
        key: &ReservationKey,
    ) -> Result<Option<CapacityReservation>, PaymentError> {
        Ok(self.lock().reservations.get(key.as_str()).cloned())
    }

    async fn find_unconsumed_for(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Option<CapacityReservation>, PaymentError> {
        Ok(self
            .lock()
            .reservations
            .values()
            .find(|held| {
                !held.consumed && held.event_id == *event_id && held.user_id == *user_id
            })
            .cloned())
    }
}

#[async_trait]
impl WebhookRepository for MemoryStore {
    async fn record(&self, webhook: &PaymentWebhook) -> Result<(), PaymentError> {
        self.lock().webhooks.insert(webhook.id, webhook.clone());
        Ok(())
    }

    async fn mark_processed(
        &self,
        id: &WebhookId,
        error: Option<String>,
    ) -> Result<(), PaymentError> {
        let mut state = self.lock();
        let Some(webhook) = state.webhooks.get_mut(id) else {
            return Err(PaymentError::infrastructure(format!(
                "No webhook record with id {}",
                id
            )));
        };
        webhook.mark_processed(error);
        Ok(())
    }

    async fn find_by_id(&self, id: &WebhookId) -> Result<Option<PaymentWebhook>, PaymentError> {
        Ok(self.lock().webhooks.get(id).cloned())
    }

    async fn purge_processed_before(&self, cutoff: Timestamp) -> Result<u64, PaymentError> {
        let mut state = self.lock();
        let before = state.webhooks.len();
        state
            .webhooks
            .retain(|_, webhook| !(webhook.processed && webhook.received_at.is_before(&cutoff)));
        Ok((before - state.webhooks.len()) as u64)
    }
}

#[async_trait]
impl AttendanceLedger for MemoryStore {
    async fn going_count(&self, event_id: &EventId) -> Result<u32, PaymentError> {
        Ok(self
            .lock()
            .attendees
            .values()
            .filter(|attendee| attendee.event_id == *event_id && attendee.paid)
            .map(|attendee| attendee.seats)
            .sum())
    }

    async fn find(
        &self,
        event_id: &EventId,
        user_id: &UserId,
    ) -> Result<Option<Attendee>, PaymentError> {
        Ok(self.lock().attendees.get(&(*event_id, *user_id)).cloned())
    }
}

#[async_trait]
impl EventCatalog for MemoryStore {
    async fn find_listing(
        &self,
        event_id: &EventId,
    ) -> Result<Option<EventListing>, PaymentError> {
        Ok(self.lock().listings.get(event_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payments::{FinancialSnapshot, PlatformFee};
    use rust_decimal::Decimal;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn make_order(event_id: EventId, user_id: UserId) -> PaymentOrder {
        PaymentOrder::create(
            event_id,
            user_id,
            ReservationKey::generate(),
            dec("330.00"),
            "INR",
            "payu",
            10,
        )
        .unwrap()
    }

    /// Finalizes a copy of `order` and wraps it with its write-set.
    fn success_commit(order: &PaymentOrder, seats: u32) -> SuccessCommit {
        let fee = PlatformFee::from_percentage(dec("10")).unwrap();
        let snapshot = FinancialSnapshot::compute(dec("100.00"), seats, fee);
        let mut paid = order.clone();
        paid.finalize_success(
            snapshot.clone(),
            Some("mih-100".to_string()),
            None,
            serde_json::json!({"status": "success"}),
        )
        .unwrap();
        SuccessCommit {
            transaction: PaymentTransaction::completed_payment(
                paid.order_id.clone(),
                paid.amount,
                Some("mih-100".to_string()),
            ),
            attendee: Attendee::fulfilled(
                paid.event_id,
                paid.user_id,
                paid.order_id.clone(),
                seats,
                snapshot.gross(),
                snapshot.platform_fee_amount,
            ),
            reservation_key: paid.reservation_key.clone(),
            order: paid,
        }
    }

    #[tokio::test]
    async fn insert_rejects_second_active_order_for_pair() {
        let store = MemoryStore::new();
        let event_id = EventId::new();
        let user_id = UserId::new();

        let first = make_order(event_id, user_id);
        store.insert(&first).await.unwrap();

        let second = make_order(event_id, user_id);
        let result = store.insert(&second).await;

        assert!(matches!(
            result,
            Err(PaymentError::DuplicateActiveOrder { existing_order_id })
                if existing_order_id == first.order_id
        ));
    }

    #[tokio::test]
    async fn commit_success_applies_full_write_set() {
        let store = MemoryStore::new();
        let event_id = EventId::new();
        let user_id = UserId::new();

        let reservation = CapacityReservation::create(event_id, user_id, 3, 15).unwrap();
        store.upsert_active(&reservation).await.unwrap();

        let order = PaymentOrder::create(
            event_id,
            user_id,
            reservation.key.clone(),
            dec("330.00"),
            "INR",
            "payu",
            10,
        )
        .unwrap();
        store.insert(&order).await.unwrap();

        let outcome = store
            .commit_success(success_commit(&order, 3))
            .await
            .unwrap();

        assert_eq!(outcome, CommitOutcome::Applied);
        let stored = store.order(&order.order_id).unwrap();
        assert!(stored.is_final);
        assert!(stored.is_settled());
        assert_eq!(
            store.transactions_for(&order.order_id).await.unwrap().len(),
            1
        );
        assert!(store.reservation(&reservation.key).unwrap().consumed);
        assert_eq!(store.going_count(&event_id).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn replayed_success_commit_is_a_noop() {
        let store = MemoryStore::new();
        let order = make_order(EventId::new(), UserId::new());
        store.insert(&order).await.unwrap();

        let first = store
            .commit_success(success_commit(&order, 3))
            .await
            .unwrap();
        let replay = store
            .commit_success(success_commit(&order, 3))
            .await
            .unwrap();

        assert_eq!(first, CommitOutcome::Applied);
        assert_eq!(replay, CommitOutcome::AlreadySettled);
        assert_eq!(
            store.transactions_for(&order.order_id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn concurrent_commits_for_two_orders_leave_one_final() {
        let store = MemoryStore::new();
        let event_id = EventId::new();
        let user_id = UserId::new();

        // An expired order stops blocking the slot, so a second one can
        // open; a late success delivery for the stale order then races
        // the fresh order's delivery.
        let stale = PaymentOrder::create(
            event_id,
            user_id,
            ReservationKey::generate(),
            dec("330.00"),
            "INR",
            "payu",
            0,
        )
        .unwrap();
        store.insert(&stale).await.unwrap();
        let fresh = make_order(event_id, user_id);
        store.insert(&fresh).await.unwrap();

        let (left, right) = futures::future::join(
            store.commit_success(success_commit(&stale, 3)),
            store.commit_success(success_commit(&fresh, 3)),
        )
        .await;

        let outcomes = [left.unwrap(), right.unwrap()];
        assert!(outcomes.contains(&CommitOutcome::Applied));
        assert!(outcomes.contains(&CommitOutcome::DuplicateFinal));

        let stale_final = store.order(&stale.order_id).unwrap().is_final;
        let fresh_final = store.order(&fresh.order_id).unwrap().is_final;
        assert!(stale_final != fresh_final);
    }

    #[tokio::test]
    async fn upsert_supersedes_live_hold() {
        let store = MemoryStore::new();
        let event_id = EventId::new();
        let user_id = UserId::new();

        let first = CapacityReservation::create(event_id, user_id, 2, 15).unwrap();
        store.upsert_active(&first).await.unwrap();

        let second = CapacityReservation::create(event_id, user_id, 3, 15).unwrap();
        store.upsert_active(&second).await.unwrap();

        assert!(store.find_by_key(&first.key).await.unwrap().is_none());
        let live = store
            .find_unconsumed_for(&event_id, &user_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(live.key, second.key);
        assert_eq!(live.seats_reserved, 3);
    }

    #[tokio::test]
    async fn upsert_leaves_consumed_holds_in_place() {
        let store = MemoryStore::new();
        let event_id = EventId::new();
        let user_id = UserId::new();

        let mut first = CapacityReservation::create(event_id, user_id, 2, 15).unwrap();
        first.consume();
        store.upsert_active(&first).await.unwrap();

        let second = CapacityReservation::create(event_id, user_id, 3, 15).unwrap();
        store.upsert_active(&second).await.unwrap();

        // Consumed history stays; only the live hold is superseded.
        assert!(store.find_by_key(&first.key).await.unwrap().is_some());
        assert!(store.find_by_key(&second.key).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn going_count_sums_paid_attendee_seats() {
        let store = MemoryStore::new();
        let event_id = EventId::new();

        let first = Attendee::fulfilled(
            event_id,
            UserId::new(),
            OrderId::generate(),
            3,
            dec("300.00"),
            dec("30.00"),
        );
        let second = Attendee::fulfilled(
            event_id,
            UserId::new(),
            OrderId::generate(),
            2,
            dec("200.00"),
            dec("20.00"),
        );
        {
            let mut state = store.lock();
            state
                .attendees
                .insert((first.event_id, first.user_id), first);
            state
                .attendees
                .insert((second.event_id, second.user_id), second);
        }

        assert_eq!(store.going_count(&event_id).await.unwrap(), 5);
        assert_eq!(store.going_count(&EventId::new()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn purge_removes_only_processed_records_before_cutoff() {
        let store = MemoryStore::new();

        let mut processed = PaymentWebhook::record("payu", serde_json::json!({}), None, None);
        processed.mark_processed(None);
        let unprocessed = PaymentWebhook::record("payu", serde_json::json!({}), None, None);
        store.record(&processed).await.unwrap();
        store.record(&unprocessed).await.unwrap();

        let removed = store
            .purge_processed_before(Timestamp::now().plus_minutes(1))
            .await
            .unwrap();

        assert_eq!(removed, 1);
        assert!(store.find_by_id(&processed.id).await.unwrap().is_none());
        assert!(store.find_by_id(&unprocessed.id).await.unwrap().is_some());
    }
}
