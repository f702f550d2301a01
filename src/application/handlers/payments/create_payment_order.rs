//! CreatePaymentOrderHandler - Command handler for opening a payment order
//! and building its signed gateway redirect.

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::foundation::{
    CallerIdentity, EventId, EventMetadata, ReservationKey, SerializableDomainEvent, Timestamp,
};
use crate::domain::payments::{PaymentError, PaymentEvent, PaymentOrder};
use crate::ports::{
    EventCatalog, EventPublisher, PaymentGateway, PaymentOrderStore, RedirectPayload,
    RedirectRequest, ReservationRepository,
};

/// Command to open a payment order against a held reservation.
///
/// The contact fields ride along to the gateway's hosted page; firstname and
/// email also feed the request hash, so they are required here.
#[derive(Debug, Clone)]
pub struct CreatePaymentOrderCommand {
    pub caller: CallerIdentity,
    pub event_id: EventId,
    pub amount: Decimal,
    pub reservation_key: ReservationKey,
    pub firstname: String,
    pub email: String,
    pub phone: String,
}

/// Result of successful order creation.
#[derive(Debug, Clone)]
pub struct CreatePaymentOrderResult {
    pub order: PaymentOrder,
    pub redirect: RedirectPayload,
}

/// Handler for creating payment orders.
///
/// Enforces the one-active-order rule per (event, user): while an unexpired
/// created/pending order exists, a second create is rejected with a conflict
/// that cites the existing order id so the caller can resume it. The order
/// leaves this handler in `pending` with its redirect payload attached.
pub struct CreatePaymentOrderHandler {
    store: Arc<dyn PaymentOrderStore>,
    reservations: Arc<dyn ReservationRepository>,
    catalog: Arc<dyn EventCatalog>,
    gateway: Arc<dyn PaymentGateway>,
    event_publisher: Arc<dyn EventPublisher>,
    currency: String,
    ttl_minutes: i64,
}

impl CreatePaymentOrderHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn PaymentOrderStore>,
        reservations: Arc<dyn ReservationRepository>,
        catalog: Arc<dyn EventCatalog>,
        gateway: Arc<dyn PaymentGateway>,
        event_publisher: Arc<dyn EventPublisher>,
        currency: impl Into<String>,
        ttl_minutes: i64,
    ) -> Self {
        Self {
            store,
            reservations,
            catalog,
            gateway,
            event_publisher,
            currency: currency.into(),
            ttl_minutes,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreatePaymentOrderCommand,
    ) -> Result<CreatePaymentOrderResult, PaymentError> {
        // 1. Only the customer identity may pay, enforced here and not in UI
        if !cmd.caller.is_customer() {
            return Err(PaymentError::customer_identity_required());
        }

        // 2. Cheap field validation before any I/O
        if cmd.amount <= Decimal::ZERO {
            return Err(PaymentError::validation(
                "amount",
                format!("must be positive, got {}", cmd.amount),
            ));
        }
        for (field, value) in [
            ("firstname", &cmd.firstname),
            ("email", &cmd.email),
            ("phone", &cmd.phone),
        ] {
            if value.trim().is_empty() {
                return Err(PaymentError::validation(field, "must not be blank"));
            }
        }

        // 3. The event must exist and require payment
        let listing = self
            .catalog
            .find_listing(&cmd.event_id)
            .await?
            .ok_or_else(|| PaymentError::event_not_found(cmd.event_id))?;
        if !listing.is_paid {
            return Err(PaymentError::event_not_payable(cmd.event_id));
        }

        // 4. One active order per (event, user); cite the blocker on conflict
        let now = Timestamp::now();
        if let Some(existing) = self
            .store
            .find_active_for(&cmd.event_id, &cmd.caller.user_id, now)
            .await?
        {
            if existing.blocks_new_order(now) {
                return Err(PaymentError::duplicate_active_order(existing.order_id));
            }
        }

        // 5. The reservation must exist, belong to this caller, and be usable
        let reservation = self
            .reservations
            .find_by_key(&cmd.reservation_key)
            .await?
            .ok_or_else(|| PaymentError::reservation_not_found(cmd.reservation_key.clone()))?;
        if !reservation.belongs_to(&cmd.event_id, &cmd.caller.user_id) {
            return Err(PaymentError::invalid_reservation(
                cmd.reservation_key.clone(),
                "reservation belongs to a different event or user",
            ));
        }
        if reservation.consumed {
            return Err(PaymentError::invalid_reservation(
                cmd.reservation_key.clone(),
                "reservation was already consumed by a payment",
            ));
        }
        if reservation.is_expired(now) {
            return Err(PaymentError::invalid_reservation(
                cmd.reservation_key.clone(),
                "reservation has expired; request a new one",
            ));
        }

        // 6. Open the order; the store re-checks the active slot on insert
        let mut order = PaymentOrder::create(
            cmd.event_id,
            cmd.caller.user_id,
            cmd.reservation_key.clone(),
            cmd.amount,
            self.currency.clone(),
            self.gateway.provider(),
            self.ttl_minutes,
        )?;
        self.store.insert(&order).await?;

        // 7. Sign the redirect; the hash never comes from the client
        let redirect = self.gateway.build_redirect(RedirectRequest {
            txnid: order.order_id.as_str().to_string(),
            amount: order.amount,
            productinfo: listing.title.clone(),
            firstname: cmd.firstname.clone(),
            email: cmd.email.clone(),
            phone: cmd.phone.clone(),
        });

        // 8. The redirect is out the door, so the order is now pending
        order.mark_pending().map_err(PaymentError::from)?;
        self.store.mark_pending(&order.order_id).await?;

        // 9. Emit order-created; publish failures never fail the order
        let event = PaymentEvent::OrderCreated {
            order_id: order.order_id.clone(),
            event_id: order.event_id,
            user_id: order.user_id,
            amount: order.amount,
            currency: order.currency.clone(),
            occurred_at: Timestamp::now(),
        };
        let envelope = event
            .to_envelope()
            .with_metadata(EventMetadata::for_user(cmd.caller.user_id.to_string()));
        if let Err(err) = self.event_publisher.publish(envelope).await {
            tracing::warn!(error = %err, "failed to publish order created event");
        }

        Ok(CreatePaymentOrderResult { order, redirect })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{DomainError, EventEnvelope, OrderId, UserId};
    use crate::domain::payments::{
        CapacityReservation, GatewayNotification, OrderStatus, PaymentTransaction,
    };
    use crate::ports::{CommitOutcome, EventListing, FailureCommit, SuccessCommit};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // ════════════════════════════════════════════════════════════════════════════
    // Mock Implementations
    // ════════════════════════════════════════════════════════════════════════════

    struct MockOrderStore {
        inserted: Mutex<Vec<PaymentOrder>>,
        marked_pending: Mutex<Vec<OrderId>>,
        active: Mutex<Option<PaymentOrder>>,
    }

    impl MockOrderStore {
        fn new() -> Self {
            Self {
                inserted: Mutex::new(Vec::new()),
                marked_pending: Mutex::new(Vec::new()),
                active: Mutex::new(None),
            }
        }

        fn with_active(order: PaymentOrder) -> Self {
            Self {
                inserted: Mutex::new(Vec::new()),
                marked_pending: Mutex::new(Vec::new()),
                active: Mutex::new(Some(order)),
            }
        }

        fn inserted(&self) -> Vec<PaymentOrder> {
            self.inserted.lock().unwrap().clone()
        }

        fn marked_pending(&self) -> Vec<OrderId> {
            self.marked_pending.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PaymentOrderStore for MockOrderStore {
        async fn insert(&self, order: &PaymentOrder) -> Result<(), PaymentError> {
            self.inserted.lock().unwrap().push(order.clone());
            Ok(())
        }

        async fn find_by_order_id(
            &self,
            _order_id: &str,
        ) -> Result<Option<PaymentOrder>, PaymentError> {
            Ok(None)
        }

        async fn find_active_for(
            &self,
            _event_id: &EventId,
            _user_id: &UserId,
            _now: Timestamp,
        ) -> Result<Option<PaymentOrder>, PaymentError> {
            Ok(self.active.lock().unwrap().clone())
        }

        async fn mark_pending(&self, order_id: &OrderId) -> Result<(), PaymentError> {
            self.marked_pending.lock().unwrap().push(order_id.clone());
            Ok(())
        }

        async fn commit_success(
            &self,
            _commit: SuccessCommit,
        ) -> Result<CommitOutcome, PaymentError> {
            Ok(CommitOutcome::Applied)
        }

        async fn commit_failure(
            &self,
            _commit: FailureCommit,
        ) -> Result<CommitOutcome, PaymentError> {
            Ok(CommitOutcome::Applied)
        }

        async fn transactions_for(
            &self,
            _order_id: &OrderId,
        ) -> Result<Vec<PaymentTransaction>, PaymentError> {
            Ok(Vec::new())
        }
    }

    struct MockReservationRepository {
        by_key: Mutex<HashMap<String, CapacityReservation>>,
    }

    impl MockReservationRepository {
        fn empty() -> Self {
            Self {
                by_key: Mutex::new(HashMap::new()),
            }
        }

        fn with(reservation: CapacityReservation) -> Self {
            let mut by_key = HashMap::new();
            by_key.insert(reservation.key.as_str().to_string(), reservation);
            Self {
                by_key: Mutex::new(by_key),
            }
        }
    }

    #[async_trait]
    impl ReservationRepository for MockReservationRepository {
        async fn upsert_active(
            &self,
            reservation: &CapacityReservation,
        ) -> Result<(), PaymentError> {
            self.by_key
                .lock()
                .unwrap()
                .insert(reservation.key.as_str().to_string(), reservation.clone());
            Ok(())
        }

        async fn find_by_key(
            &self,
            key: &ReservationKey,
        ) -> Result<Option<CapacityReservation>, PaymentError> {
            Ok(self.by_key.lock().unwrap().get(key.as_str()).cloned())
        }

        async fn find_unconsumed_for(
            &self,
            _event_id: &EventId,
            _user_id: &UserId,
        ) -> Result<Option<CapacityReservation>, PaymentError> {
            Ok(None)
        }
    }

    struct MockEventCatalog {
        listing: Option<EventListing>,
    }

    #[async_trait]
    impl EventCatalog for MockEventCatalog {
        async fn find_listing(
            &self,
            event_id: &EventId,
        ) -> Result<Option<EventListing>, PaymentError> {
            Ok(self
                .listing
                .clone()
                .filter(|listing| listing.id == *event_id))
        }
    }

    struct MockGateway;

    impl PaymentGateway for MockGateway {
        fn provider(&self) -> &str {
            "payu"
        }

        fn build_redirect(&self, request: RedirectRequest) -> RedirectPayload {
            RedirectPayload {
                key: "test-key".to_string(),
                txnid: request.txnid,
                amount: format!("{:.2}", request.amount),
                productinfo: request.productinfo,
                firstname: request.firstname,
                email: request.email,
                phone: request.phone,
                surl: "https://app.test/payments/success".to_string(),
                furl: "https://app.test/payments/failure".to_string(),
                hash: "0".repeat(128),
            }
        }

        fn verify_notification(
            &self,
            _notification: &GatewayNotification,
        ) -> Result<(), PaymentError> {
            Ok(())
        }
    }

    struct MockEventPublisher {
        published: Mutex<Vec<EventEnvelope>>,
    }

    impl MockEventPublisher {
        fn new() -> Self {
            Self {
                published: Mutex::new(Vec::new()),
            }
        }

        fn published(&self) -> Vec<EventEnvelope> {
            self.published.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl EventPublisher for MockEventPublisher {
        async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
            self.published.lock().unwrap().push(event);
            Ok(())
        }

        async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
            for event in events {
                self.publish(event).await?;
            }
            Ok(())
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Test Helpers
    // ════════════════════════════════════════════════════════════════════════════

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    struct Fixture {
        event_id: EventId,
        user_id: UserId,
        reservation: CapacityReservation,
    }

    impl Fixture {
        fn new() -> Self {
            let event_id = EventId::new();
            let user_id = UserId::new();
            let reservation = CapacityReservation::create(event_id, user_id, 3, 15).unwrap();
            Self {
                event_id,
                user_id,
                reservation,
            }
        }

        fn listing(&self) -> EventListing {
            EventListing {
                id: self.event_id,
                title: "Rooftop Jazz Night".to_string(),
                is_paid: true,
                ticket_price: dec("100.00"),
                max_capacity: 50,
            }
        }

        fn command(&self) -> CreatePaymentOrderCommand {
            CreatePaymentOrderCommand {
                caller: CallerIdentity::customer(self.user_id),
                event_id: self.event_id,
                amount: dec("330.00"),
                reservation_key: self.reservation.key.clone(),
                firstname: "Asha".to_string(),
                email: "asha@example.com".to_string(),
                phone: "9999999999".to_string(),
            }
        }

        fn handler(
            &self,
            store: Arc<MockOrderStore>,
            publisher: Arc<MockEventPublisher>,
        ) -> CreatePaymentOrderHandler {
            CreatePaymentOrderHandler::new(
                store,
                Arc::new(MockReservationRepository::with(self.reservation.clone())),
                Arc::new(MockEventCatalog {
                    listing: Some(self.listing()),
                }),
                Arc::new(MockGateway),
                publisher,
                "INR",
                10,
            )
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Success Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn creates_pending_order_with_signed_redirect() {
        let fixture = Fixture::new();
        let store = Arc::new(MockOrderStore::new());
        let handler = fixture.handler(store.clone(), Arc::new(MockEventPublisher::new()));

        let result = handler.handle(fixture.command()).await.unwrap();

        assert_eq!(result.order.status, OrderStatus::Pending);
        assert_eq!(result.order.amount, dec("330.00"));
        assert_eq!(result.order.currency, "INR");
        assert_eq!(result.order.provider, "payu");
        assert_eq!(result.redirect.txnid, result.order.order_id.as_str());
        assert_eq!(result.redirect.amount, "330.00");
        assert_eq!(result.redirect.productinfo, "Rooftop Jazz Night");
    }

    #[tokio::test]
    async fn persists_order_then_marks_it_pending() {
        let fixture = Fixture::new();
        let store = Arc::new(MockOrderStore::new());
        let handler = fixture.handler(store.clone(), Arc::new(MockEventPublisher::new()));

        let result = handler.handle(fixture.command()).await.unwrap();

        let inserted = store.inserted();
        assert_eq!(inserted.len(), 1);
        // The row is inserted in created status; pending is a follow-up write
        assert_eq!(inserted[0].status, OrderStatus::Created);
        assert_eq!(store.marked_pending(), vec![result.order.order_id.clone()]);
    }

    #[tokio::test]
    async fn order_id_doubles_as_gateway_txnid() {
        let fixture = Fixture::new();
        let store = Arc::new(MockOrderStore::new());
        let handler = fixture.handler(store, Arc::new(MockEventPublisher::new()));

        let result = handler.handle(fixture.command()).await.unwrap();

        assert_eq!(result.redirect.txnid, result.order.order_id.as_str());
    }

    #[tokio::test]
    async fn publishes_order_created_event() {
        let fixture = Fixture::new();
        let publisher = Arc::new(MockEventPublisher::new());
        let handler = fixture.handler(Arc::new(MockOrderStore::new()), publisher.clone());

        handler.handle(fixture.command()).await.unwrap();

        let events = publisher.published();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, "payment.order_created");
    }

    #[tokio::test]
    async fn expired_active_order_does_not_block() {
        let fixture = Fixture::new();
        let stale = PaymentOrder::create(
            fixture.event_id,
            fixture.user_id,
            fixture.reservation.key.clone(),
            dec("330.00"),
            "INR",
            "payu",
            -5,
        )
        .unwrap();
        let store = Arc::new(MockOrderStore::with_active(stale));
        let handler = fixture.handler(store, Arc::new(MockEventPublisher::new()));

        let result = handler.handle(fixture.command()).await;
        assert!(result.is_ok());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Failure Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn rejects_operator_identity_before_any_store_access() {
        let fixture = Fixture::new();
        let store = Arc::new(MockOrderStore::new());
        let handler = fixture.handler(store.clone(), Arc::new(MockEventPublisher::new()));

        let mut cmd = fixture.command();
        cmd.caller = CallerIdentity::operator(fixture.user_id);

        let result = handler.handle(cmd).await;

        assert!(matches!(result, Err(PaymentError::CustomerIdentityRequired)));
        assert!(store.inserted().is_empty());
    }

    #[tokio::test]
    async fn rejects_non_positive_amount() {
        let fixture = Fixture::new();
        let handler =
            fixture.handler(Arc::new(MockOrderStore::new()), Arc::new(MockEventPublisher::new()));

        for raw in ["0", "-1.00"] {
            let mut cmd = fixture.command();
            cmd.amount = dec(raw);
            let result = handler.handle(cmd).await;
            assert!(matches!(result, Err(PaymentError::ValidationFailed { .. })));
        }
    }

    #[tokio::test]
    async fn rejects_blank_contact_fields() {
        let fixture = Fixture::new();
        let handler =
            fixture.handler(Arc::new(MockOrderStore::new()), Arc::new(MockEventPublisher::new()));

        let mut cmd = fixture.command();
        cmd.email = "   ".to_string();

        let result = handler.handle(cmd).await;
        match result {
            Err(PaymentError::ValidationFailed { field, .. }) => assert_eq!(field, "email"),
            other => panic!("expected ValidationFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn rejects_unknown_event() {
        let fixture = Fixture::new();
        let handler = CreatePaymentOrderHandler::new(
            Arc::new(MockOrderStore::new()),
            Arc::new(MockReservationRepository::with(fixture.reservation.clone())),
            Arc::new(MockEventCatalog { listing: None }),
            Arc::new(MockGateway),
            Arc::new(MockEventPublisher::new()),
            "INR",
            10,
        );

        let result = handler.handle(fixture.command()).await;
        assert!(matches!(result, Err(PaymentError::EventNotFound(_))));
    }

    #[tokio::test]
    async fn rejects_free_event() {
        let fixture = Fixture::new();
        let mut listing = fixture.listing();
        listing.is_paid = false;
        let handler = CreatePaymentOrderHandler::new(
            Arc::new(MockOrderStore::new()),
            Arc::new(MockReservationRepository::with(fixture.reservation.clone())),
            Arc::new(MockEventCatalog {
                listing: Some(listing),
            }),
            Arc::new(MockGateway),
            Arc::new(MockEventPublisher::new()),
            "INR",
            10,
        );

        let result = handler.handle(fixture.command()).await;
        assert!(matches!(result, Err(PaymentError::EventNotPayable(_))));
    }

    #[tokio::test]
    async fn duplicate_active_order_is_cited_in_the_conflict() {
        let fixture = Fixture::new();
        let existing = PaymentOrder::create(
            fixture.event_id,
            fixture.user_id,
            fixture.reservation.key.clone(),
            dec("330.00"),
            "INR",
            "payu",
            10,
        )
        .unwrap();
        let existing_id = existing.order_id.clone();
        let store = Arc::new(MockOrderStore::with_active(existing));
        let handler = fixture.handler(store.clone(), Arc::new(MockEventPublisher::new()));

        let result = handler.handle(fixture.command()).await;

        match result {
            Err(PaymentError::DuplicateActiveOrder { existing_order_id }) => {
                assert_eq!(existing_order_id, existing_id);
            }
            other => panic!("expected DuplicateActiveOrder, got {:?}", other),
        }
        assert!(store.inserted().is_empty());
    }

    #[tokio::test]
    async fn rejects_missing_reservation() {
        let fixture = Fixture::new();
        let handler = CreatePaymentOrderHandler::new(
            Arc::new(MockOrderStore::new()),
            Arc::new(MockReservationRepository::empty()),
            Arc::new(MockEventCatalog {
                listing: Some(fixture.listing()),
            }),
            Arc::new(MockGateway),
            Arc::new(MockEventPublisher::new()),
            "INR",
            10,
        );

        let result = handler.handle(fixture.command()).await;
        assert!(matches!(result, Err(PaymentError::ReservationNotFound(_))));
    }

    #[tokio::test]
    async fn rejects_reservation_owned_by_someone_else() {
        let fixture = Fixture::new();
        let foreign =
            CapacityReservation::create(fixture.event_id, UserId::new(), 3, 15).unwrap();
        let handler = CreatePaymentOrderHandler::new(
            Arc::new(MockOrderStore::new()),
            Arc::new(MockReservationRepository::with(foreign.clone())),
            Arc::new(MockEventCatalog {
                listing: Some(fixture.listing()),
            }),
            Arc::new(MockGateway),
            Arc::new(MockEventPublisher::new()),
            "INR",
            10,
        );

        let mut cmd = fixture.command();
        cmd.reservation_key = foreign.key.clone();

        let result = handler.handle(cmd).await;
        assert!(matches!(result, Err(PaymentError::InvalidReservation { .. })));
    }

    #[tokio::test]
    async fn rejects_consumed_reservation() {
        let fixture = Fixture::new();
        let mut reservation = fixture.reservation.clone();
        reservation.consume();
        let handler = CreatePaymentOrderHandler::new(
            Arc::new(MockOrderStore::new()),
            Arc::new(MockReservationRepository::with(reservation)),
            Arc::new(MockEventCatalog {
                listing: Some(fixture.listing()),
            }),
            Arc::new(MockGateway),
            Arc::new(MockEventPublisher::new()),
            "INR",
            10,
        );

        let result = handler.handle(fixture.command()).await;
        assert!(matches!(result, Err(PaymentError::InvalidReservation { .. })));
    }

    #[tokio::test]
    async fn rejects_expired_reservation() {
        let fixture = Fixture::new();
        let expired =
            CapacityReservation::create(fixture.event_id, fixture.user_id, 3, -1).unwrap();
        let handler = CreatePaymentOrderHandler::new(
            Arc::new(MockOrderStore::new()),
            Arc::new(MockReservationRepository::with(expired.clone())),
            Arc::new(MockEventCatalog {
                listing: Some(fixture.listing()),
            }),
            Arc::new(MockGateway),
            Arc::new(MockEventPublisher::new()),
            "INR",
            10,
        );

        let mut cmd = fixture.command();
        cmd.reservation_key = expired.key.clone();

        let result = handler.handle(cmd).await;
        assert!(matches!(result, Err(PaymentError::InvalidReservation { .. })));
    }

    #[tokio::test]
    async fn no_event_published_when_creation_fails() {
        let fixture = Fixture::new();
        let publisher = Arc::new(MockEventPublisher::new());
        let handler = CreatePaymentOrderHandler::new(
            Arc::new(MockOrderStore::new()),
            Arc::new(MockReservationRepository::empty()),
            Arc::new(MockEventCatalog {
                listing: Some(fixture.listing()),
            }),
            Arc::new(MockGateway),
            publisher.clone(),
            "INR",
            10,
        );

        let _ = handler.handle(fixture.command()).await;
        assert!(publisher.published().is_empty());
    }
}
