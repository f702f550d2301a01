//! HTTP handlers for payments endpoints.
//!
//! These handlers connect Axum routes to application layer command/query
//! handlers.

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Form, Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::payments::{
    CreatePaymentOrderCommand, CreatePaymentOrderHandler, GetPaymentOrderHandler,
    GetPaymentOrderQuery, ProcessWebhookCommand, ProcessWebhookHandler, ReserveCapacityCommand,
    ReserveCapacityHandler,
};
use crate::domain::foundation::{CallerIdentity, IdentityRole, UserId};
use crate::domain::payments::PaymentError;
use crate::ports::{
    AttendanceLedger, EventCatalog, EventPublisher, FeeConfigSource, PaymentGateway,
    PaymentOrderStore, ReservationRepository, WebhookRepository,
};

use super::dto::{
    CreateOrderRequest, CreateOrderResponse, ErrorResponse, OrderDetailResponse, OrderResponse,
    ReservationResponse, ReserveCapacityRequest, TransactionResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all payment dependencies.
///
/// This struct is cloned for each request and contains Arc-wrapped
/// dependencies for efficient sharing across handlers.
#[derive(Clone)]
pub struct PaymentsAppState {
    pub order_store: Arc<dyn PaymentOrderStore>,
    pub reservations: Arc<dyn ReservationRepository>,
    pub webhooks: Arc<dyn WebhookRepository>,
    pub ledger: Arc<dyn AttendanceLedger>,
    pub catalog: Arc<dyn EventCatalog>,
    pub fees: Arc<dyn FeeConfigSource>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub event_publisher: Arc<dyn EventPublisher>,
    /// ISO currency code stamped on new orders.
    pub currency: String,
    /// How long a capacity hold stays usable.
    pub reservation_ttl_minutes: i64,
    /// How long an order may wait for gateway settlement.
    pub order_ttl_minutes: i64,
}

impl PaymentsAppState {
    /// Create handlers on demand from the shared state.
    pub fn reserve_capacity_handler(&self) -> ReserveCapacityHandler {
        ReserveCapacityHandler::new(
            self.catalog.clone(),
            self.reservations.clone(),
            self.ledger.clone(),
            self.event_publisher.clone(),
            self.reservation_ttl_minutes,
        )
    }

    pub fn create_order_handler(&self) -> CreatePaymentOrderHandler {
        CreatePaymentOrderHandler::new(
            self.order_store.clone(),
            self.reservations.clone(),
            self.catalog.clone(),
            self.gateway.clone(),
            self.event_publisher.clone(),
            self.currency.clone(),
            self.order_ttl_minutes,
        )
    }

    pub fn get_order_handler(&self) -> GetPaymentOrderHandler {
        GetPaymentOrderHandler::new(self.order_store.clone())
    }

    pub fn webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(
            self.webhooks.clone(),
            self.order_store.clone(),
            self.reservations.clone(),
            self.catalog.clone(),
            self.fees.clone(),
            self.gateway.clone(),
            self.event_publisher.clone(),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Caller Identity Extraction
// ════════════════════════════════════════════════════════════════════════════════

/// Authenticated caller extracted from request headers.
///
/// Authentication itself (phone OTP, session issuance) lives in the upstream
/// gateway, which validates the session and installs `X-User-Id` and
/// `X-User-Role` before the request reaches this service. A missing role
/// header defaults to the customer class; an unrecognized role value is
/// rejected outright.
#[derive(Debug, Clone)]
pub struct AuthenticatedCaller {
    pub identity: CallerIdentity,
}

/// Rejection type for AuthenticatedCaller extraction.
#[derive(Debug)]
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> axum::response::Response {
        let error = ErrorResponse::new("AUTHENTICATION_REQUIRED", "Authentication is required");
        (StatusCode::UNAUTHORIZED, Json(error)).into_response()
    }
}

impl<S> axum::extract::FromRequestParts<S> for AuthenticatedCaller
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            let user_id = parts
                .headers
                .get("X-User-Id")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| uuid::Uuid::parse_str(s.trim()).ok())
                .map(UserId::from_uuid)
                .ok_or(AuthenticationRequired)?;

            let role = match parts.headers.get("X-User-Role") {
                Some(value) => {
                    let raw = value.to_str().map_err(|_| AuthenticationRequired)?;
                    IdentityRole::parse(raw).map_err(|_| AuthenticationRequired)?
                }
                None => IdentityRole::Customer,
            };

            Ok(AuthenticatedCaller {
                identity: CallerIdentity { user_id, role },
            })
        })
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/payments/reservations - Hold seats on a paid event
pub async fn reserve_capacity(
    State(state): State<PaymentsAppState>,
    caller: AuthenticatedCaller,
    Json(request): Json<ReserveCapacityRequest>,
) -> Result<impl IntoResponse + std::fmt::Debug, PaymentApiError> {
    let handler = state.reserve_capacity_handler();
    let cmd = ReserveCapacityCommand {
        caller: caller.identity,
        event_id: request.event_id,
        seats: request.seats,
    };

    let result = handler.handle(cmd).await?;

    let response = ReservationResponse::from(result.reservation);
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/payments/orders - Open a payment order
///
/// The response carries the order together with the signed form payload the
/// client auto-submits to the gateway's hosted checkout page.
pub async fn create_order(
    State(state): State<PaymentsAppState>,
    caller: AuthenticatedCaller,
    Json(request): Json<CreateOrderRequest>,
) -> Result<impl IntoResponse + std::fmt::Debug, PaymentApiError> {
    let handler = state.create_order_handler();
    let cmd = CreatePaymentOrderCommand {
        caller: caller.identity,
        event_id: request.event_id,
        amount: request.amount,
        reservation_key: request.reservation_key,
        firstname: request.firstname,
        email: request.email,
        phone: request.phone,
    };

    let result = handler.handle(cmd).await?;

    let response = CreateOrderResponse {
        order: OrderResponse::from(result.order),
        redirect: result.redirect,
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/payments/webhooks/payu - Inbound gateway notification
///
/// The gateway posts the notification as a url-encoded form. Authentication
/// is the reverse hash inside the payload, never a caller identity, so this
/// route takes no identity extractor.
pub async fn payu_webhook(
    State(state): State<PaymentsAppState>,
    Form(form): Form<HashMap<String, String>>,
) -> Result<impl IntoResponse + std::fmt::Debug, PaymentApiError> {
    let handler = state.webhook_handler();
    handler.handle(ProcessWebhookCommand { form }).await?;

    Ok(StatusCode::OK)
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/payments/orders/:order_id - Order status for client polling
pub async fn get_order(
    State(state): State<PaymentsAppState>,
    caller: AuthenticatedCaller,
    Path(order_id): Path<String>,
) -> Result<impl IntoResponse + std::fmt::Debug, PaymentApiError> {
    let handler = state.get_order_handler();
    let query = GetPaymentOrderQuery {
        caller: caller.identity,
        order_id,
    };

    let result = handler.handle(query).await?;

    let response = OrderDetailResponse {
        order: OrderResponse::from(result.order),
        transactions: result
            .transactions
            .into_iter()
            .map(TransactionResponse::from)
            .collect(),
    };

    Ok(Json(response))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts payment errors to HTTP responses.
#[derive(Debug)]
pub struct PaymentApiError(PaymentError);

impl From<PaymentError> for PaymentApiError {
    fn from(err: PaymentError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PaymentApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, error_code) = match &self.0 {
            PaymentError::EventNotFound(_) => (StatusCode::NOT_FOUND, "EVENT_NOT_FOUND"),
            PaymentError::OrderNotFound(_) => (StatusCode::NOT_FOUND, "ORDER_NOT_FOUND"),
            PaymentError::ReservationNotFound(_) => {
                (StatusCode::NOT_FOUND, "RESERVATION_NOT_FOUND")
            }
            PaymentError::EventNotPayable(_) => (StatusCode::BAD_REQUEST, "EVENT_NOT_PAYABLE"),
            PaymentError::CapacityExceeded { .. } => (StatusCode::CONFLICT, "CAPACITY_EXCEEDED"),
            PaymentError::InvalidReservation { .. } => {
                (StatusCode::BAD_REQUEST, "INVALID_RESERVATION")
            }
            PaymentError::DuplicateActiveOrder { .. } => {
                (StatusCode::CONFLICT, "DUPLICATE_ACTIVE_ORDER")
            }
            PaymentError::DuplicateFinalOrder { .. } => {
                (StatusCode::CONFLICT, "DUPLICATE_FINAL_ORDER")
            }
            PaymentError::InvalidState { .. } => {
                (StatusCode::CONFLICT, "INVALID_STATE_TRANSITION")
            }
            PaymentError::HashMismatch => (StatusCode::UNAUTHORIZED, "HASH_MISMATCH"),
            PaymentError::MalformedWebhook { .. } => {
                (StatusCode::BAD_REQUEST, "MALFORMED_WEBHOOK")
            }
            PaymentError::CustomerIdentityRequired => {
                (StatusCode::FORBIDDEN, "CUSTOMER_IDENTITY_REQUIRED")
            }
            PaymentError::ValidationFailed { .. } => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            PaymentError::GatewayMisconfigured(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "GATEWAY_MISCONFIGURED")
            }
            PaymentError::Infrastructure(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        // Duplicate-active conflicts cite the blocking order so the client
        // can resume it instead of retrying blind.
        let message = self.0.message();
        let body = match &self.0 {
            PaymentError::DuplicateActiveOrder { existing_order_id } => ErrorResponse::with_details(
                error_code,
                message,
                serde_json::json!({ "existing_order_id": existing_order_id.as_str() }),
            ),
            _ => ErrorResponse::new(error_code, message),
        };
        (status, Json(body)).into_response()
    }
}
