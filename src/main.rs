//! Gatherpay payments service
//!
//! Boots the HTTP service that owns the paid-event order lifecycle:
//! capacity reservations, gateway redirect handoff, and webhook-driven
//! settlement. Wiring order is configuration, tracing, database pool,
//! adapters, router.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatherpay::adapters::{
    payments_router, CachedFeeSource, ConfigFeeSource, LoggingEventPublisher, PaymentsAppState,
    PayuGateway, PostgresAttendanceLedger, PostgresEventCatalog, PostgresOrderStore,
    PostgresReservationRepository, PostgresWebhookRepository,
};
use gatherpay::config::AppConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Configuration first so the log filter can come from it
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.server.environment,
        "Starting gatherpay payments service"
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .idle_timeout(config.database.idle_timeout())
        .max_lifetime(config.database.max_lifetime())
        .connect(&config.database.url)
        .await?;
    tracing::info!("Database connection established");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    // Gateway credentials stay inside the adapter; nothing here logs them
    let gateway = Arc::new(PayuGateway::new(&config.gateway)?);
    let fees = Arc::new(CachedFeeSource::new(
        Arc::new(ConfigFeeSource::from_percentage(
            config.payments.platform_fee_percentage,
        )?),
        config.payments.fee_cache_ttl(),
    ));

    let state = PaymentsAppState {
        order_store: Arc::new(PostgresOrderStore::new(pool.clone())),
        reservations: Arc::new(PostgresReservationRepository::new(pool.clone())),
        webhooks: Arc::new(PostgresWebhookRepository::new(pool.clone())),
        ledger: Arc::new(PostgresAttendanceLedger::new(pool.clone())),
        catalog: Arc::new(PostgresEventCatalog::new(pool.clone())),
        fees,
        gateway,
        event_publisher: Arc::new(LoggingEventPublisher::new()),
        currency: config.payments.currency.clone(),
        reservation_ttl_minutes: config.payments.reservation_ttl_minutes,
        order_ttl_minutes: config.payments.order_ttl_minutes,
    };

    let cors = build_cors_layer(&config);

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", payments_router())
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.server.request_timeout_secs,
                )))
                .layer(cors),
        )
        .with_state(state);

    let addr: SocketAddr = config.server.socket_addr()?;
    tracing::info!(%addr, "Listening for requests");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Restrict CORS to configured origins; stay permissive when none are set
/// so local development works without extra configuration.
fn build_cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<axum::http::HeaderValue> = config
        .server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        if config.server.is_production() {
            tracing::warn!("No CORS origins configured in production; allowing any origin");
        }
        return CorsLayer::permissive();
    }

    tracing::info!(origin_count = origins.len(), "CORS origin allowlist active");
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::HeaderName::from_static("x-user-id"),
            axum::http::HeaderName::from_static("x-user-role"),
        ])
}

/// Liveness probe for load balancers and container orchestration.
async fn health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "service": "gatherpay",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
