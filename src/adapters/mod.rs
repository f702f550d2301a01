//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - PostgreSQL storage for orders, reservations, webhooks,
//!   attendance, and the event catalog
//! - `payu` - Hash-based redirect gateway (PayU protocol)
//! - `fees` - Platform fee sources (static config, TTL cache decorator)
//! - `events` - Event publishers (in-memory capture, tracing log line)
//! - `http` - REST API surface (Axum)
//! - `memory` - Single-mutex in-memory store for tests and local runs

pub mod events;
pub mod fees;
pub mod http;
pub mod memory;
pub mod payu;
pub mod postgres;

pub use events::{InMemoryEventBus, LoggingEventPublisher};
pub use fees::{CachedFeeSource, ConfigFeeSource};
pub use http::{payments_router, PaymentsAppState};
pub use memory::MemoryStore;
pub use payu::PayuGateway;
pub use postgres::{
    PostgresAttendanceLedger, PostgresEventCatalog, PostgresOrderStore,
    PostgresReservationRepository, PostgresWebhookRepository,
};
