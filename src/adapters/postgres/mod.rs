//! PostgreSQL adapters - Database implementations for the storage ports.
//!
//! - `PostgresOrderStore` - Order persistence and the two atomic finalize commits
//! - `PostgresReservationRepository` - Capacity holds with the one-live-hold upsert
//! - `PostgresWebhookRepository` - Verbatim webhook delivery records
//! - `PostgresAttendanceLedger` - Read side over the attendee set
//! - `PostgresEventCatalog` - Read-only view of the platform's events table

mod attendance_ledger;
mod event_catalog;
mod order_store;
mod reservation_repository;
mod webhook_repository;

pub use attendance_ledger::PostgresAttendanceLedger;
pub use event_catalog::PostgresEventCatalog;
pub use order_store::PostgresOrderStore;
pub use reservation_repository::PostgresReservationRepository;
pub use webhook_repository::PostgresWebhookRepository;
