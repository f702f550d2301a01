//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Storage Ports
//!
//! - `PaymentOrderStore` - Order persistence and the atomic settle commits
//! - `ReservationRepository` - Capacity reservation persistence
//! - `WebhookRepository` - Verbatim webhook audit log
//! - `AttendanceLedger` - Authoritative attendee set and going counts
//!
//! ## Collaborator Ports
//!
//! - `EventCatalog` - Read-only slice of the ticketed event domain
//! - `FeeConfigSource` - Current platform fee rate, cache-friendly
//!
//! ## Gateway Ports
//!
//! - `PaymentGateway` - Signed redirect construction and notification
//!   verification for the hosted checkout flow
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Best-effort fan-out of payment lifecycle events

mod attendance_ledger;
mod event_catalog;
mod event_publisher;
mod fee_config;
mod payment_gateway;
mod payment_order_store;
mod reservation_repository;
mod webhook_repository;

pub use attendance_ledger::AttendanceLedger;
pub use event_catalog::{EventCatalog, EventListing};
pub use event_publisher::EventPublisher;
pub use fee_config::FeeConfigSource;
pub use payment_gateway::{PaymentGateway, RedirectPayload, RedirectRequest};
pub use payment_order_store::{CommitOutcome, FailureCommit, PaymentOrderStore, SuccessCommit};
pub use reservation_repository::ReservationRepository;
pub use webhook_repository::WebhookRepository;
