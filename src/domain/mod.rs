//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, enums, errors)
//! - `payments` - Paid-event order lifecycle, gateway hashing, webhooks

pub mod foundation;
pub mod payments;
