//! Gatherpay - Payments core for paid event ticketing
//!
//! This crate implements the payment order lifecycle: capacity reservations,
//! gateway redirect hashing, webhook-driven finalization, and immutable
//! financial snapshotting for audit.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
