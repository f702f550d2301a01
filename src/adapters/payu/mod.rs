//! PayU gateway adapter.
//!
//! - `PayuGateway` - Signed redirect construction and reverse-hash verification

mod gateway;

pub use gateway::PayuGateway;
