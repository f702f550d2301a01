//! In-memory storage adapter.
//!
//! - `MemoryStore` - Every payment storage port behind one mutex, for tests
//!   and local development

mod store;

pub use store::MemoryStore;
