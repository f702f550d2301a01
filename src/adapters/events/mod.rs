//! Event publisher adapters.
//!
//! - `InMemoryEventBus` - In-process publisher with capture helpers
//! - `LoggingEventPublisher` - Emits events as structured log lines

mod in_memory;
mod logging;

pub use in_memory::InMemoryEventBus;
pub use logging::LoggingEventPublisher;
