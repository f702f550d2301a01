//! Platform fee source adapters.
//!
//! - `ConfigFeeSource` - Serves the rate from deployed configuration
//! - `CachedFeeSource` - Bounded-staleness decorator over any fee source

mod cached;
mod config_source;

pub use cached::CachedFeeSource;
pub use config_source::ConfigFeeSource;
