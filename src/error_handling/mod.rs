//! Error handling and fetch statistics.
//!
//! This module provides:
//! - Error type definitions for every layer of the fetch pipeline
//! - Thread-safe statistics for notable fetch events
//!
//! Errors propagate unchanged up to `OriginResolver`, which is the only place
//! that turns them into a best-effort result.

mod stats;
mod types;

// Re-export public API
pub use stats::FetchStats;
pub use types::{
    ConfigError, FetchError, FetchEvent, HeaderError, InitializationError, NavigationError,
    ProxyError, TransportError,
};
