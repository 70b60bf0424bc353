//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (redirect budgets, PAC limits, cache sizing)
//! - Default request header values
//! - CLI option types and browser profiles

mod constants;
mod headers;
mod types;

// Re-export all constants
pub use constants::*;
pub use headers::*;
pub use types::{BrowserProfile, Config, LogFormat, LogLevel, Profile};
