//! Configuration constants.
//!
//! This module defines the limits and fixed values used throughout the fetch
//! pipeline: redirect budgets, loop-guard thresholds, PAC evaluation limits
//! and response cache sizing.

// Redirect handling
/// Maximum number of redirect hops followed for a single fetch.
///
/// A fetch that needs a fourth hop fails with `FetchError::RedirectLimitExceeded`.
pub const MAX_REDIRECT_HOPS: usize = 3;

/// Number of recorded visits to the same URL after which a top-level
/// navigation is considered to be looping.
pub const ALLOWED_REDIRECTIONS_SAME_URL: usize = 3;

/// URL schemes that never reach the network and skip redirect, proxy and cache handling.
pub const NON_NETWORK_SCHEMES: &[&str] = &["about", "file", "data"];

/// Number of `Refresh` header navigations the built-in navigator follows per load.
pub const MAX_REFRESH_FOLLOWS: usize = 3;

/// Target name that denotes the requesting window itself.
pub const TARGET_SELF: &str = "_self";

/// Default User-Agent string for HTTP requests.
///
/// Users can override this via the `--user-agent` CLI flag.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default charset attached to outbound requests.
pub const DEFAULT_CHARSET: &str = "UTF-8";

// Network operation timeouts
/// Per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// TCP connection timeout in seconds
pub const TCP_CONNECT_TIMEOUT_SECS: u64 = 5;

// PAC evaluation limits
/// Maximum PAC evaluation time in milliseconds.
/// Prevents a hostile or broken script from stalling every request of a navigation.
pub const PAC_EVALUATION_TIMEOUT_MS: u64 = 1000;
/// Maximum memory limit for the QuickJS runtime evaluating a PAC script (10MB)
pub const MAX_PAC_MEMORY_LIMIT: usize = 10 * 1024 * 1024;
/// Maximum PAC script size in bytes (1MB)
pub const MAX_PAC_SCRIPT_SIZE: usize = 1024 * 1024;

// Response cache limits
/// Freshness lifetime for cached responses without an explicit `max-age`
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;
/// Maximum number of responses held by the in-memory cache
pub const MAX_CACHE_ENTRIES: usize = 512;
/// Responses with bodies larger than this (2MB) are never cached
pub const MAX_CACHED_BODY_SIZE: usize = 2 * 1024 * 1024;

// Concurrency
/// Default number of URLs resolved concurrently by the CLI
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
