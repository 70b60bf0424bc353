//! HTTP header name and value constants.
//!
//! This module defines the headers attached to every outbound request and the
//! response headers the fetch pipeline inspects.

// Default request headers
/// Accept header sent with every request (modern Chrome navigation value)
pub const DEFAULT_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7";
/// Accept-Language header sent with every request
pub const DEFAULT_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
/// Upgrade-Insecure-Requests header value
pub const DEFAULT_UPGRADE_INSECURE_REQUESTS: &str = "1";

/// Default request headers as (name, value) pairs, applied in this order.
///
/// User-Agent is not listed here because it is configurable per engine.
pub const DEFAULT_REQUEST_HEADERS: &[(&str, &str)] = &[
    ("accept", DEFAULT_ACCEPT),
    ("accept-language", DEFAULT_ACCEPT_LANGUAGE),
    ("upgrade-insecure-requests", DEFAULT_UPGRADE_INSECURE_REQUESTS),
];

// Response headers consulted by the pipeline (lowercase, usable as static header names)
/// Redirect target header
pub const HEADER_LOCATION: &str = "location";
/// Cache directives
pub const HEADER_CACHE_CONTROL: &str = "cache-control";
/// Request headers the cached representation varies on
pub const HEADER_VARY: &str = "vary";
/// Age of a response replayed from cache
pub const HEADER_AGE: &str = "age";
/// Delayed navigation to another URL (`<seconds>; url=<target>`)
pub const HEADER_REFRESH: &str = "refresh";
