//! Error type definitions.
//!
//! This module defines the error types raised by each layer of the fetch
//! pipeline and the informational events counted by `FetchStats`.

use log::SetLoggerError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;
use url::Url;

use crate::http::WebResponse;

/// Errors raised while fetching a request and following its redirects.
///
/// Every layer below `OriginResolver` propagates these unchanged.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The redirect chain needed more hops than `MAX_REDIRECT_HOPS`.
    #[error("Too many redirects for {url} (last status {})", .response.status)]
    RedirectLimitExceeded {
        /// URL of the request whose response asked for one hop too many
        url: Url,
        /// The last redirect response received
        response: Box<WebResponse>,
    },

    /// The proxy for the request could not be determined.
    #[error("Proxy resolution failed: {0}")]
    Proxy(#[from] ProxyError),

    /// The underlying transport failed.
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    /// The mandatory request headers could not be applied.
    #[error("Could not apply default headers: {0}")]
    DefaultHeaders(#[from] HeaderError),

    /// The request URL could not be normalized.
    #[error("Invalid request URL: {0}")]
    InvalidUrl(String),
}

/// Errors raised while resolving the proxy for a request.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The PAC script could not be downloaded.
    #[error("Failed to fetch PAC script from {url}: {source}")]
    PacFetch {
        /// Configured PAC script URL
        url: Url,
        /// Underlying fetch failure
        #[source]
        source: Box<FetchError>,
    },

    /// The PAC script was downloaded but answered with a non-success status.
    #[error("PAC script request to {url} returned status {status}")]
    PacStatus {
        /// Configured PAC script URL
        url: Url,
        /// Status returned by the server
        status: u16,
    },

    /// The PAC script exceeded `MAX_PAC_SCRIPT_SIZE`.
    #[error("PAC script is too large ({0} bytes)")]
    PacTooLarge(usize),

    /// The PAC script failed to evaluate or did not return a string.
    #[error("PAC evaluation failed: {0}")]
    PacEvaluation(String),

    /// The PAC script did not finish within `PAC_EVALUATION_TIMEOUT_MS`.
    #[error("PAC evaluation timed out after {0}ms")]
    PacTimeout(u64),

    /// A proxy directive could not be understood.
    #[error("Malformed proxy directive: {0:?}")]
    MalformedDirective(String),

    /// A `host:port` pair could not be parsed.
    #[error("Invalid proxy host:port: {0:?}")]
    InvalidHostPort(String),
}

/// Errors raised by a `Transport` implementation.
#[derive(Error, Debug)]
pub enum TransportError {
    /// The HTTP request failed (connect, timeout, body read, ...).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// A local resource could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A client for the requested proxy could not be built.
    #[error("Could not configure proxy {proxy}: {source}")]
    ProxySetup {
        /// Proxy URL handed to the client
        proxy: String,
        /// Underlying client error
        #[source]
        source: reqwest::Error,
    },

    /// The request could not be expressed on the wire.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The scheme is neither HTTP(S) nor one of the local schemes.
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    /// A `data:` URL could not be decoded.
    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),
}

/// Error raised when the mandatory request headers cannot be applied.
///
/// There is no safe fallback: a request without its default headers does not
/// behave like a browser request, so the fetch fails.
#[derive(Error, Debug)]
#[error("Invalid value for default header {name}: {value:?}")]
pub struct HeaderError {
    /// Header name
    pub name: String,
    /// Rejected header value
    pub value: String,
}

/// Errors raised by a navigation engine while loading a page.
#[derive(Error, Debug)]
pub enum NavigationError {
    /// A fetch made during the navigation failed.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// The engine failed for a reason unrelated to fetching.
    #[error("Navigation engine error: {0}")]
    Engine(String),
}

/// Errors raised while turning a `Config` into fetch options.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The PAC URL is not a valid URL.
    #[error("Invalid PAC URL {url}: {source}")]
    InvalidPacUrl {
        /// Rejected value
        url: String,
        /// Parse failure
        #[source]
        source: url::ParseError,
    },

    /// The static proxy is not a `host:port` pair.
    #[error("Invalid proxy (expected host:port): {0}")]
    InvalidProxy(String),

    /// The static proxy scheme is not http or https.
    #[error("Invalid proxy scheme (expected http or https): {0}")]
    InvalidProxyScheme(String),

    /// A proxy bypass pattern is not a valid regular expression.
    #[error("Invalid proxy bypass pattern: {0}")]
    InvalidBypassPattern(#[from] regex::Error),

    /// Both a static proxy and a PAC URL were configured.
    #[error("A static proxy and a PAC URL cannot both be configured")]
    ConflictingProxySettings,
}

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP transport.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] TransportError),

    /// The configuration is invalid.
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),
}

/// Notable events counted while fetching and resolving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum FetchEvent {
    RedirectFollowed,
    SamePageRedirect,
    RedirectLimitExceeded,
    MalformedLocation,
    UseProxyIgnored,
    LoopSuppressed,
    NavigationSuppressed,
    CacheHit,
    CacheStored,
    PacFetched,
    FallbackResolution,
}

impl std::fmt::Display for FetchEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FetchEvent {
    /// Returns a human-readable string representation of the event.
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchEvent::RedirectFollowed => "Redirect followed",
            FetchEvent::SamePageRedirect => "Same-page redirect recorded",
            FetchEvent::RedirectLimitExceeded => "Redirect limit exceeded",
            FetchEvent::MalformedLocation => "Malformed Location header",
            FetchEvent::UseProxyIgnored => "305 Use Proxy ignored",
            FetchEvent::LoopSuppressed => "Redirect loop short-circuited",
            FetchEvent::NavigationSuppressed => "Looping navigation suppressed",
            FetchEvent::CacheHit => "Response served from cache",
            FetchEvent::CacheStored => "Response stored in cache",
            FetchEvent::PacFetched => "PAC script fetched",
            FetchEvent::FallbackResolution => "Resolution fell back to last known URL",
        }
    }
}
