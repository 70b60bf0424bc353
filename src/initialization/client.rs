//! HTTP client initialization.
//!
//! This module provides functions to build the `reqwest` clients used by the
//! transport and the fetch engine built on top of them.

use std::sync::Arc;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::{Config, TCP_CONNECT_TIMEOUT_SECS};
use crate::error_handling::{InitializationError, TransportError};
use crate::http::ProxySpec;
use crate::transport::ReqwestTransport;

/// Builds an HTTP client for one proxy choice.
///
/// Creates a `reqwest::Client` configured with:
/// - Redirects disabled (the fetch pipeline follows them itself)
/// - The given request and connect timeouts
/// - Either the given proxy, or no proxy at all
///
/// Environment proxies (`HTTP_PROXY` and friends) are ignored: proxy choice is
/// made per request by the proxy resolver.
///
/// # Errors
///
/// Returns a `TransportError` if the proxy URL is rejected or the client
/// cannot be built.
pub fn init_client(
    timeout: Duration,
    proxy: Option<&ProxySpec>,
) -> Result<reqwest::Client, TransportError> {
    let builder = ClientBuilder::new()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(TCP_CONNECT_TIMEOUT_SECS));

    let builder = match proxy {
        Some(proxy) => {
            let proxy_url = proxy.to_proxy_url();
            let reqwest_proxy = reqwest::Proxy::all(&proxy_url).map_err(|source| {
                TransportError::ProxySetup {
                    proxy: proxy_url.clone(),
                    source,
                }
            })?;
            builder.proxy(reqwest_proxy)
        }
        None => builder.no_proxy(),
    };

    Ok(builder.build()?)
}

/// Initializes the shared transport from the application configuration.
///
/// # Errors
///
/// Returns `InitializationError::HttpClientError` if client creation fails.
pub fn init_transport(config: &Config) -> Result<Arc<ReqwestTransport>, InitializationError> {
    let transport = ReqwestTransport::new(Duration::from_secs(config.timeout_seconds))?;
    Ok(Arc::new(transport))
}
