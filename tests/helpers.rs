// Shared test helpers for mock servers and fetchers.
//
// This module provides common utilities used across multiple test files to reduce duplication.

use std::sync::Arc;
use std::time::Duration;

use landing_url::cache::NoCache;
use landing_url::{FetchOptions, RedirectingFetcher, ReqwestTransport};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Builds a real `reqwest` transport with a short timeout.
#[allow(dead_code)] // Used by other test files
pub fn transport() -> Arc<ReqwestTransport> {
    Arc::new(ReqwestTransport::new(Duration::from_secs(5)).expect("Failed to build transport"))
}

/// Builds a fetcher over a real transport, without response caching so every
/// hop reaches the mock server.
#[allow(dead_code)]
pub fn fetcher(options: FetchOptions) -> Arc<RedirectingFetcher> {
    Arc::new(RedirectingFetcher::new(transport(), options).with_cache(Arc::new(NoCache)))
}

/// Absolute URL of `path` on the mock server.
#[allow(dead_code)]
pub fn server_url(server: &MockServer, path: &str) -> Url {
    Url::parse(&format!("{}{}", server.uri(), path)).expect("valid mock server url")
}

/// Mounts a GET redirect answered with an HTML body, like most real servers.
#[allow(dead_code)]
pub async fn mount_redirect(server: &MockServer, from: &str, status: u16, location: &str) {
    Mock::given(method("GET"))
        .and(path(from))
        .respond_with(
            ResponseTemplate::new(status)
                .insert_header("location", location)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

/// Mounts a GET endpoint returning an HTML page.
#[allow(dead_code)]
pub async fn mount_html(server: &MockServer, at: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html"))
        .mount(server)
        .await;
}

/// Number of requests the mock server received for `at`.
#[allow(dead_code)]
pub async fn hits(server: &MockServer, at: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == at)
        .count()
}
