//! Integration tests for the redirecting fetcher against a real HTTP server.
//!
//! These tests verify:
//! - The redirect hop budget
//! - Same-page loop short-circuiting for top-level navigations
//! - Method and body handling across 307 redirects
//! - Static proxies and PAC scripts evaluated by QuickJS
//! - Local `file:` resources

mod helpers;

use std::io::Write;
use std::sync::Arc;

use landing_url::http::{BrowserHeaders, EncodingType, ProxySpec};
use landing_url::{
    FetchError, FetchEvent, FetchOptions, FetchScope, Navigation, ProxyConfig, ProxyError,
    RedirectingFetcher, WebRequest,
};
use reqwest::{Method, StatusCode};
use wiremock::matchers::{body_string, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use helpers::{fetcher, hits, mount_html, mount_redirect, server_url, transport};

async fn mount_chain(server: &MockServer, redirects: usize) {
    for i in 0..redirects {
        mount_redirect(server, &format!("/hop/{i}"), 302, &format!("/hop/{}", i + 1)).await;
    }
    mount_html(server, &format!("/hop/{redirects}"), "<html>landed</html>").await;
}

#[tokio::test]
async fn test_three_redirects_are_followed() {
    let server = MockServer::start().await;
    mount_chain(&server, 3).await;

    let response = fetcher(FetchOptions::default())
        .fetch(WebRequest::get(server_url(&server, "/hop/0")), &FetchScope::untracked())
        .await
        .expect("three redirects are within budget");

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.url().path(), "/hop/3");
    assert_eq!(response.text(), "<html>landed</html>");
}

#[tokio::test]
async fn test_fourth_redirect_is_refused() {
    let server = MockServer::start().await;
    mount_chain(&server, 4).await;

    let err = fetcher(FetchOptions::default())
        .fetch(WebRequest::get(server_url(&server, "/hop/0")), &FetchScope::untracked())
        .await
        .expect_err("four redirects exceed the budget");

    assert!(matches!(err, FetchError::RedirectLimitExceeded { .. }));
    assert_eq!(hits(&server, "/hop/4").await, 0);
}

#[tokio::test]
async fn test_same_page_loop_returns_last_redirect() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/loop"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/loop")
                .insert_header("content-type", "text/html"),
        )
        .expect(4)
        .mount(&server)
        .await;

    let start = server_url(&server, "/loop");
    let fetcher = fetcher(FetchOptions::default());
    let navigation = Navigation::new(start.clone());
    let response = fetcher
        .fetch(WebRequest::get(start), &FetchScope::top_level(navigation.clone()))
        .await
        .expect("the loop guard ends the chain without an error");

    assert_eq!(response.status, StatusCode::FOUND);
    assert!(navigation.is_loop_reached());
    assert_eq!(fetcher.stats().count(FetchEvent::LoopSuppressed), 1);
}

#[tokio::test]
async fn test_307_resends_post_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/submit"))
        .respond_with(ResponseTemplate::new(307).insert_header("location", "/submit-v2"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/submit-v2"))
        .and(body_string("name=value"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let request = WebRequest::new(server_url(&server, "/submit"), Method::POST)
        .with_body("name=value", EncodingType::UrlEncoded);
    let response = fetcher(FetchOptions::default())
        .fetch(request, &FetchScope::untracked())
        .await
        .expect("fetch succeeds");

    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_browser_headers_sent_on_every_hop() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/start"))
        .and(header("user-agent", "landing-test/1.0"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/end"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/end"))
        .and(header("user-agent", "landing-test/1.0"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let fetcher = RedirectingFetcher::new(transport(), FetchOptions::default())
        .with_default_headers(Arc::new(BrowserHeaders::new("landing-test/1.0")));
    let response = fetcher
        .fetch(WebRequest::get(server_url(&server, "/start")), &FetchScope::untracked())
        .await
        .expect("fetch succeeds");
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_static_proxy_receives_requests() {
    let proxy = MockServer::start().await;
    mount_html(&proxy, "/via-proxy", "<html>proxied</html>").await;

    let port = proxy.address().port();
    let options = FetchOptions {
        proxy: ProxyConfig::fixed(ProxySpec::http("127.0.0.1", port), &[])
            .expect("valid proxy config"),
        ..FetchOptions::default()
    };
    let response = fetcher(options)
        .fetch(
            WebRequest::get("http://origin.invalid/via-proxy".parse().expect("valid url")),
            &FetchScope::untracked(),
        )
        .await
        .expect("the proxy answers for the unreachable origin");

    assert_eq!(response.text(), "<html>proxied</html>");
}

#[tokio::test]
async fn test_pac_script_downloaded_once_per_navigation() {
    let server = MockServer::start().await;
    let pac = format!(
        "function FindProxyForURL(url, host) {{\n\
         if (isPlainHostName(host)) return 'DIRECT';\n\
         return 'PROXY 127.0.0.1:{}; DIRECT';\n\
         }}",
        server.address().port()
    );
    Mock::given(method("GET"))
        .and(path("/proxy.pac"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(pac, "application/x-ns-proxy-autoconfig"),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_html(&server, "/one", "<html>1</html>").await;
    mount_html(&server, "/two", "<html>2</html>").await;

    let options = FetchOptions {
        proxy: ProxyConfig::auto_config(&format!("{}/proxy.pac", server.uri()))
            .expect("valid pac url"),
        ..FetchOptions::default()
    };
    let fetcher = fetcher(options);
    let start: url::Url = "http://site.invalid/one".parse().expect("valid url");
    let scope = FetchScope::top_level(Navigation::new(start.clone()));

    let first = fetcher
        .fetch(WebRequest::get(start), &scope)
        .await
        .expect("first fetch goes through the PAC proxy");
    let second = fetcher
        .fetch(
            WebRequest::get("http://other.invalid/two".parse().expect("valid url")),
            &scope,
        )
        .await
        .expect("second fetch reuses the PAC script");

    assert_eq!(first.text(), "<html>1</html>");
    assert_eq!(second.text(), "<html>2</html>");
    assert_eq!(fetcher.stats().count(FetchEvent::PacFetched), 1);
}

#[tokio::test]
async fn test_missing_pac_script_fails_the_fetch() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/proxy.pac"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let options = FetchOptions {
        proxy: ProxyConfig::auto_config(&format!("{}/proxy.pac", server.uri()))
            .expect("valid pac url"),
        ..FetchOptions::default()
    };
    let err = fetcher(options)
        .fetch(
            WebRequest::get("http://site.invalid/".parse().expect("valid url")),
            &FetchScope::untracked(),
        )
        .await
        .expect_err("no PAC script, no fetch");

    assert!(matches!(
        err,
        FetchError::Proxy(ProxyError::PacStatus { status: 404, .. })
    ));
}

#[tokio::test]
async fn test_local_file_is_served_without_network() {
    let mut file = tempfile::Builder::new()
        .suffix(".html")
        .tempfile()
        .expect("Failed to create temp file");
    write!(file, "<html>local</html>").expect("Failed to write temp file");
    file.flush().expect("Failed to flush temp file");

    let file_url = url::Url::from_file_path(file.path()).expect("absolute temp path");
    let response = fetcher(FetchOptions::default())
        .fetch(WebRequest::get(file_url), &FetchScope::untracked())
        .await
        .expect("local file is readable");

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.is_html());
    assert_eq!(response.text(), "<html>local</html>");
}
