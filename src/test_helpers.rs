//! Scripted collaborators shared by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::StatusCode;
use url::Url;

use crate::error_handling::{NavigationError, ProxyError, TransportError};
use crate::fetch::{FetchScope, RedirectingFetcher};
use crate::http::{WebRequest, WebResponse};
use crate::navigation::{
    Navigation, NavigationCause, NavigationDecision, NavigationEngine, NavigationRequest, Page,
};
use crate::proxy::{PacEvaluator, PacLoader, PacScript};
use crate::transport::Transport;

pub(crate) fn url(s: &str) -> Url {
    Url::parse(s).expect("valid test url")
}

#[derive(Clone)]
struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

/// Transport answering from per-URL reply queues.
///
/// Each URL's replies are served in order and the last one repeats. Unknown
/// URLs get a 404. Every request is recorded.
#[derive(Default)]
pub(crate) struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Reply>>>,
    requests: Mutex<Vec<WebRequest>>,
    fail_all: bool,
}

impl ScriptedTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Transport whose every request fails with a connection error.
    pub(crate) fn failing() -> Self {
        Self {
            fail_all: true,
            ..Self::default()
        }
    }

    pub(crate) fn respond(self, url: &str, status: u16, headers: &[(&str, &str)], body: &str) -> Self {
        let reply = Reply {
            status,
            headers: headers
                .iter()
                .map(|&(n, v)| (n.to_string(), v.to_string()))
                .collect(),
            body: body.to_string(),
        };
        self.routes
            .lock()
            .expect("routes lock")
            .entry(url.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// HTML redirect response.
    pub(crate) fn redirect(self, from: &str, status: u16, location: &str) -> Self {
        self.respond(
            from,
            status,
            &[("location", location), ("content-type", "text/html")],
            "<html><body>Moved</body></html>",
        )
    }

    pub(crate) fn html(self, url: &str, body: &str) -> Self {
        self.respond(url, 200, &[("content-type", "text/html; charset=utf-8")], body)
    }

    pub(crate) fn requests(&self) -> Vec<WebRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub(crate) fn count_for(&self, url: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.as_str() == url)
            .count()
    }

    fn next_reply(&self, url: &str) -> Option<Reply> {
        let mut routes = self.routes.lock().expect("routes lock");
        let queue = routes.get_mut(url)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn fetch(&self, request: &WebRequest) -> Result<WebResponse, TransportError> {
        self.requests
            .lock()
            .expect("requests lock")
            .push(request.clone());
        if self.fail_all {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "scripted connection failure",
            )));
        }

        let Some(reply) = self.next_reply(request.url.as_str()) else {
            return Ok(WebResponse::new(
                request.clone(),
                StatusCode::NOT_FOUND,
                HeaderMap::new(),
                Bytes::new(),
            ));
        };
        let mut headers = HeaderMap::new();
        for (name, value) in &reply.headers {
            headers.append(
                HeaderName::from_bytes(name.as_bytes()).expect("valid test header name"),
                HeaderValue::from_str(value).expect("valid test header value"),
            );
        }
        Ok(WebResponse::new(
            request.clone(),
            StatusCode::from_u16(reply.status).expect("valid test status"),
            headers,
            Bytes::from(reply.body),
        ))
    }
}

/// PAC evaluator returning the same directive list for every URL.
pub(crate) struct ScriptedPacEvaluator {
    directives: String,
    calls: AtomicUsize,
}

impl ScriptedPacEvaluator {
    pub(crate) fn always(directives: &str) -> Self {
        Self {
            directives: directives.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PacEvaluator for ScriptedPacEvaluator {
    async fn evaluate(&self, _script: &PacScript, _url: &Url) -> Result<String, ProxyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.directives.clone())
    }
}

/// PAC loader serving fixed content, or a 503.
pub(crate) struct StaticPacLoader {
    content: Option<String>,
    loads: AtomicUsize,
}

impl StaticPacLoader {
    pub(crate) fn new(content: &str) -> Self {
        Self {
            content: Some(content.to_string()),
            loads: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            content: None,
            loads: AtomicUsize::new(0),
        }
    }

    pub(crate) fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PacLoader for StaticPacLoader {
    async fn load_pac(&self, pac_url: &Url) -> Result<String, ProxyError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.content.clone().ok_or_else(|| ProxyError::PacStatus {
            url: pac_url.clone(),
            status: 503,
        })
    }
}

/// Engine that loads a page and then runs a fixed list of script-driven
/// location changes, as a page script would.
pub(crate) struct ScriptedEngine {
    fetcher: Arc<RedirectingFetcher>,
    script_locations: Vec<Url>,
}

impl ScriptedEngine {
    pub(crate) fn new(fetcher: Arc<RedirectingFetcher>, script_locations: &[&str]) -> Self {
        Self {
            fetcher,
            script_locations: script_locations.iter().map(|s| url(s)).collect(),
        }
    }
}

#[async_trait]
impl NavigationEngine for ScriptedEngine {
    async fn load(&self, start: &Url, navigation: &Navigation) -> Result<Page, NavigationError> {
        let scope = FetchScope::top_level(navigation.clone());
        let mut response = self
            .fetcher
            .fetch(WebRequest::get(start.clone()), &scope)
            .await?;
        for target in &self.script_locations {
            let request = NavigationRequest::new(target.clone(), NavigationCause::ScriptLocation);
            if navigation.begin(&request) == NavigationDecision::Suppress {
                break;
            }
            response = self
                .fetcher
                .fetch(WebRequest::get(target.clone()), &scope)
                .await?;
        }
        Ok(Page::from_response(response))
    }
}

/// Engine that records one navigation and then fails.
pub(crate) struct FailingEngine {
    pub(crate) visited: Option<Url>,
}

#[async_trait]
impl NavigationEngine for FailingEngine {
    async fn load(&self, _start: &Url, navigation: &Navigation) -> Result<Page, NavigationError> {
        if let Some(visited) = &self.visited {
            navigation.record_navigation(visited);
        }
        Err(NavigationError::Engine("script engine crashed".to_string()))
    }
}
