//! Response model and page type detection.

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use url::Url;

use super::request::WebRequest;

/// Coarse classification of a response body, as a browser would pick a page type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    Html,
    Xml,
    Text,
    Other,
}

/// A response together with the request that produced it.
#[derive(Debug, Clone)]
pub struct WebResponse {
    pub request: WebRequest,
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
    /// Set when the response was replayed from the response cache
    pub from_cache: bool,
}

impl WebResponse {
    pub fn new(request: WebRequest, status: StatusCode, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            request,
            status,
            headers,
            body,
            from_cache: false,
        }
    }

    /// URL of the request that produced this response.
    pub fn url(&self) -> &Url {
        &self.request.url
    }

    pub fn header_value(&self, name: &str) -> Option<&HeaderValue> {
        self.headers.get(name)
    }

    /// Header value as text, or `None` if absent or not visible ASCII.
    pub fn header_str(&self, name: &str) -> Option<&str> {
        self.header_value(name).and_then(|v| v.to_str().ok())
    }

    pub fn status_message(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    pub fn content_type(&self) -> Option<mime::Mime> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<mime::Mime>().ok())
    }

    /// Body decoded as UTF-8, replacing invalid sequences.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn page_type(&self) -> PageType {
        match self.content_type() {
            Some(mime) => page_type_for_mime(&mime),
            None => sniff_page_type(&self.body),
        }
    }

    pub fn is_html(&self) -> bool {
        self.page_type() == PageType::Html
    }
}

fn page_type_for_mime(mime: &mime::Mime) -> PageType {
    if mime.type_() == mime::TEXT && mime.subtype() == mime::HTML {
        return PageType::Html;
    }
    if mime.subtype() == mime::XML || mime.suffix() == Some(mime::XML) {
        return PageType::Xml;
    }
    if mime.type_() == mime::TEXT {
        return PageType::Text;
    }
    PageType::Other
}

fn sniff_page_type(body: &[u8]) -> PageType {
    let prefix = String::from_utf8_lossy(&body[..body.len().min(256)])
        .trim_start()
        .to_ascii_lowercase();
    if prefix.starts_with("<!doctype html") || prefix.starts_with("<html") {
        PageType::Html
    } else if prefix.starts_with("<?xml") {
        PageType::Xml
    } else if body.contains(&0) {
        PageType::Other
    } else {
        PageType::Text
    }
}
