//! Outbound request descriptor.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use url::Url;

use crate::config::DEFAULT_CHARSET;

/// How a request body built from parameters is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncodingType {
    /// `application/x-www-form-urlencoded`
    #[default]
    UrlEncoded,
    /// `multipart/form-data`
    Multipart,
    /// `text/plain`
    TextPlain,
}

impl EncodingType {
    pub fn as_mime(&self) -> &'static str {
        match self {
            EncodingType::UrlEncoded => "application/x-www-form-urlencoded",
            EncodingType::Multipart => "multipart/form-data",
            EncodingType::TextPlain => "text/plain",
        }
    }
}

/// Proxy attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProxySpec {
    pub host: String,
    pub port: u16,
    /// Scheme used to talk to an HTTP proxy (`http` or `https`)
    pub scheme: String,
    pub socks: bool,
}

impl ProxySpec {
    /// Plain HTTP proxy.
    pub fn http(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            scheme: "http".to_string(),
            socks: false,
        }
    }

    /// SOCKS proxy.
    pub fn socks(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            scheme: "http".to_string(),
            socks: true,
        }
    }

    /// Proxy URL in the form understood by `reqwest::Proxy`.
    ///
    /// SOCKS proxies use `socks5h` so host names are resolved by the proxy.
    pub fn to_proxy_url(&self) -> String {
        if self.socks {
            format!("socks5h://{}:{}", self.host, self.port)
        } else {
            format!("{}://{}:{}", self.scheme, self.host, self.port)
        }
    }
}

/// A request as it travels through the fetch pipeline.
///
/// `proxy` being `Some` means a proxy was chosen by the caller (or already
/// resolved) and proxy resolution leaves the request untouched.
#[derive(Debug, Clone)]
pub struct WebRequest {
    pub url: Url,
    pub method: Method,
    pub additional_headers: HeaderMap,
    pub body: Option<String>,
    pub encoding_type: EncodingType,
    /// Form parameters, sent as the query for GET/HEAD and as the body otherwise
    pub parameters: Vec<(String, String)>,
    pub charset: String,
    pub proxy: Option<ProxySpec>,
}

impl WebRequest {
    pub fn new(url: Url, method: Method) -> Self {
        Self {
            url,
            method,
            additional_headers: HeaderMap::new(),
            body: None,
            encoding_type: EncodingType::default(),
            parameters: Vec::new(),
            charset: DEFAULT_CHARSET.to_string(),
            proxy: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(url, Method::GET)
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.additional_headers.insert(name, value);
        self
    }

    pub fn with_body(mut self, body: impl Into<String>, encoding_type: EncodingType) -> Self {
        self.body = Some(body.into());
        self.encoding_type = encoding_type;
        self
    }

    pub fn with_parameters(mut self, parameters: Vec<(String, String)>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_proxy(mut self, proxy: ProxySpec) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn has_proxy(&self) -> bool {
        self.proxy.is_some()
    }

    /// Whether the method carries a body that must survive 307/308 redirects.
    pub fn method_has_body(&self) -> bool {
        self.method == Method::POST || self.method == Method::PUT || self.method == Method::PATCH
    }
}
