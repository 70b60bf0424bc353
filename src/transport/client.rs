//! `reqwest`-backed transport.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::Method;

use super::{local, Transport};
use crate::error_handling::TransportError;
use crate::http::{EncodingType, ProxySpec, WebRequest, WebResponse};
use crate::initialization::init_client;

/// Transport issuing real HTTP requests with `reqwest`.
///
/// Redirects are never followed by the client; the fetch pipeline does that.
/// `reqwest` fixes the proxy per client, so one client is kept per distinct
/// proxy a request asks for.
pub struct ReqwestTransport {
    direct: reqwest::Client,
    proxied: RwLock<HashMap<ProxySpec, reqwest::Client>>,
    timeout: Duration,
}

impl ReqwestTransport {
    /// Creates a transport whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            direct: init_client(timeout, None)?,
            proxied: RwLock::new(HashMap::new()),
            timeout,
        })
    }

    fn client_for(&self, proxy: Option<&ProxySpec>) -> Result<reqwest::Client, TransportError> {
        let Some(proxy) = proxy else {
            return Ok(self.direct.clone());
        };

        if let Some(client) = self
            .proxied
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(proxy)
        {
            return Ok(client.clone());
        }

        // Two racing requests may both build a client; the last insert wins.
        let client = init_client(self.timeout, Some(proxy))?;
        self.proxied
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(proxy.clone(), client.clone());
        Ok(client)
    }

    async fn fetch_http(&self, request: &WebRequest) -> Result<WebResponse, TransportError> {
        let client = self.client_for(request.proxy.as_ref())?;
        let builder = client
            .request(request.method.clone(), request.url.clone())
            .headers(request.additional_headers.clone());
        let builder = attach_payload(builder, request)?;

        log::trace!("{} {} via {:?}", request.method, request.url, request.proxy);
        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(WebResponse::new(request.clone(), status, headers, body))
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn fetch(&self, request: &WebRequest) -> Result<WebResponse, TransportError> {
        match request.url.scheme() {
            "http" | "https" => self.fetch_http(request).await,
            "about" | "file" | "data" => local::fetch_local(request).await,
            other => Err(TransportError::UnsupportedScheme(other.to_string())),
        }
    }
}

/// Adds the body or the form parameters to the outgoing request.
///
/// An explicit body wins over parameters. Parameters go into the query string
/// for GET and HEAD and into an encoded body for everything else.
fn attach_payload(
    builder: reqwest::RequestBuilder,
    request: &WebRequest,
) -> Result<reqwest::RequestBuilder, TransportError> {
    if let Some(body) = &request.body {
        let builder = with_content_type(builder, request, request.encoding_type.as_mime())?;
        return Ok(builder.body(body.clone()));
    }
    if request.parameters.is_empty() {
        return Ok(builder);
    }
    if request.method == Method::GET || request.method == Method::HEAD {
        return Ok(builder.query(&request.parameters));
    }

    match request.encoding_type {
        EncodingType::UrlEncoded => {
            let encoded = url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(request.parameters.iter())
                .finish();
            let builder = with_content_type(builder, request, EncodingType::UrlEncoded.as_mime())?;
            Ok(builder.body(encoded))
        }
        EncodingType::Multipart => {
            let form = request
                .parameters
                .iter()
                .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
                    form.text(name.clone(), value.clone())
                });
            Ok(builder.multipart(form))
        }
        EncodingType::TextPlain => {
            let text: String = request
                .parameters
                .iter()
                .map(|(name, value)| format!("{name}={value}\r\n"))
                .collect();
            let builder = with_content_type(builder, request, EncodingType::TextPlain.as_mime())?;
            Ok(builder.body(text))
        }
    }
}

fn with_content_type(
    builder: reqwest::RequestBuilder,
    request: &WebRequest,
    mime: &str,
) -> Result<reqwest::RequestBuilder, TransportError> {
    if request.additional_headers.contains_key(CONTENT_TYPE) {
        return Ok(builder);
    }
    let value = HeaderValue::from_str(&format!("{}; charset={}", mime, request.charset))
        .map_err(|_| TransportError::InvalidRequest(format!("bad charset {:?}", request.charset)))?;
    Ok(builder.header(CONTENT_TYPE, value))
}
