//! Responses for URL schemes that never touch the network.
//!
//! `about:` URLs load an empty HTML page, `file:` URLs are read from disk and
//! `data:` URLs are decoded in place.

use base64::Engine;
use bytes::Bytes;
use percent_encoding::percent_decode_str;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::error_handling::TransportError;
use crate::http::{WebRequest, WebResponse};

const DATA_URL_DEFAULT_TYPE: &str = "text/plain;charset=US-ASCII";

/// Loads a request whose scheme is `about`, `file` or `data`.
pub(crate) async fn fetch_local(request: &WebRequest) -> Result<WebResponse, TransportError> {
    let (content_type, body) = match request.url.scheme() {
        "about" => ("text/html".to_string(), Bytes::new()),
        "file" => {
            let path = request.url.to_file_path().map_err(|_| {
                TransportError::InvalidRequest(format!("not a local file path: {}", request.url))
            })?;
            let content = tokio::fs::read(&path).await?;
            let extension = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase());
            (
                content_type_for_extension(extension.as_deref()).to_string(),
                Bytes::from(content),
            )
        }
        "data" => decode_data_url(request.url.as_str())?,
        other => return Err(TransportError::UnsupportedScheme(other.to_string())),
    };

    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&content_type)
        .map_err(|_| TransportError::InvalidDataUrl(format!("bad media type {content_type:?}")))?;
    headers.insert(CONTENT_TYPE, value);
    Ok(WebResponse::new(
        request.clone(),
        StatusCode::OK,
        headers,
        body,
    ))
}

fn content_type_for_extension(extension: Option<&str>) -> &'static str {
    match extension {
        Some("html") | Some("htm") => "text/html",
        Some("xhtml") => "application/xhtml+xml",
        Some("xml") => "application/xml",
        Some("txt") => "text/plain",
        Some("js") => "application/javascript",
        Some("pac") => "application/x-ns-proxy-autoconfig",
        Some("css") => "text/css",
        Some("json") => "application/json",
        _ => "application/octet-stream",
    }
}

/// Decodes `data:[<media type>][;base64],<payload>`.
///
/// The fragment, if any, is ignored.
fn decode_data_url(url: &str) -> Result<(String, Bytes), TransportError> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| TransportError::InvalidDataUrl(url.to_string()))?;
    let rest = rest.split('#').next().unwrap_or_default();
    let (meta, payload) = rest
        .split_once(',')
        .ok_or_else(|| TransportError::InvalidDataUrl(format!("missing ',' in {url}")))?;

    let meta = meta.trim();
    let (media_type, is_base64) = match meta.len().checked_sub(";base64".len()) {
        Some(split)
            if meta
                .get(split..)
                .is_some_and(|suffix| suffix.eq_ignore_ascii_case(";base64")) =>
        {
            (&meta[..split], true)
        }
        _ => (meta, false),
    };
    let media_type = if media_type.is_empty() || media_type.starts_with(';') {
        DATA_URL_DEFAULT_TYPE.to_string()
    } else {
        media_type.to_string()
    };

    let decoded: Vec<u8> = percent_decode_str(payload).collect();
    let body = if is_base64 {
        let compact: Vec<u8> = decoded
            .into_iter()
            .filter(|b| !b.is_ascii_whitespace())
            .collect();
        base64::engine::general_purpose::STANDARD
            .decode(&compact)
            .map_err(|e| TransportError::InvalidDataUrl(format!("bad base64 payload: {e}")))?
    } else {
        decoded
    };

    Ok((media_type, Bytes::from(body)))
}
