//! HTTP redirect handling.
//!
//! This module decides whether a response redirects, where to, and which
//! request follows it.

use reqwest::{Method, StatusCode};
use url::Url;

use crate::config::{BrowserProfile, HEADER_LOCATION};
use crate::http::{WebRequest, WebResponse};

/// Statuses that enter redirect processing: 301 to 308 except 304, a cache
/// answer, and 305, which is ignored. 306 gets its `Location` checked and
/// counts against the hop budget, but is never followed.
pub(crate) fn is_redirect_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 301..=303 | 306..=308)
}

/// Where a redirect response points.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum RedirectTarget {
    /// No `Location` header.
    Missing,
    /// A `Location` header that does not resolve to a URL.
    Malformed(String),
    Resolved(Url),
}

/// Resolves the `Location` header of `response` against its request URL.
///
/// Engines without minimal query encoding read the header as Latin-1 bytes
/// carrying UTF-8, and decode it as UTF-8. Otherwise each byte is one
/// character, as it came off the wire.
pub(crate) fn redirect_target(response: &WebResponse, profile: &BrowserProfile) -> RedirectTarget {
    let Some(raw) = response.header_value(HEADER_LOCATION) else {
        return RedirectTarget::Missing;
    };
    let location: String = if profile.minimal_query_encoding {
        raw.as_bytes().iter().map(|&b| char::from(b)).collect()
    } else {
        String::from_utf8_lossy(raw.as_bytes()).into_owned()
    };

    match response.url().join(location.trim()) {
        Ok(mut target) => {
            if profile.redirect_without_hash {
                target.set_fragment(None);
            }
            RedirectTarget::Resolved(target)
        }
        Err(_) => RedirectTarget::Malformed(location),
    }
}

/// Builds the request that follows a redirect of `request` to `target`.
///
/// 301, 302 and 303 switch to GET (HEAD stays HEAD) and drop the payload.
/// 307 and 308 keep the method. A POST, PUT or PATCH body travels with them
/// along with its encoding; a request without a body carries its parameters.
/// Charset and additional headers always carry over. The proxy is resolved
/// again for the new URL. Any other status has no follow-up.
pub(crate) fn follow_up_request(
    request: &WebRequest,
    status: StatusCode,
    target: Url,
) -> Option<WebRequest> {
    let mut next = match status.as_u16() {
        307 | 308 => {
            let mut next = WebRequest::new(target, request.method.clone());
            match &request.body {
                Some(body) if request.method_has_body() => {
                    next.body = Some(body.clone());
                    next.encoding_type = request.encoding_type;
                }
                Some(_) => {}
                None => {
                    next.parameters = request.parameters.clone();
                    next.encoding_type = request.encoding_type;
                }
            }
            next
        }
        301..=303 => {
            let method = if request.method == Method::HEAD {
                Method::HEAD
            } else {
                Method::GET
            };
            WebRequest::new(target, method)
        }
        _ => return None,
    };
    next.charset = request.charset.clone();
    next.additional_headers = request.additional_headers.clone();
    Some(next)
}

/// Whether `previous` and `next` address the same page.
///
/// They differ when host or path differ, when only one has a query, or when
/// both have queries that are not identical. Scheme, port and fragment are
/// not compared.
pub fn is_same_page(previous: &Url, next: &Url) -> bool {
    previous.host_str() == next.host_str()
        && previous.path() == next.path()
        && previous.query() == next.query()
}
