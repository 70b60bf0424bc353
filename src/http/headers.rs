//! Default request headers.
//!
//! Every outbound request carries a browser-like header set. The augmenter is
//! an injectable strategy so engines can swap the header profile without
//! touching the fetch pipeline.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};

use crate::config::DEFAULT_REQUEST_HEADERS;
use crate::error_handling::HeaderError;
use crate::http::WebRequest;

/// Adds the headers that must be present on every outbound request.
pub trait DefaultHeaders: Send + Sync {
    /// Mutates `request` in place. Headers the caller already set are kept.
    fn apply(&self, request: &mut WebRequest) -> Result<(), HeaderError>;
}

/// Realistic browser request headers.
///
/// These headers mimic a modern Chrome navigation so that servers answer with
/// the same redirects a browser would see.
#[derive(Debug, Clone)]
pub struct BrowserHeaders {
    user_agent: String,
}

impl BrowserHeaders {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }
}

impl DefaultHeaders for BrowserHeaders {
    fn apply(&self, request: &mut WebRequest) -> Result<(), HeaderError> {
        let headers = &mut request.additional_headers;
        insert_if_absent(headers, USER_AGENT, &self.user_agent)?;
        for &(name, value) in DEFAULT_REQUEST_HEADERS {
            insert_if_absent(headers, HeaderName::from_static(name), value)?;
        }
        Ok(())
    }
}

fn insert_if_absent(
    headers: &mut HeaderMap,
    name: HeaderName,
    value: &str,
) -> Result<(), HeaderError> {
    if headers.contains_key(&name) {
        return Ok(());
    }
    let header_value = HeaderValue::from_str(value).map_err(|_| HeaderError {
        name: name.to_string(),
        value: value.to_string(),
    })?;
    headers.insert(name, header_value);
    Ok(())
}
