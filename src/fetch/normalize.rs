//! Request URL canonicalization.

use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use url::Url;

use crate::config::{BrowserProfile, NON_NETWORK_SCHEMES};
use crate::error_handling::FetchError;

/// Characters legacy engines escape in a query on top of what the URL parser
/// already escapes. `%` is absent so existing escapes are kept as they are.
const FULL_QUERY_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'\'')
    .add(b'`')
    .add(b'[')
    .add(b'\\')
    .add(b']')
    .add(b'^')
    .add(b'{')
    .add(b'|')
    .add(b'}');

pub(crate) fn is_non_network(url: &Url) -> bool {
    NON_NETWORK_SCHEMES.contains(&url.scheme())
}

/// Canonicalizes the encoding of a request URL for `profile`.
///
/// With minimal query encoding the URL is kept as parsed. Otherwise the query
/// is additionally escaped the way legacy engines send it.
///
/// Non-ASCII query characters are always sent as UTF-8 escapes, whatever the
/// request charset says. `Url` has already escaped them as UTF-8 when it was
/// parsed, and those escapes are kept as they are. The request charset only
/// applies to the payload.
///
/// # Errors
///
/// Returns `FetchError::InvalidUrl` for URLs that cannot address a resource,
/// such as `javascript:` or `mailto:` URLs.
pub(crate) fn normalize_url(url: &Url, profile: &BrowserProfile) -> Result<Url, FetchError> {
    if url.cannot_be_a_base() {
        return Err(FetchError::InvalidUrl(url.to_string()));
    }
    if profile.minimal_query_encoding {
        return Ok(url.clone());
    }

    let mut normalized = url.clone();
    if let Some(query) = url.query() {
        let encoded = utf8_percent_encode(query, FULL_QUERY_ENCODE_SET).to_string();
        normalized.set_query(Some(&encoded));
    }
    Ok(normalized)
}
