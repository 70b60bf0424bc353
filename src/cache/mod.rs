//! Response cache.
//!
//! The cache is shared by every navigation of an engine. It supports
//! concurrent readers; two racing stores for the same key simply overwrite
//! each other, which costs a duplicate fetch at worst.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};

use crate::config::{
    DEFAULT_CACHE_TTL_SECS, HEADER_AGE, HEADER_CACHE_CONTROL, HEADER_VARY, MAX_CACHED_BODY_SIZE,
    MAX_CACHE_ENTRIES,
};
use crate::http::{WebRequest, WebResponse};

/// A response found in the cache, with its age at lookup time.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub response: WebResponse,
    pub age: Duration,
}

impl CachedResponse {
    /// Rebuilds the stored response as the answer to `request`.
    ///
    /// The replay carries the new request, is flagged `from_cache`, and has
    /// its `Age` header recomputed.
    pub fn replay_for(self, request: &WebRequest) -> WebResponse {
        let mut response = self.response;
        response.request = request.clone();
        response.from_cache = true;
        if let Ok(age) = HeaderValue::from_str(&self.age.as_secs().to_string()) {
            response.headers.insert(HEADER_AGE, age);
        }
        response
    }
}

/// Lookup/store contract of a response cache.
pub trait ResponseCache: Send + Sync {
    /// Returns a fresh cached response for `request`, if any.
    fn lookup(&self, request: &WebRequest) -> Option<CachedResponse>;

    /// Stores `response` as the answer to `request` if it is cacheable.
    ///
    /// Best-effort: returns whether the response was stored, never fails.
    fn store(&self, request: &WebRequest, response: &WebResponse) -> bool;
}

/// Cache that never stores anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl ResponseCache for NoCache {
    fn lookup(&self, _request: &WebRequest) -> Option<CachedResponse> {
        None
    }

    fn store(&self, _request: &WebRequest, _response: &WebResponse) -> bool {
        false
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    method: Method,
    url: String,
}

impl CacheKey {
    fn for_request(request: &WebRequest) -> Self {
        let mut url = request.url.clone();
        url.set_fragment(None);
        Self {
            method: request.method.clone(),
            url: url.into(),
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    response: WebResponse,
    /// Request header values the representation was selected by (`Vary`)
    vary: Vec<(HeaderName, Option<HeaderValue>)>,
    stored_at: Instant,
    expires_at: Instant,
}

impl CacheEntry {
    fn matches(&self, request: &WebRequest) -> bool {
        self.vary
            .iter()
            .all(|(name, value)| request.additional_headers.get(name) == value.as_ref())
    }
}

/// In-memory response cache keyed by method and URL, refined by `Vary`.
pub struct MemoryCache {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    max_entries: usize,
    default_ttl: Duration,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::with_limits(MAX_CACHE_ENTRIES, Duration::from_secs(DEFAULT_CACHE_TTL_SECS))
    }

    pub fn with_limits(max_entries: usize, default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_entries,
            default_ttl,
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Freshness lifetime for `response`, or `None` if it must not be cached.
    fn freshness(&self, request: &WebRequest, response: &WebResponse) -> Option<Duration> {
        if request.method != Method::GET
            || response.status != StatusCode::OK
            || response.from_cache
            || response.body.len() > MAX_CACHED_BODY_SIZE
        {
            return None;
        }
        if response.header_str(HEADER_VARY).is_some_and(|v| v.trim() == "*") {
            return None;
        }

        let mut ttl = self.default_ttl;
        if let Some(cache_control) = response.header_str(HEADER_CACHE_CONTROL) {
            for directive in cache_control.split(',').map(str::trim) {
                let lower = directive.to_ascii_lowercase();
                if lower == "no-store" || lower == "no-cache" {
                    return None;
                }
                if let Some(seconds) = lower.strip_prefix("max-age=") {
                    ttl = Duration::from_secs(seconds.trim_matches('"').parse().ok()?);
                }
            }
        }
        (!ttl.is_zero()).then_some(ttl)
    }

    fn make_room(entries: &mut HashMap<CacheKey, CacheEntry>, max_entries: usize, now: Instant) {
        entries.retain(|_, entry| entry.expires_at > now);
        while entries.len() >= max_entries {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.stored_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseCache for MemoryCache {
    fn lookup(&self, request: &WebRequest) -> Option<CachedResponse> {
        let key = CacheKey::for_request(request);
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let entry = entries.get(&key)?;
        let now = Instant::now();
        if entry.expires_at <= now || !entry.matches(request) {
            return None;
        }
        Some(CachedResponse {
            response: entry.response.clone(),
            age: now.duration_since(entry.stored_at),
        })
    }

    fn store(&self, request: &WebRequest, response: &WebResponse) -> bool {
        if self.max_entries == 0 {
            return false;
        }
        let Some(ttl) = self.freshness(request, response) else {
            return false;
        };

        let vary = response
            .header_str(HEADER_VARY)
            .map(|v| {
                v.split(',')
                    .filter_map(|name| HeaderName::from_bytes(name.trim().as_bytes()).ok())
                    .map(|name| {
                        let value = request.additional_headers.get(&name).cloned();
                        (name, value)
                    })
                    .collect()
            })
            .unwrap_or_default();

        let now = Instant::now();
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Self::make_room(&mut entries, self.max_entries, now);
        entries.insert(
            CacheKey::for_request(request),
            CacheEntry {
                response: response.clone(),
                vary,
                stored_at: now,
                expires_at: now + ttl,
            },
        );
        true
    }
}
