//! Redirect-aware fetching.
//!
//! `RedirectingFetcher` issues one logical fetch: it canonicalizes the URL,
//! attaches a proxy and the default headers, answers from the cache when it
//! can, and follows up to `MAX_REDIRECT_HOPS` redirects. Navigations that keep
//! redirecting to the same page are cut short through the loop guard of the
//! fetch's `Navigation`.

mod normalize;
mod redirects;

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::cache::{MemoryCache, ResponseCache};
use crate::config::{BrowserProfile, DEFAULT_USER_AGENT, MAX_PAC_SCRIPT_SIZE, MAX_REDIRECT_HOPS};
use crate::error_handling::{FetchError, FetchEvent, FetchStats, ProxyError};
use crate::http::{BrowserHeaders, DefaultHeaders, WebRequest, WebResponse};
use crate::navigation::{Navigation, WindowKind};
use crate::proxy::{PacCache, PacEvaluator, PacLoader, ProxyConfig, ProxyResolver, QuickJsPacEvaluator};
use crate::transport::Transport;

use self::normalize::{is_non_network, normalize_url};
use self::redirects::{follow_up_request, is_redirect_status, redirect_target, RedirectTarget};

pub use self::redirects::is_same_page;

/// Behaviour switches of a fetcher.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Follow 3xx responses. When false, redirects are returned as they are.
    pub redirect_enabled: bool,
    pub profile: BrowserProfile,
    pub proxy: ProxyConfig,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            redirect_enabled: true,
            profile: BrowserProfile::default(),
            proxy: ProxyConfig::Direct,
        }
    }
}

/// What a fetch belongs to.
///
/// A scope with a navigation ties the fetch to that navigation's loop guard
/// and PAC cache. Without one the fetch is untracked: never loop-limited, and
/// any PAC script is downloaded for this fetch alone.
#[derive(Debug, Clone, Default)]
pub struct FetchScope {
    navigation: Option<Navigation>,
    window: WindowKind,
    pac_bootstrap: bool,
}

impl FetchScope {
    pub fn untracked() -> Self {
        Self::default()
    }

    /// Fetch made by the top-level window of `navigation`.
    pub fn top_level(navigation: Navigation) -> Self {
        Self {
            navigation: Some(navigation),
            window: WindowKind::TopLevel,
            pac_bootstrap: false,
        }
    }

    /// Fetch made by a nested frame of `navigation`.
    pub fn frame(navigation: Navigation) -> Self {
        Self {
            navigation: Some(navigation),
            window: WindowKind::Frame,
            pac_bootstrap: false,
        }
    }

    pub fn navigation(&self) -> Option<&Navigation> {
        self.navigation.as_ref()
    }

    pub fn window(&self) -> WindowKind {
        self.window
    }

    /// Scope of the PAC script download: untracked, and never proxied
    /// through the script it is downloading.
    fn pac_bootstrap() -> Self {
        Self {
            pac_bootstrap: true,
            ..Self::default()
        }
    }
}

enum Step {
    Done(WebResponse),
    Follow(WebRequest),
}

/// Fetches requests and follows their redirects.
pub struct RedirectingFetcher {
    transport: Arc<dyn Transport>,
    options: FetchOptions,
    proxy: ProxyResolver,
    cache: Arc<dyn ResponseCache>,
    default_headers: Arc<dyn DefaultHeaders>,
    stats: Arc<FetchStats>,
}

impl RedirectingFetcher {
    /// Fetcher with an in-memory cache, browser headers and QuickJS PAC evaluation.
    pub fn new(transport: Arc<dyn Transport>, options: FetchOptions) -> Self {
        let proxy = ProxyResolver::new(options.proxy.clone(), Arc::new(QuickJsPacEvaluator::new()));
        Self {
            transport,
            options,
            proxy,
            cache: Arc::new(MemoryCache::new()),
            default_headers: Arc::new(BrowserHeaders::new(DEFAULT_USER_AGENT)),
            stats: Arc::new(FetchStats::new()),
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ResponseCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_default_headers(mut self, default_headers: Arc<dyn DefaultHeaders>) -> Self {
        self.default_headers = default_headers;
        self
    }

    pub fn with_pac_evaluator(mut self, evaluator: Arc<dyn PacEvaluator>) -> Self {
        self.proxy.set_evaluator(evaluator);
        self
    }

    pub fn with_stats(mut self, stats: Arc<FetchStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    pub fn stats(&self) -> &Arc<FetchStats> {
        &self.stats
    }

    /// Fetches `request`, following redirects, and returns the final response.
    ///
    /// # Errors
    ///
    /// - `FetchError::RedirectLimitExceeded` when a redirect arrives after
    ///   `MAX_REDIRECT_HOPS` hops were already followed
    /// - `FetchError::Proxy` when the proxy cannot be resolved
    /// - `FetchError::DefaultHeaders` when the default headers cannot be applied
    /// - `FetchError::Transport` for network and local resource failures
    pub async fn fetch(&self, request: WebRequest, scope: &FetchScope) -> Result<WebResponse, FetchError> {
        let own_pac_cache;
        let pac_cache = match scope.navigation() {
            Some(navigation) => navigation.pac_cache(),
            None => {
                own_pac_cache = PacCache::new();
                &own_pac_cache
            }
        };

        let mut request = request;
        let mut remaining_hops = MAX_REDIRECT_HOPS;
        loop {
            match self.step(request, scope, pac_cache, remaining_hops).await? {
                Step::Done(response) => return Ok(response),
                Step::Follow(next) => {
                    request = next;
                    remaining_hops -= 1;
                }
            }
        }
    }

    async fn step(
        &self,
        mut request: WebRequest,
        scope: &FetchScope,
        pac_cache: &PacCache,
        remaining_hops: usize,
    ) -> Result<Step, FetchError> {
        if is_non_network(&request.url) {
            return Ok(Step::Done(self.transport.fetch(&request).await?));
        }

        request.url = normalize_url(&request.url, &self.options.profile)?;
        if !scope.pac_bootstrap {
            self.proxy.resolve(&mut request, pac_cache, self).await?;
        }
        self.default_headers.apply(&mut request)?;

        let response = match self.cache.lookup(&request) {
            Some(cached) => {
                log::debug!("Cache hit for {} {}", request.method, request.url);
                self.stats.increment(FetchEvent::CacheHit);
                cached.replay_for(&request)
            }
            None => {
                log::debug!("Fetching {} {}", request.method, request.url);
                self.transport.fetch(&request).await?
            }
        };

        if scope.navigation().is_some_and(Navigation::is_loop_reached) {
            log::debug!(
                "Loop limit reached, returning {} for {} as is",
                response.status,
                request.url
            );
            self.stats.increment(FetchEvent::LoopSuppressed);
            return Ok(Step::Done(response));
        }

        if response.status.as_u16() == 305 {
            log::warn!("Ignoring HTTP status code [305] 'Use Proxy' for {}", request.url);
            self.stats.increment(FetchEvent::UseProxyIgnored);
        } else if self.options.redirect_enabled && is_redirect_status(response.status) {
            let target = match redirect_target(&response, &self.options.profile) {
                RedirectTarget::Resolved(target) => target,
                RedirectTarget::Missing => return Ok(Step::Done(response)),
                RedirectTarget::Malformed(location) => {
                    log::warn!(
                        "Got a redirect status code [{} {}] but the location is not a valid URL [{}]. Skipping redirection processing.",
                        response.status.as_u16(),
                        response.status_message(),
                        location
                    );
                    self.stats.increment(FetchEvent::MalformedLocation);
                    return Ok(Step::Done(response));
                }
            };

            if remaining_hops == 0 {
                self.stats.increment(FetchEvent::RedirectLimitExceeded);
                return Err(FetchError::RedirectLimitExceeded {
                    url: request.url,
                    response: Box::new(response),
                });
            }

            let Some(next) = follow_up_request(&request, response.status, target) else {
                log::debug!("No follow-up for status {} from {}", response.status.as_u16(), request.url);
                return Ok(Step::Done(self.finalize(&request, response)));
            };
            if is_same_page(&request.url, &next.url) && is_top_level_html(scope, &response) {
                if let Some(navigation) = scope.navigation() {
                    navigation.record_navigation(&next.url);
                    self.stats.increment(FetchEvent::SamePageRedirect);
                }
            }
            log::debug!(
                "Following {} from {} to {} ({} hops left)",
                response.status.as_u16(),
                request.url,
                next.url,
                remaining_hops - 1
            );
            self.stats.increment(FetchEvent::RedirectFollowed);
            return Ok(Step::Follow(next));
        }

        Ok(Step::Done(self.finalize(&request, response)))
    }

    /// Stores a network response in the cache; a failed store is not an error.
    fn finalize(&self, request: &WebRequest, response: WebResponse) -> WebResponse {
        if !response.from_cache && self.cache.store(request, &response) {
            self.stats.increment(FetchEvent::CacheStored);
        }
        response
    }
}

/// Whether `response` is an HTML document loaded by the top-level window.
fn is_top_level_html(scope: &FetchScope, response: &WebResponse) -> bool {
    scope.window() == WindowKind::TopLevel && response.is_html()
}

#[async_trait]
impl PacLoader for RedirectingFetcher {
    async fn load_pac(&self, pac_url: &Url) -> Result<String, ProxyError> {
        log::info!("Fetching PAC script from {pac_url}");
        let response = self
            .fetch(WebRequest::get(pac_url.clone()), &FetchScope::pac_bootstrap())
            .await
            .map_err(|source| ProxyError::PacFetch {
                url: pac_url.clone(),
                source: Box::new(source),
            })?;

        if !response.status.is_success() {
            return Err(ProxyError::PacStatus {
                url: pac_url.clone(),
                status: response.status.as_u16(),
            });
        }
        if response.body.len() > MAX_PAC_SCRIPT_SIZE {
            return Err(ProxyError::PacTooLarge(response.body.len()));
        }
        self.stats.increment(FetchEvent::PacFetched);
        Ok(response.text())
    }
}
