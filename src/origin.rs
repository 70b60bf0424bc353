//! Landing URL resolution.
//!
//! `OriginResolver` is the one place where fetch and navigation errors stop
//! propagating: a navigation that fails still yields the last URL it reached.

use std::sync::Arc;

use url::Url;

use crate::error_handling::{FetchEvent, FetchStats, NavigationError};
use crate::navigation::{Navigation, NavigationEngine};

/// Outcome of resolving a start URL.
#[derive(Debug)]
pub enum Resolution {
    /// The navigation completed on this URL.
    Resolved(Url),
    /// The navigation failed; `url` is the last URL it was known to be on.
    Fallback { url: Url, cause: NavigationError },
}

impl Resolution {
    pub fn url(&self) -> &Url {
        match self {
            Resolution::Resolved(url) | Resolution::Fallback { url, .. } => url,
        }
    }

    pub fn into_url(self) -> Url {
        match self {
            Resolution::Resolved(url) | Resolution::Fallback { url, .. } => url,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Resolution::Fallback { .. })
    }
}

/// Resolves the URL a navigation from a start URL ends up on.
///
/// Every call gets its own `Navigation`, so concurrent resolutions share
/// neither loop state nor the PAC script.
pub struct OriginResolver {
    engine: Arc<dyn NavigationEngine>,
    stats: Arc<FetchStats>,
}

impl OriginResolver {
    pub fn new(engine: Arc<dyn NavigationEngine>) -> Self {
        Self {
            engine,
            stats: Arc::new(FetchStats::new()),
        }
    }

    /// Counts fallbacks into `stats`, typically the fetcher's own.
    pub fn with_stats(mut self, stats: Arc<FetchStats>) -> Self {
        self.stats = stats;
        self
    }

    pub fn stats(&self) -> &Arc<FetchStats> {
        &self.stats
    }

    /// Loads `start` and returns where the navigation landed.
    ///
    /// Never fails. When the engine reports an error it is logged, and the
    /// navigation's current URL (`start` unless something was recorded) is
    /// returned together with the cause.
    pub async fn resolve(&self, start: &Url) -> Resolution {
        let navigation = Navigation::new(start.clone());
        match self.engine.load(start, &navigation).await {
            Ok(page) => {
                log::info!("{start} resolved to {}", page.url);
                Resolution::Resolved(page.url)
            }
            Err(cause) => {
                let url = navigation.current_url();
                log::error!("Failed to resolve {start}: {cause}. Falling back to {url}");
                self.stats.increment(FetchEvent::FallbackResolution);
                Resolution::Fallback { url, cause }
            }
        }
    }

    /// Convenience form of [`OriginResolver::resolve`] returning only the URL.
    pub async fn resolve_url(&self, start: &Url) -> Url {
        self.resolve(start).await.into_url()
    }
}
