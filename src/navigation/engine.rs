//! Navigation engines.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use super::{Navigation, NavigationCause, NavigationDecision, NavigationRequest};
use crate::config::{HEADER_REFRESH, MAX_REFRESH_FOLLOWS};
use crate::error_handling::{FetchEvent, NavigationError};
use crate::fetch::{FetchScope, RedirectingFetcher};
use crate::http::{WebRequest, WebResponse};

/// The page a top-level load ended on.
#[derive(Debug, Clone)]
pub struct Page {
    pub url: Url,
    pub response: WebResponse,
}

impl Page {
    pub fn from_response(response: WebResponse) -> Self {
        Self {
            url: response.url().clone(),
            response,
        }
    }
}

/// Loads a page the way a browser would.
///
/// Implementations perform every fetch of the load through a
/// `RedirectingFetcher` with a scope carrying `navigation`, and report in-page
/// navigations through `Navigation::begin` before following them.
#[async_trait]
pub trait NavigationEngine: Send + Sync {
    async fn load(&self, url: &Url, navigation: &Navigation) -> Result<Page, NavigationError>;
}

/// Minimal engine: a top-level GET plus `Refresh` header navigations.
///
/// It runs no scripts, so it never produces script-driven navigations.
pub struct HttpNavigator {
    fetcher: Arc<RedirectingFetcher>,
    max_refreshes: usize,
}

impl HttpNavigator {
    pub fn new(fetcher: Arc<RedirectingFetcher>) -> Self {
        Self {
            fetcher,
            max_refreshes: MAX_REFRESH_FOLLOWS,
        }
    }

    pub fn with_max_refreshes(mut self, max_refreshes: usize) -> Self {
        self.max_refreshes = max_refreshes;
        self
    }
}

#[async_trait]
impl NavigationEngine for HttpNavigator {
    async fn load(&self, url: &Url, navigation: &Navigation) -> Result<Page, NavigationError> {
        let scope = FetchScope::top_level(navigation.clone());
        let mut response = self
            .fetcher
            .fetch(WebRequest::get(url.clone()), &scope)
            .await?;

        for _ in 0..self.max_refreshes {
            let Some(target) = refresh_target(&response) else {
                break;
            };
            let request = NavigationRequest::new(target.clone(), NavigationCause::Refresh);
            if navigation.begin(&request) == NavigationDecision::Suppress {
                self.fetcher.stats().increment(FetchEvent::NavigationSuppressed);
                break;
            }
            log::debug!("Following Refresh from {} to {}", response.url(), target);
            response = self.fetcher.fetch(WebRequest::get(target), &scope).await?;
        }

        Ok(Page::from_response(response))
    }
}

/// Target of a `Refresh: <delay>; url=<target>` header, if it names another page.
fn refresh_target(response: &WebResponse) -> Option<Url> {
    let value = response.header_str(HEADER_REFRESH)?;
    let (_, rest) = value.split_once(';')?;
    let rest = rest.trim_start();
    let target = rest
        .get(..4)
        .filter(|prefix| prefix.eq_ignore_ascii_case("url="))
        .map_or(rest, |_| &rest[4..])
        .trim()
        .trim_matches(|c| c == '\'' || c == '"');
    if target.is_empty() {
        return None;
    }
    let resolved = response.url().join(target).ok()?;
    (resolved != *response.url()).then_some(resolved)
}
