//! Per-navigation redirect state.

use std::collections::HashMap;

use url::Url;

/// Redirect state of one top-level navigation.
///
/// Visit counts are keyed by the URL without its fragment, so `/a#x` and
/// `/a#y` count as the same document.
#[derive(Debug, Clone)]
pub struct RedirectContext {
    origin_url: Url,
    current_url: Url,
    visit_counts: HashMap<String, usize>,
}

impl RedirectContext {
    /// Starts a context where both origin and current URL are `origin`.
    pub fn new(origin: Url) -> Self {
        Self {
            current_url: origin.clone(),
            origin_url: origin,
            visit_counts: HashMap::new(),
        }
    }

    pub fn origin_url(&self) -> &Url {
        &self.origin_url
    }

    /// URL most recently navigated to (the origin until a navigation is recorded).
    pub fn current_url(&self) -> &Url {
        &self.current_url
    }

    pub fn visit_count(&self, url: &Url) -> usize {
        self.visit_counts.get(&visit_key(url)).copied().unwrap_or(0)
    }

    /// Visits recorded for the current URL.
    pub fn current_visits(&self) -> usize {
        self.visit_count(&self.current_url)
    }

    /// Counts one more visit of `url` and makes it the current URL.
    pub fn record_navigation(&mut self, url: &Url) {
        *self.visit_counts.entry(visit_key(url)).or_insert(0) += 1;
        self.current_url = url.clone();
    }
}

fn visit_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.into()
}
