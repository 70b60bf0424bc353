//! Same-URL revisit limit for one navigation.

use std::sync::{Mutex, MutexGuard, PoisonError};

use url::Url;

use super::context::RedirectContext;
use crate::config::ALLOWED_REDIRECTIONS_SAME_URL;

/// Owns the `RedirectContext` of one navigation and answers whether the
/// current URL has been revisited too often.
///
/// All fetches of a navigation share the guard, so the context sits behind a
/// mutex. Counts only grow, so a poisoned lock is still safe to read.
#[derive(Debug)]
pub struct RedirectLoopGuard {
    context: Mutex<RedirectContext>,
    limit: usize,
}

impl RedirectLoopGuard {
    pub fn new(origin: Url) -> Self {
        Self::with_limit(origin, ALLOWED_REDIRECTIONS_SAME_URL)
    }

    pub fn with_limit(origin: Url, limit: usize) -> Self {
        Self {
            context: Mutex::new(RedirectContext::new(origin)),
            limit,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RedirectContext> {
        self.context.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record_navigation(&self, url: &Url) {
        self.lock().record_navigation(url);
    }

    /// True once the current URL has been visited `limit` times.
    pub fn is_loop_reached(&self) -> bool {
        self.lock().current_visits() >= self.limit
    }

    pub fn origin_url(&self) -> Url {
        self.lock().origin_url().clone()
    }

    pub fn current_url(&self) -> Url {
        self.lock().current_url().clone()
    }

    /// Copy of the context as it is right now.
    pub fn snapshot(&self) -> RedirectContext {
        self.lock().clone()
    }
}
