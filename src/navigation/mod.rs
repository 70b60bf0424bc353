//! Top-level navigation state and the navigation engine seam.
//!
//! A `Navigation` is created for each top-level load and handed to every fetch
//! the load performs. It carries the navigation's `RedirectLoopGuard` and its
//! PAC script cache. Cloning the handle shares that state with child tasks of
//! the same navigation; unrelated navigations always get their own handle, so
//! nothing leaks between them. Dropping the last clone releases the state.

mod context;
mod engine;
mod guard;

use std::sync::Arc;

use url::Url;

use crate::config::TARGET_SELF;
use crate::proxy::PacCache;

pub use context::RedirectContext;
pub use engine::{HttpNavigator, NavigationEngine, Page};
pub use guard::RedirectLoopGuard;

/// The browsing context a fetch or navigation originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowKind {
    /// The top-level window of the navigation.
    #[default]
    TopLevel,
    /// An embedded frame or any other nested context.
    Frame,
}

/// Why a navigation was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationCause {
    /// A script assigned a new location.
    ScriptLocation,
    /// A `Refresh` header or meta refresh.
    Refresh,
    /// A followed link.
    Link,
    /// A submitted form.
    Form,
    Other,
}

/// An in-page navigation reported by the engine before it starts loading.
#[derive(Debug, Clone)]
pub struct NavigationRequest {
    pub url: Url,
    /// Target window name; `None`, empty and `_self` mean the requesting window.
    pub target: Option<String>,
    pub window: WindowKind,
    pub cause: NavigationCause,
}

impl NavigationRequest {
    /// Navigation of the top-level window onto itself.
    pub fn new(url: Url, cause: NavigationCause) -> Self {
        Self {
            url,
            target: None,
            window: WindowKind::TopLevel,
            cause,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn from_window(mut self, window: WindowKind) -> Self {
        self.window = window;
        self
    }

    pub fn targets_self(&self) -> bool {
        self.target
            .as_deref()
            .is_none_or(|t| t.is_empty() || t == TARGET_SELF)
    }

    /// Whether this navigation replaces the top-level document.
    pub fn is_top_level(&self) -> bool {
        self.targets_self() && self.window == WindowKind::TopLevel
    }

    /// Whether the loop guard may suppress this navigation.
    pub fn is_loop_tracked(&self) -> bool {
        self.is_top_level() && self.cause == NavigationCause::ScriptLocation
    }
}

/// Outcome of `Navigation::begin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationDecision {
    /// Load the target.
    Proceed,
    /// The top-level document keeps redirecting to itself: drop the navigation.
    Suppress,
}

#[derive(Debug)]
struct NavigationState {
    guard: RedirectLoopGuard,
    pac: PacCache,
}

/// Shared state of one top-level navigation.
#[derive(Debug, Clone)]
pub struct Navigation {
    inner: Arc<NavigationState>,
}

impl Navigation {
    pub fn new(origin: Url) -> Self {
        Self::with_guard(RedirectLoopGuard::new(origin))
    }

    pub fn with_guard(guard: RedirectLoopGuard) -> Self {
        Self {
            inner: Arc::new(NavigationState {
                guard,
                pac: PacCache::new(),
            }),
        }
    }

    pub fn guard(&self) -> &RedirectLoopGuard {
        &self.inner.guard
    }

    pub fn pac_cache(&self) -> &PacCache {
        &self.inner.pac
    }

    pub fn record_navigation(&self, url: &Url) {
        self.inner.guard.record_navigation(url);
    }

    pub fn is_loop_reached(&self) -> bool {
        self.inner.guard.is_loop_reached()
    }

    pub fn origin_url(&self) -> Url {
        self.inner.guard.origin_url()
    }

    pub fn current_url(&self) -> Url {
        self.inner.guard.current_url()
    }

    /// Hook engines call before loading an in-page navigation.
    ///
    /// A script-driven location change of the top-level window is suppressed
    /// once the loop guard trips. Every other navigation proceeds; those that
    /// replace the top-level document are recorded.
    pub fn begin(&self, request: &NavigationRequest) -> NavigationDecision {
        if request.is_loop_tracked() && self.is_loop_reached() {
            log::debug!(
                "Suppressing script navigation to {} (loop limit reached at {})",
                request.url,
                self.current_url()
            );
            return NavigationDecision::Suppress;
        }
        if request.is_top_level() {
            self.record_navigation(&request.url);
        }
        NavigationDecision::Proceed
    }

    /// True if both handles belong to the same navigation.
    pub fn same_navigation(&self, other: &Navigation) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ALLOWED_REDIRECTIONS_SAME_URL;

    fn url(s: &str) -> Url {
        Url::parse(s).expect("valid url")
    }

    #[test]
    fn test_target_names_denoting_self() {
        let page = url("http://a.com/");
        let req = NavigationRequest::new(page.clone(), NavigationCause::Link);
        assert!(req.targets_self());
        assert!(req.clone().with_target("").targets_self());
        assert!(req.clone().with_target("_self").targets_self());
        assert!(!req.with_target("_blank").targets_self());
    }

    #[test]
    fn test_script_navigation_suppressed_once_loop_reached() {
        let nav = Navigation::new(url("http://a.com/"));
        let loop_url = url("http://a.com/loop");
        let script = NavigationRequest::new(loop_url.clone(), NavigationCause::ScriptLocation);

        for _ in 0..ALLOWED_REDIRECTIONS_SAME_URL {
            assert_eq!(nav.begin(&script), NavigationDecision::Proceed);
        }
        assert!(nav.is_loop_reached());
        assert_eq!(nav.begin(&script), NavigationDecision::Suppress);
        assert_eq!(nav.guard().snapshot().visit_count(&loop_url), ALLOWED_REDIRECTIONS_SAME_URL);
    }

    #[test]
    fn test_untracked_navigations_never_suppressed() {
        let nav = Navigation::new(url("http://a.com/"));
        let loop_url = url("http://a.com/loop");
        for _ in 0..ALLOWED_REDIRECTIONS_SAME_URL {
            nav.record_navigation(&loop_url);
        }

        let link = NavigationRequest::new(loop_url.clone(), NavigationCause::Link);
        let frame = NavigationRequest::new(loop_url.clone(), NavigationCause::ScriptLocation)
            .from_window(WindowKind::Frame);
        let popup = NavigationRequest::new(loop_url, NavigationCause::ScriptLocation)
            .with_target("_blank");

        assert_eq!(nav.begin(&link), NavigationDecision::Proceed);
        assert_eq!(nav.begin(&frame), NavigationDecision::Proceed);
        assert_eq!(nav.begin(&popup), NavigationDecision::Proceed);
    }

    #[test]
    fn test_refresh_navigation_is_recorded_but_never_suppressed() {
        let nav = Navigation::new(url("http://a.com/"));
        let target = url("http://a.com/splash#top");
        let refresh = NavigationRequest::new(target.clone(), NavigationCause::Refresh);

        for _ in 0..ALLOWED_REDIRECTIONS_SAME_URL {
            assert_eq!(nav.begin(&refresh), NavigationDecision::Proceed);
        }
        assert_eq!(nav.current_url(), target);
        assert_eq!(nav.guard().snapshot().visit_count(&target), ALLOWED_REDIRECTIONS_SAME_URL);
        assert!(nav.is_loop_reached());

        assert_eq!(nav.begin(&refresh), NavigationDecision::Proceed);
        let script = NavigationRequest::new(target, NavigationCause::ScriptLocation);
        assert_eq!(nav.begin(&script), NavigationDecision::Suppress);
    }

    #[test]
    fn test_frame_navigation_is_not_recorded() {
        let nav = Navigation::new(url("http://a.com/"));
        let frame = NavigationRequest::new(url("http://ads.example/frame"), NavigationCause::Link)
            .from_window(WindowKind::Frame);
        nav.begin(&frame);
        assert_eq!(nav.current_url(), url("http://a.com/"));
    }

    #[test]
    fn test_clones_share_state_and_new_navigations_do_not() {
        let nav = Navigation::new(url("http://a.com/"));
        let child = nav.clone();
        child.record_navigation(&url("http://a.com/next"));
        assert_eq!(nav.current_url(), url("http://a.com/next"));
        assert!(nav.same_navigation(&child));

        let unrelated = Navigation::new(url("http://a.com/"));
        assert!(!nav.same_navigation(&unrelated));
        assert_eq!(unrelated.current_url(), url("http://a.com/"));
    }
}
