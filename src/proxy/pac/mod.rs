//! Proxy auto-configuration scripts.
//!
//! A navigation downloads its PAC script at most once and keeps it in its
//! `PacCache`; every proxy lookup of the navigation then evaluates the cached
//! text against the request URL.

mod helpers;
mod quickjs;

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use url::Url;

use crate::error_handling::ProxyError;

pub use quickjs::QuickJsPacEvaluator;

/// A downloaded PAC script.
#[derive(Debug, Clone)]
pub struct PacScript {
    pub url: Url,
    pub content: Arc<str>,
}

/// Runs `FindProxyForURL` from a PAC script.
#[async_trait]
pub trait PacEvaluator: Send + Sync {
    /// Returns the raw directive list, e.g. `"PROXY 10.0.0.1:8080; DIRECT"`.
    async fn evaluate(&self, script: &PacScript, url: &Url) -> Result<String, ProxyError>;
}

/// Downloads PAC scripts.
#[async_trait]
pub trait PacLoader: Send + Sync {
    async fn load_pac(&self, pac_url: &Url) -> Result<String, ProxyError>;
}

/// Per-navigation PAC script slot, filled at most once.
///
/// Concurrent callers wait for the first download instead of starting their
/// own. A failed download leaves the slot empty so a later lookup can retry.
#[derive(Debug, Default)]
pub struct PacCache {
    script: OnceCell<PacScript>,
}

impl PacCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&PacScript> {
        self.script.get()
    }

    /// Returns the cached script for `url`, downloading it with `load` if the
    /// slot is empty.
    ///
    /// A slot already holding a different URL's script is left alone and the
    /// script is downloaded without being cached.
    pub async fn get_or_load<F, Fut>(&self, url: &Url, load: F) -> Result<PacScript, ProxyError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, ProxyError>>,
    {
        if let Some(cached) = self.script.get() {
            if cached.url == *url {
                return Ok(cached.clone());
            }
            log::warn!(
                "PAC cache holds {} but {} was requested; not caching",
                cached.url,
                url
            );
            return Ok(PacScript {
                url: url.clone(),
                content: load().await?.into(),
            });
        }

        let url = url.clone();
        self.script
            .get_or_try_init(move || async move {
                let content = load().await?;
                Ok(PacScript {
                    url,
                    content: content.into(),
                })
            })
            .await
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn pac_url() -> Url {
        Url::parse("http://wpad.internal/proxy.pac").expect("valid url")
    }

    #[tokio::test]
    async fn test_script_loaded_once() {
        let cache = PacCache::new();
        let loads = AtomicUsize::new(0);
        for _ in 0..5 {
            let script = cache
                .get_or_load(&pac_url(), || async {
                    loads.fetch_add(1, Ordering::SeqCst);
                    Ok("function FindProxyForURL(u, h) { return 'DIRECT'; }".to_string())
                })
                .await
                .expect("script loads");
            assert_eq!(script.url, pac_url());
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let cache = PacCache::new();
        let err = cache
            .get_or_load(&pac_url(), || async { Err(ProxyError::PacTooLarge(10)) })
            .await;
        assert!(err.is_err());
        assert!(cache.get().is_none());

        let script = cache
            .get_or_load(&pac_url(), || async { Ok("// ok".to_string()) })
            .await
            .expect("retry succeeds");
        assert_eq!(&*script.content, "// ok");
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_one_load() {
        let cache = Arc::new(PacCache::new());
        let loads = Arc::new(AtomicUsize::new(0));
        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let loads = loads.clone();
                tokio::spawn(async move {
                    cache
                        .get_or_load(&pac_url(), || async move {
                            loads.fetch_add(1, Ordering::SeqCst);
                            tokio::task::yield_now().await;
                            Ok("// pac".to_string())
                        })
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.expect("task ran").expect("script loads");
        }
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }
}
