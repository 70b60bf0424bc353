//! landing_url library: redirect-aware resolution of landing URLs
//!
//! This library follows a navigation from a start URL to the page it finally
//! lands on. HTTP redirects are followed with a bounded hop budget, navigations
//! that keep returning to the same page are cut short, and every outbound
//! request can be routed through a static proxy or a PAC script.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use landing_url::{
//!     FetchOptions, HttpNavigator, OriginResolver, RedirectingFetcher, ReqwestTransport,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(10))?);
//! let fetcher = Arc::new(RedirectingFetcher::new(transport, FetchOptions::default()));
//! let resolver = OriginResolver::new(Arc::new(HttpNavigator::new(fetcher)));
//!
//! let landed = resolver.resolve(&"http://example.com/".parse()?).await;
//! println!("landed on {}", landed.url());
//! # Ok(())
//! # }
//! ```
//!
//! # Requirements
//!
//! This library requires a Tokio runtime. Use `#[tokio::main]` in your application
//! or ensure you're calling library functions within an async context.

pub mod cache;
pub mod config;
pub mod error_handling;
pub mod fetch;
pub mod http;
pub mod initialization;
pub mod navigation;
mod origin;
pub mod proxy;
pub mod transport;

#[cfg(test)]
mod test_helpers;

// Re-export public API
pub use config::{BrowserProfile, Config, LogFormat, LogLevel, Profile};
pub use error_handling::{FetchError, FetchEvent, FetchStats, NavigationError, ProxyError};
pub use fetch::{FetchOptions, FetchScope, RedirectingFetcher};
pub use http::{WebRequest, WebResponse};
pub use navigation::{HttpNavigator, Navigation, NavigationEngine, RedirectLoopGuard};
pub use origin::{OriginResolver, Resolution};
pub use proxy::{ProxyConfig, ProxyResolver};
pub use run::{run_resolve, ResolveReport};
pub use transport::{ReqwestTransport, Transport};

// Internal run module (resolves every configured URL)
mod run {
    use std::sync::Arc;
    use std::time::Instant;

    use anyhow::{Context, Result};
    use futures::stream::FuturesUnordered;
    use futures::StreamExt;
    use log::{info, warn};
    use url::Url;

    use crate::config::Config;
    use crate::error_handling::{FetchEvent, FetchStats};
    use crate::fetch::RedirectingFetcher;
    use crate::http::BrowserHeaders;
    use crate::initialization::{init_semaphore, init_transport};
    use crate::navigation::HttpNavigator;
    use crate::origin::{OriginResolver, Resolution};

    /// Results of resolving every URL of a `Config`.
    #[derive(Debug)]
    pub struct ResolveReport {
        /// One `(start, resolution)` pair per valid input URL, in completion order
        pub resolutions: Vec<(Url, Resolution)>,
        /// Inputs that were not valid URLs
        pub invalid: Vec<String>,
        /// Events counted during the run
        pub stats: Arc<FetchStats>,
        /// Wall-clock duration of the run
        pub elapsed_seconds: f64,
    }

    impl ResolveReport {
        /// Number of resolutions that had to fall back.
        pub fn fallbacks(&self) -> usize {
            self.resolutions
                .iter()
                .filter(|(_, resolution)| resolution.is_fallback())
                .count()
        }
    }

    /// Resolves the landing URL of every URL in `config`.
    ///
    /// At most `config.max_concurrency` navigations run at once. Each one gets
    /// its own loop guard and PAC cache; the transport, response cache and
    /// statistics are shared.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP transport
    /// cannot be built. Individual navigations never fail the run.
    pub async fn run_resolve(config: Config) -> Result<ResolveReport> {
        let started = Instant::now();
        let options = config
            .fetch_options()
            .context("Invalid proxy or redirect configuration")?;
        let transport = init_transport(&config).context("Failed to initialize HTTP transport")?;
        let stats = Arc::new(FetchStats::new());

        let fetcher = Arc::new(
            RedirectingFetcher::new(transport, options)
                .with_default_headers(Arc::new(BrowserHeaders::new(config.user_agent.clone())))
                .with_stats(stats.clone()),
        );
        let resolver = Arc::new(
            OriginResolver::new(Arc::new(HttpNavigator::new(fetcher))).with_stats(stats.clone()),
        );
        let semaphore = init_semaphore(config.max_concurrency);

        let mut invalid = Vec::new();
        let mut tasks = FuturesUnordered::new();
        for raw in &config.urls {
            let start = match Url::parse(raw.trim()) {
                Ok(url) => url,
                Err(e) => {
                    warn!("Skipping invalid URL {raw:?}: {e}");
                    invalid.push(raw.clone());
                    continue;
                }
            };
            let resolver = Arc::clone(&resolver);
            let semaphore = Arc::clone(&semaphore);
            tasks.push(tokio::spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .context("Concurrency limiter closed")?;
                let resolution = resolver.resolve(&start).await;
                Ok::<_, anyhow::Error>((start, resolution))
            }));
        }

        let mut resolutions = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.next().await {
            match joined {
                Ok(Ok(resolved)) => resolutions.push(resolved),
                Ok(Err(e)) => warn!("Resolution task failed: {e:#}"),
                Err(e) => warn!("Resolution task panicked: {e}"),
            }
        }

        let elapsed_seconds = started.elapsed().as_secs_f64();
        info!(
            "Resolved {} URL(s) in {:.2}s ({} fallbacks)",
            resolutions.len(),
            elapsed_seconds,
            stats.count(FetchEvent::FallbackResolution)
        );

        Ok(ResolveReport {
            resolutions,
            invalid,
            stats,
            elapsed_seconds,
        })
    }
}
