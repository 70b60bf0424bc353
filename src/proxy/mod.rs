//! Per-request proxy selection.
//!
//! The resolver attaches a proxy to each outbound request from the configured
//! source: nothing, a static proxy with a bypass list, or a PAC script.
//! A proxy chosen by the caller always wins.

mod directive;
mod pac;

use std::sync::Arc;

use regex::Regex;
use url::Url;

use crate::error_handling::{ConfigError, ProxyError};
use crate::http::{ProxySpec, WebRequest};

pub use directive::{parse_host_port, ProxyDirective};
pub use pac::{PacCache, PacEvaluator, PacLoader, PacScript, QuickJsPacEvaluator};

/// Where proxies come from.
#[derive(Debug, Clone, Default)]
pub enum ProxyConfig {
    /// Always connect directly.
    #[default]
    Direct,
    /// One proxy for every host not matched by a bypass pattern.
    Static { proxy: ProxySpec, bypass: Vec<Regex> },
    /// Ask a PAC script, per request URL.
    AutoConfig { pac_url: Url },
}

impl ProxyConfig {
    /// Static proxy with bypass patterns (regular expressions on the host).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidBypassPattern` for an invalid pattern.
    pub fn fixed(proxy: ProxySpec, bypass: &[String]) -> Result<Self, ConfigError> {
        let bypass = bypass
            .iter()
            .map(|pattern| Regex::new(pattern))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ProxyConfig::Static { proxy, bypass })
    }

    /// PAC script configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPacUrl` if `pac_url` does not parse.
    pub fn auto_config(pac_url: &str) -> Result<Self, ConfigError> {
        let pac_url = Url::parse(pac_url).map_err(|source| ConfigError::InvalidPacUrl {
            url: pac_url.to_string(),
            source,
        })?;
        Ok(ProxyConfig::AutoConfig { pac_url })
    }

    pub fn pac_url(&self) -> Option<&Url> {
        match self {
            ProxyConfig::AutoConfig { pac_url } => Some(pac_url),
            _ => None,
        }
    }
}

/// Chooses the proxy for outbound requests.
pub struct ProxyResolver {
    config: ProxyConfig,
    evaluator: Arc<dyn PacEvaluator>,
}

impl ProxyResolver {
    pub fn new(config: ProxyConfig, evaluator: Arc<dyn PacEvaluator>) -> Self {
        Self { config, evaluator }
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn set_evaluator(&mut self, evaluator: Arc<dyn PacEvaluator>) {
        self.evaluator = evaluator;
    }

    /// Sets `request.proxy` unless the caller already chose one.
    ///
    /// With a PAC configuration the script is taken from `pac_cache`, and
    /// downloaded through `loader` the first time. A request for the PAC
    /// script itself is left untouched.
    ///
    /// # Errors
    ///
    /// Download, evaluation and directive failures are returned as they are;
    /// the request never silently falls back to a direct connection.
    pub async fn resolve(
        &self,
        request: &mut WebRequest,
        pac_cache: &PacCache,
        loader: &dyn PacLoader,
    ) -> Result<(), ProxyError> {
        if request.has_proxy() {
            return Ok(());
        }

        match &self.config {
            ProxyConfig::Direct => {}
            ProxyConfig::Static { proxy, bypass } => {
                let host = request.url.host_str().unwrap_or_default();
                if bypass.iter().any(|pattern| pattern.is_match(host)) {
                    log::debug!("{host} bypasses the static proxy");
                } else {
                    request.proxy = Some(proxy.clone());
                }
            }
            ProxyConfig::AutoConfig { pac_url } => {
                if same_file(pac_url, &request.url) {
                    return Ok(());
                }
                let script = pac_cache
                    .get_or_load(pac_url, || loader.load_pac(pac_url))
                    .await?;
                let directives = self.evaluator.evaluate(&script, &request.url).await?;
                log::debug!("PAC chose {directives:?} for {}", request.url);
                request.proxy = ProxyDirective::parse_first(&directives)?.into_proxy();
            }
        }
        Ok(())
    }
}

/// URLs naming the same resource, fragments ignored.
fn same_file(a: &Url, b: &Url) -> bool {
    let (mut a, mut b) = (a.clone(), b.clone());
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{ScriptedPacEvaluator, StaticPacLoader};

    fn request(url: &str) -> WebRequest {
        WebRequest::get(Url::parse(url).expect("valid url"))
    }

    fn pac_resolver(directives: &str) -> (ProxyResolver, Arc<ScriptedPacEvaluator>) {
        let evaluator = Arc::new(ScriptedPacEvaluator::always(directives));
        let config = ProxyConfig::auto_config("http://wpad.internal/proxy.pac").expect("valid url");
        (ProxyResolver::new(config, evaluator.clone()), evaluator)
    }

    #[tokio::test]
    async fn test_caller_proxy_wins() {
        let (resolver, evaluator) = pac_resolver("PROXY pac.proxy:8080");
        let loader = StaticPacLoader::new("// pac");
        let explicit = ProxySpec::http("explicit.proxy", 3128);
        let mut req = request("http://a.com/").with_proxy(explicit.clone());

        resolver
            .resolve(&mut req, &PacCache::new(), &loader)
            .await
            .expect("resolves");
        assert_eq!(req.proxy, Some(explicit));
        assert_eq!(loader.loads(), 0);
        assert_eq!(evaluator.calls(), 0);
    }

    #[tokio::test]
    async fn test_pac_directive_applied() {
        let (resolver, _) = pac_resolver("SOCKS socks.corp:1080; DIRECT");
        let loader = StaticPacLoader::new("// pac");
        let mut req = request("http://a.com/");

        resolver
            .resolve(&mut req, &PacCache::new(), &loader)
            .await
            .expect("resolves");
        assert_eq!(req.proxy, Some(ProxySpec::socks("socks.corp", 1080)));
    }

    #[tokio::test]
    async fn test_pac_script_fetched_once_per_cache() {
        let (resolver, evaluator) = pac_resolver("DIRECT");
        let loader = StaticPacLoader::new("// pac");
        let cache = PacCache::new();

        for i in 0..5 {
            let mut req = request(&format!("http://host{i}.example/"));
            resolver.resolve(&mut req, &cache, &loader).await.expect("resolves");
            assert_eq!(req.proxy, None);
        }
        assert_eq!(loader.loads(), 1);
        assert_eq!(evaluator.calls(), 5);
    }

    #[tokio::test]
    async fn test_request_for_pac_script_itself_is_skipped() {
        let (resolver, evaluator) = pac_resolver("PROXY pac.proxy:8080");
        let loader = StaticPacLoader::new("// pac");
        let mut req = request("http://wpad.internal/proxy.pac#v2");

        resolver
            .resolve(&mut req, &PacCache::new(), &loader)
            .await
            .expect("resolves");
        assert_eq!(req.proxy, None);
        assert_eq!(loader.loads(), 0);
        assert_eq!(evaluator.calls(), 0);
    }

    #[tokio::test]
    async fn test_pac_failures_propagate() {
        let (resolver, _) = pac_resolver("PROXY no-port");
        let loader = StaticPacLoader::new("// pac");
        let mut req = request("http://a.com/");
        let err = resolver
            .resolve(&mut req, &PacCache::new(), &loader)
            .await
            .expect_err("bad directive");
        assert!(matches!(err, ProxyError::InvalidHostPort(_)));

        let (resolver, _) = pac_resolver("DIRECT");
        let loader = StaticPacLoader::failing();
        let err = resolver
            .resolve(&mut req, &PacCache::new(), &loader)
            .await
            .expect_err("unreachable PAC");
        assert!(matches!(err, ProxyError::PacStatus { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_static_proxy_and_bypass() {
        let proxy = ProxySpec::http("proxy.corp", 3128);
        let config = ProxyConfig::fixed(proxy.clone(), &[r"\.internal$".to_string()])
            .expect("valid pattern");
        let resolver = ProxyResolver::new(config, Arc::new(ScriptedPacEvaluator::always("DIRECT")));
        let loader = StaticPacLoader::new("// unused");
        let cache = PacCache::new();

        let mut external = request("http://example.com/");
        resolver.resolve(&mut external, &cache, &loader).await.expect("resolves");
        assert_eq!(external.proxy, Some(proxy));

        let mut internal = request("http://git.internal/");
        resolver.resolve(&mut internal, &cache, &loader).await.expect("resolves");
        assert_eq!(internal.proxy, None);
    }

    #[test]
    fn test_invalid_config_values() {
        assert!(matches!(
            ProxyConfig::auto_config("not a url"),
            Err(ConfigError::InvalidPacUrl { .. })
        ));
        assert!(matches!(
            ProxyConfig::fixed(ProxySpec::http("p", 1), &["(".to_string()]),
            Err(ConfigError::InvalidBypassPattern(_))
        ));
    }
}
