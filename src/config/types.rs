//! Configuration types and CLI options.
//!
//! This module defines enums and structs used for command-line argument parsing
//! and for building a fetch engine programmatically.

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    DEFAULT_MAX_CONCURRENCY, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT,
};
use crate::error_handling::ConfigError;
use crate::fetch::FetchOptions;
use crate::http::ProxySpec;
use crate::proxy::{parse_host_port, ProxyConfig};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
#[derive(Clone, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Named browser feature profiles selectable from the CLI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Profile {
    /// Current browsers: minimal query encoding, fragments kept across redirects
    Modern,
    /// Older engines: full query encoding, Latin-1 Location re-decoding, fragments dropped
    Legacy,
}

/// Browser behaviour switches that change how URLs and redirects are handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BrowserProfile {
    /// Only percent-encode the characters a browser must encode in the query.
    ///
    /// When false, the query is encoded aggressively and `Location` headers are
    /// re-read as Latin-1 bytes holding UTF-8.
    pub minimal_query_encoding: bool,
    /// Drop the fragment from redirect targets.
    pub redirect_without_hash: bool,
}

impl BrowserProfile {
    /// Profile matching current Chromium and Firefox behaviour.
    pub const fn modern() -> Self {
        Self {
            minimal_query_encoding: true,
            redirect_without_hash: false,
        }
    }

    /// Profile matching legacy engines.
    pub const fn legacy() -> Self {
        Self {
            minimal_query_encoding: false,
            redirect_without_hash: true,
        }
    }
}

impl Default for BrowserProfile {
    fn default() -> Self {
        Self::modern()
    }
}

impl From<Profile> for BrowserProfile {
    fn from(profile: Profile) -> Self {
        match profile {
            Profile::Modern => BrowserProfile::modern(),
            Profile::Legacy => BrowserProfile::legacy(),
        }
    }
}

/// Application configuration.
///
/// Parsed from the command line by the binary, or constructed directly by
/// library users with `..Default::default()`.
///
/// # Examples
///
/// ```no_run
/// use landing_url::Config;
///
/// let config = Config {
///     urls: vec!["https://example.com".to_string()],
///     pac_url: Some("http://wpad.example.com/proxy.pac".to_string()),
///     ..Default::default()
/// };
/// let options = config.fetch_options().expect("valid configuration");
/// assert!(options.redirect_enabled);
/// ```
#[derive(Debug, Clone, Parser)]
#[command(
    name = "landing_url",
    about = "Resolves the URL each navigation finally lands on."
)]
pub struct Config {
    /// URLs to resolve
    #[arg(value_parser, required = true)]
    pub urls: Vec<String>,

    /// Log level: error|warn|info|debug|trace
    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Log format: plain|json
    #[arg(long, value_enum, default_value_t = LogFormat::Plain)]
    pub log_format: LogFormat,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_seconds: u64,

    /// HTTP User-Agent header value
    #[arg(long, default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Static proxy as host:port
    #[arg(long, env = "LANDING_PROXY")]
    pub proxy: Option<String>,

    /// Scheme used to talk to the static proxy (http or https)
    #[arg(long, default_value = "http")]
    pub proxy_scheme: String,

    /// Treat the static proxy as a SOCKS proxy
    #[arg(long)]
    pub socks: bool,

    /// Regular expression for hosts that bypass the static proxy (repeatable)
    #[arg(long = "proxy-bypass")]
    pub proxy_bypass: Vec<String>,

    /// Proxy auto-configuration script URL
    #[arg(long, env = "LANDING_PAC_URL")]
    pub pac_url: Option<String>,

    /// Do not follow HTTP redirects
    #[arg(long)]
    pub no_redirects: bool,

    /// Browser feature profile: modern|legacy
    #[arg(long, value_enum, default_value_t = Profile::Modern)]
    pub profile: Profile,

    /// Maximum number of URLs resolved concurrently
    #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub max_concurrency: usize,

    /// Print fetch statistics at the end of the run
    #[arg(long)]
    pub show_stats: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            urls: Vec::new(),
            log_level: LogLevel::Info,
            log_format: LogFormat::Plain,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            proxy_scheme: "http".to_string(),
            socks: false,
            proxy_bypass: Vec::new(),
            pac_url: None,
            no_redirects: false,
            profile: Profile::Modern,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            show_stats: false,
        }
    }
}

impl Config {
    /// Builds the fetch options described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the proxy settings are malformed, a bypass
    /// pattern is not a valid regular expression, or both a static proxy and
    /// a PAC URL are given.
    pub fn fetch_options(&self) -> Result<FetchOptions, ConfigError> {
        let proxy = match (&self.pac_url, &self.proxy) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingProxySettings),
            (Some(pac_url), None) => ProxyConfig::auto_config(pac_url)?,
            (None, Some(proxy)) => {
                let (host, port) = parse_host_port(proxy)
                    .map_err(|_| ConfigError::InvalidProxy(proxy.clone()))?;
                let spec = match self.proxy_scheme.as_str() {
                    "http" | "https" => ProxySpec {
                        host,
                        port,
                        scheme: self.proxy_scheme.clone(),
                        socks: self.socks,
                    },
                    other => return Err(ConfigError::InvalidProxyScheme(other.to_string())),
                };
                ProxyConfig::fixed(spec, &self.proxy_bypass)?
            }
            (None, None) => ProxyConfig::Direct,
        };

        Ok(FetchOptions {
            redirect_enabled: !self.no_redirects,
            profile: self.profile.into(),
            proxy,
        })
    }
}
