//! PAC directive parsing.

use std::str::FromStr;

use crate::error_handling::ProxyError;
use crate::http::ProxySpec;

/// One entry of a `FindProxyForURL` result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxyDirective {
    Direct,
    Proxy(ProxySpec),
}

impl ProxyDirective {
    /// Parses the first entry of a `;`-separated directive list.
    ///
    /// Later entries are fallbacks a browser would try when the first proxy is
    /// unreachable; connection failover is left to the transport, so they are
    /// ignored here.
    pub fn parse_first(list: &str) -> Result<Self, ProxyError> {
        list.split(';').next().unwrap_or_default().parse()
    }

    pub fn into_proxy(self) -> Option<ProxySpec> {
        match self {
            ProxyDirective::Direct => None,
            ProxyDirective::Proxy(spec) => Some(spec),
        }
    }
}

impl FromStr for ProxyDirective {
    type Err = ProxyError;

    fn from_str(directive: &str) -> Result<Self, Self::Err> {
        let directive = directive.trim();
        if directive.is_empty() {
            return Ok(ProxyDirective::Direct);
        }

        let (keyword, address) = directive
            .split_once(char::is_whitespace)
            .map(|(k, a)| (k, a.trim()))
            .unwrap_or((directive, ""));
        let keyword = keyword.to_ascii_uppercase();

        let build: fn(String, u16) -> ProxySpec = match keyword.as_str() {
            "DIRECT" => return Ok(ProxyDirective::Direct),
            "PROXY" | "HTTP" => |host, port| ProxySpec::http(host, port),
            "HTTPS" => |host, port| ProxySpec {
                scheme: "https".to_string(),
                ..ProxySpec::http(host, port)
            },
            "SOCKS" | "SOCKS4" | "SOCKS5" => |host, port| ProxySpec::socks(host, port),
            _ => {
                log::debug!("Unknown proxy directive {directive:?}, connecting directly");
                return Ok(ProxyDirective::Direct);
            }
        };

        if address.is_empty() {
            return Err(ProxyError::MalformedDirective(directive.to_string()));
        }
        let (host, port) = parse_host_port(address)?;
        Ok(ProxyDirective::Proxy(build(host, port)))
    }
}

/// Splits `host:port`, keeping brackets around IPv6 literals.
///
/// # Errors
///
/// Returns `ProxyError::InvalidHostPort` when the host is empty or the port is
/// missing, zero or out of range.
pub fn parse_host_port(value: &str) -> Result<(String, u16), ProxyError> {
    let invalid = || ProxyError::InvalidHostPort(value.to_string());
    let (host, port) = value.trim().rsplit_once(':').ok_or_else(invalid)?;

    let bracketed = host.starts_with('[') && host.ends_with(']');
    if host.is_empty() || (host.contains(':') && !bracketed) {
        return Err(invalid());
    }
    let port: u16 = port.parse().map_err(|_| invalid())?;
    if port == 0 {
        return Err(invalid());
    }
    Ok((host.to_string(), port))
}
