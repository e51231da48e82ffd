//! Service configuration.
//!
//! Everything is read once at startup, from the environment, into an
//! immutable [`Config`]. Components receive it by reference and never touch
//! the environment themselves.

use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Where `/` redirects when `HOMEPAGE_URL` is not set.
pub const DEFAULT_HOMEPAGE: &str = "https://github.com/carolyn-sun/google-fonts-proxy-worker";

/// One year, in seconds.
pub const DEFAULT_MAX_AGE: u64 = 31_536_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: SocketAddr,
    /// Public host (or full base URL) substituted into rewritten CSS.
    /// `None` means "whatever origin the request arrived on".
    pub proxy_domain: Option<String>,
    /// Shared secret for the purge path. `None` leaves purging open.
    pub purge_key: Option<String>,
    /// Domains admitted by the access gate. Empty disables the gate.
    pub allowed_origins: Vec<String>,
    /// `max-age` advertised on every proxied response.
    pub cache_max_age: u64,
    pub cache_capacity: u64,
    pub cache_ttl: Duration,
    pub upstream_timeout: Duration,
    pub homepage_url: String,
}

impl Config {
    /// Loads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Blank values count as unset, so `ALLOWED_ORIGINS=` disables the gate
    /// rather than denying everything.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let defaults = Self::default();

        Ok(Self {
            listen_addr: parse_or(get("LISTEN_ADDR"), "LISTEN_ADDR", defaults.listen_addr)?,
            proxy_domain: get("PROXY_DOMAIN"),
            purge_key: get("CACHE_PURGE_KEY"),
            allowed_origins: get("ALLOWED_ORIGINS")
                .map(|csv| parse_origin_list(&csv))
                .unwrap_or_default(),
            cache_max_age: parse_or(get("CACHE_MAX_AGE"), "CACHE_MAX_AGE", defaults.cache_max_age)?,
            cache_capacity: parse_or(get("CACHE_CAPACITY"), "CACHE_CAPACITY", defaults.cache_capacity)?,
            cache_ttl: Duration::from_secs(parse_or(
                get("CACHE_TTL"),
                "CACHE_TTL",
                defaults.cache_ttl.as_secs(),
            )?),
            upstream_timeout: Duration::from_secs(parse_or(
                get("UPSTREAM_TIMEOUT"),
                "UPSTREAM_TIMEOUT",
                defaults.upstream_timeout.as_secs(),
            )?),
            homepage_url: match get("HOMEPAGE_URL") {
                Some(value) => parse_homepage(value)?,
                None => defaults.homepage_url,
            },
        })
    }

    /// The base URL that replaces upstream hosts inside CSS.
    ///
    /// A bare `PROXY_DOMAIN` is served over https; a value that already
    /// carries a scheme is used verbatim. Without an override the request's
    /// own origin is used. The result never ends in `/`.
    pub fn proxy_base(&self, request_origin: &str) -> String {
        let base = match &self.proxy_domain {
            Some(domain) if domain.contains("://") => domain.clone(),
            Some(domain) => format!("https://{domain}"),
            None => request_origin.to_owned(),
        };
        base.trim_end_matches('/').to_owned()
    }

    pub fn cache_control(&self) -> String {
        format!("public, max-age={}", self.cache_max_age)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            proxy_domain: None,
            purge_key: None,
            allowed_origins: Vec::new(),
            cache_max_age: DEFAULT_MAX_AGE,
            cache_capacity: 10_000,
            cache_ttl: Duration::from_secs(86_400),
            upstream_timeout: Duration::from_secs(30),
            homepage_url: DEFAULT_HOMEPAGE.to_owned(),
        }
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { key, value }),
    }
}

/// `/` redirects here, so the value must be an absolute URL.
fn parse_homepage(value: String) -> Result<String, ConfigError> {
    match Url::parse(&value) {
        Ok(url) if url.has_host() => Ok(url.into()),
        _ => Err(ConfigError::Invalid { key: "HOMEPAGE_URL", value }),
    }
}

fn parse_origin_list(csv: &str) -> Vec<String> {
    csv.split(',')
        .map(str::trim)
        .filter(|domain| !domain.is_empty())
        .map(str::to_owned)
        .collect()
}
