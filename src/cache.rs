//! Response cache: the substrate interface and the bundled in-memory store.
//!
//! The proxy only ever talks to [`ResponseCache`]. Keys come from exactly one
//! place, [`CacheKey::for_request`], so the key used to fill an entry is the
//! key used to find it.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, StatusCode};
use moka::future::Cache;
use thiserror::Error;
use url::Url;

use crate::config::Config;
use crate::request::Request;
use crate::response::Response;

/// Absolute URL identifying a cached response.
///
/// Normalised through [`Url`] so that keys built from a request and keys
/// named in a purge request compare equal (`HTTP://Host:80/x` and
/// `http://host/x` are the same entry).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn for_request(req: &Request) -> Self {
        Self::from_url(&req.url())
    }

    pub fn from_url(url: &str) -> Self {
        match Url::parse(url) {
            Ok(parsed) => Self(parsed.into()),
            Err(_) => Self(url.to_owned()),
        }
    }

    /// Resolves `target` against `origin`; absolute targets win.
    pub fn resolve(origin: &str, target: &str) -> Self {
        match Url::parse(origin).and_then(|base| base.join(target)) {
            Ok(joined) => Self(joined.into()),
            Err(_) => Self::from_url(target),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A stored `(status, headers, body)` triple.
#[derive(Clone, Debug)]
pub struct CachedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl From<&Response> for CachedResponse {
    fn from(res: &Response) -> Self {
        Self {
            status: res.status,
            headers: res.headers.clone(),
            body: res.body.clone(),
        }
    }
}

impl From<CachedResponse> for Response {
    fn from(cached: CachedResponse) -> Self {
        Response::from_parts(cached.status, cached.headers, cached.body)
    }
}

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend failure: {0}")]
    Backend(String),
}

/// The key-value response store the proxy reads and fills.
///
/// Keying, eviction and durability belong to the implementation.
#[async_trait]
pub trait ResponseCache: Send + Sync {
    async fn lookup(&self, key: &CacheKey) -> Result<Option<CachedResponse>, CacheError>;

    async fn store(&self, key: CacheKey, response: CachedResponse) -> Result<(), CacheError>;

    /// Removes one entry. `Ok(true)` if something was there.
    async fn delete(&self, key: &CacheKey) -> Result<bool, CacheError>;
}

/// Bounded, TTL-expiring in-process cache backed by moka.
pub struct MemoryCache {
    entries: Cache<CacheKey, CachedResponse>,
}

impl MemoryCache {
    pub fn new(max_entries: u64, ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_entries)
                .time_to_live(ttl)
                .build(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.cache_capacity, config.cache_ttl)
    }
}

#[async_trait]
impl ResponseCache for MemoryCache {
    async fn lookup(&self, key: &CacheKey) -> Result<Option<CachedResponse>, CacheError> {
        Ok(self.entries.get(key).await)
    }

    async fn store(&self, key: CacheKey, response: CachedResponse) -> Result<(), CacheError> {
        self.entries.insert(key, response).await;
        Ok(())
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool, CacheError> {
        Ok(self.entries.remove(key).await.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cached(body: &'static str) -> CachedResponse {
        CachedResponse { status: StatusCode::OK, headers: HeaderMap::new(), body: Bytes::from(body) }
    }

    #[test]
    fn request_key_matches_purge_key() {
        let req = Request::new(
            http::Request::builder()
                .uri("/css2?family=Roboto")
                .header("host", "Fonts.Example.com:80")
                .body(Bytes::new())
                .unwrap(),
        );
        let from_request = CacheKey::for_request(&req);
        let from_purge = CacheKey::resolve("http://fonts.example.com", "/css2?family=Roboto");
        assert_eq!(from_request, from_purge);
        assert_eq!(from_request.as_str(), "http://fonts.example.com/css2?family=Roboto");
    }

    #[test]
    fn absolute_purge_target_ignores_origin() {
        let key = CacheKey::resolve("http://proxy.local", "https://other.example/s/a.woff2");
        assert_eq!(key.as_str(), "https://other.example/s/a.woff2");
    }

    #[tokio::test]
    async fn memory_cache_round_trip_and_delete() {
        let cache = MemoryCache::new(16, Duration::from_secs(60));
        let key = CacheKey::from_url("http://proxy.local/s/a.woff2");

        assert!(cache.lookup(&key).await.unwrap().is_none());
        cache.store(key.clone(), cached("font")).await.unwrap();

        let hit = cache.lookup(&key).await.unwrap().expect("stored entry");
        assert_eq!(hit.body, Bytes::from("font"));

        assert!(cache.delete(&key).await.unwrap());
        assert!(!cache.delete(&key).await.unwrap());
        assert!(cache.lookup(&key).await.unwrap().is_none());
    }
}
