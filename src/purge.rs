//! Administrative cache eviction.
//!
//! `GET /purge-cache?key=<secret>&url=<target>` evicts one entry;
//! without `url` it evicts the well-known stylesheet and font entries of this
//! proxy's own origin. Deletions run concurrently and all of them finish
//! before the response goes out.

use std::sync::Arc;

use http::StatusCode;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::cache::{CacheKey, ResponseCache};
use crate::config::Config;
use crate::request::Request;
use crate::response::Response;

pub const PURGE_PATH: &str = "/purge-cache";

/// Entries evicted when no `url` is given, relative to the request origin.
pub const WELL_KNOWN_PATHS: [&str; 3] = ["/css", "/css2", "/s/"];

pub async fn purge(config: &Config, cache: &Arc<dyn ResponseCache>, req: &Request) -> Response {
    if let Some(required) = &config.purge_key {
        if req.query_param("key").as_deref() != Some(required.as_str()) {
            warn!("purge rejected: bad or missing key");
            return Response::builder()
                .status(StatusCode::UNAUTHORIZED)
                .text("Unauthorized");
        }
    }

    let origin = req.origin();

    if let Some(target) = req.query_param("url").filter(|url| !url.is_empty()) {
        let key = CacheKey::resolve(&origin, &target);
        match cache.delete(&key).await {
            Ok(existed) => info!(%key, existed, "purged cache entry"),
            Err(e) => warn!(%key, error = %e, "cache delete failed"),
        }
        return Response::text(format!("Cache cleared for: {target}"));
    }

    let mut deletions = JoinSet::new();
    for path in WELL_KNOWN_PATHS {
        let key = CacheKey::resolve(&origin, path);
        let cache = Arc::clone(cache);
        deletions.spawn(async move {
            if let Err(e) = cache.delete(&key).await {
                warn!(%key, error = %e, "cache delete failed");
            }
        });
    }
    while let Some(joined) = deletions.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "cache delete task failed");
        }
    }

    info!(%origin, entries = WELL_KNOWN_PATHS.len(), "purged common cache entries");
    Response::text("Common cache entries cleared")
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use bytes::Bytes;
    use http::HeaderMap;

    use super::*;
    use crate::cache::{CachedResponse, MemoryCache};

    fn request(uri: &str) -> Request {
        Request::new(
            http::Request::builder()
                .uri(uri)
                .header("host", "proxy.local")
                .body(Bytes::new())
                .unwrap(),
        )
    }

    async fn seeded(urls: &[&str]) -> Arc<dyn ResponseCache> {
        let cache = MemoryCache::new(64, Duration::from_secs(60));
        for url in urls {
            let entry = CachedResponse {
                status: StatusCode::OK,
                headers: HeaderMap::new(),
                body: Bytes::from_static(b"x"),
            };
            cache.store(CacheKey::from_url(url), entry).await.unwrap();
        }
        Arc::new(cache)
    }

    async fn present(cache: &Arc<dyn ResponseCache>, url: &str) -> bool {
        cache.lookup(&CacheKey::from_url(url)).await.unwrap().is_some()
    }

    fn secured(key: &str) -> Config {
        Config { purge_key: Some(key.into()), ..Config::default() }
    }

    #[tokio::test]
    async fn wrong_or_missing_key_is_unauthorized_and_deletes_nothing() {
        let cache = seeded(&["http://proxy.local/css"]).await;

        for uri in ["/purge-cache?key=wrong", "/purge-cache", "/purge-cache?url=/css"] {
            let res = purge(&secured("S"), &cache, &request(uri)).await;
            assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED, "{uri}");
        }
        assert!(present(&cache, "http://proxy.local/css").await);
    }

    #[tokio::test]
    async fn url_param_deletes_only_that_entry() {
        let cache = seeded(&["http://proxy.local/css2?family=Roboto", "http://proxy.local/css"]).await;

        let res = purge(
            &secured("S"),
            &cache,
            &request("/purge-cache?key=S&url=%2Fcss2%3Ffamily%3DRoboto"),
        )
        .await;

        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body().as_ref(), b"Cache cleared for: /css2?family=Roboto");
        assert!(!present(&cache, "http://proxy.local/css2?family=Roboto").await);
        assert!(present(&cache, "http://proxy.local/css").await);
    }

    #[tokio::test]
    async fn without_url_the_well_known_entries_go() {
        let cache = seeded(&[
            "http://proxy.local/css",
            "http://proxy.local/css2",
            "http://proxy.local/s/",
            "http://proxy.local/s/roboto/a.woff2",
        ])
        .await;

        let res = purge(&Config::default(), &cache, &request("/purge-cache")).await;

        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(res.body().as_ref(), b"Common cache entries cleared");
        for gone in ["http://proxy.local/css", "http://proxy.local/css2", "http://proxy.local/s/"] {
            assert!(!present(&cache, gone).await, "{gone}");
        }
        assert!(present(&cache, "http://proxy.local/s/roboto/a.woff2").await);
    }

    #[tokio::test]
    async fn empty_url_param_falls_back_to_well_known_entries() {
        let cache = seeded(&["http://proxy.local/", "http://proxy.local/css2"]).await;

        let res = purge(&Config::default(), &cache, &request("/purge-cache?url=")).await;

        assert_eq!(res.body().as_ref(), b"Common cache entries cleared");
        assert!(present(&cache, "http://proxy.local/").await);
        assert!(!present(&cache, "http://proxy.local/css2").await);
    }
}
