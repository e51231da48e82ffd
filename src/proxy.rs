//! The proxy pipeline: gate, cache lookup, upstream fetch, transform, store.

use std::sync::Arc;

use http::{Method, StatusCode};
use tracing::{debug, error, info, warn};

use crate::background::Background;
use crate::cache::{CacheKey, CachedResponse, ResponseCache};
use crate::config::Config;
use crate::fetch::{Fetch, UpstreamRequest};
use crate::gate::{self, Verdict};
use crate::purge;
use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::transform::{allow_any_origin, transform};
use crate::upstream::Upstream;

/// Shared state behind every proxied request.
///
/// Holds no per-request state: concurrent requests share the config, the
/// cache, the HTTP client and the background tracker, nothing else.
pub struct Proxy {
    config: Arc<Config>,
    cache: Arc<dyn ResponseCache>,
    fetcher: Arc<dyn Fetch>,
    background: Background,
}

impl Proxy {
    pub fn new(
        config: Arc<Config>,
        cache: Arc<dyn ResponseCache>,
        fetcher: Arc<dyn Fetch>,
        background: Background,
    ) -> Self {
        Self { config, cache, fetcher, background }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Entry point for every non-reserved path.
    pub async fn handle(&self, req: Request) -> Response {
        if let Verdict::Deny(denial) = gate::check(&self.config.allowed_origins, &req) {
            return denial.into_response();
        }
        self.forward(&req).await
    }

    /// Entry point for the purge path. Not subject to the gate.
    pub async fn purge(&self, req: Request) -> Response {
        purge::purge(&self.config, &self.cache, &req).await
    }

    async fn forward(&self, req: &Request) -> Response {
        let upstream = Upstream::for_path(req.path());
        let cacheable = *req.method() == Method::GET;
        let key = CacheKey::for_request(req);

        if cacheable {
            match self.cache.lookup(&key).await {
                Ok(Some(cached)) => {
                    debug!(%key, "cache hit");
                    let mut res = Response::from(cached);
                    allow_any_origin(&mut res);
                    return res;
                }
                Ok(None) => debug!(%key, "cache miss"),
                Err(e) => warn!(%key, error = %e, "cache lookup failed, treating as miss"),
            }
        }

        let upstream_req = UpstreamRequest::for_request(req, upstream);
        let url = upstream_req.url.clone();

        let res = match self.fetcher.fetch(upstream_req).await {
            Ok(res) => res,
            Err(e) => {
                error!(%url, error = %e, "upstream fetch failed");
                return Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .text(format!("Proxy error: {e}"));
            }
        };

        if !res.status.is_success() {
            info!(%url, status = res.status.as_u16(), "upstream returned an error status");
            return Response::builder()
                .status(res.status)
                .text(format!("Proxy failed: upstream returned {}", res.status.as_u16()));
        }

        let proxy_base = self.config.proxy_base(&req.origin());
        let out = transform(upstream, res, &proxy_base, &self.config.cache_control());

        // only complete bodies are cached; a 206 answers one client's Range
        if cacheable && out.status_code() == StatusCode::OK {
            self.store(key, CachedResponse::from(&out));
        }

        debug!(%url, "fetched upstream response");
        out
    }

    /// Fills the cache without holding up the response.
    fn store(&self, key: CacheKey, entry: CachedResponse) {
        let cache = Arc::clone(&self.cache);
        self.background.spawn(async move {
            match cache.store(key.clone(), entry).await {
                Ok(()) => debug!(%key, "cached response"),
                Err(e) => warn!(%key, error = %e, "cache store failed"),
            }
        });
    }
}
