//! Test doubles and request helpers shared by the integration suites.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use fontgate::{
    Background, CacheError, CacheKey, CachedResponse, Config, Fetch, FetchError, MemoryCache,
    Proxy, Request, ResponseCache, Router, UpstreamRequest, UpstreamResponse, app,
};
use http::{HeaderMap, HeaderValue, Method, StatusCode, header};

pub const PROXY_HOST: &str = "fonts.example.com";

pub const ROBOTO_CSS: &str = "\
@font-face {
  font-family: 'Roboto';
  font-style: normal;
  font-weight: 400;
  src: url(https://fonts.gstatic.com/s/roboto/v30/KFOmCnqEu92Fr1Mu4mxK.woff2) format('woff2');
}
";

// ── Fetch double ─────────────────────────────────────────────────────────────

/// Canned upstream keyed by URL. Unknown URLs answer 404.
#[derive(Default)]
pub struct StubUpstream {
    responses: Mutex<HashMap<String, UpstreamResponse>>,
    partials: Mutex<HashMap<String, UpstreamResponse>>,
    failure: Option<String>,
    calls: AtomicUsize,
    seen: Mutex<Vec<UpstreamRequest>>,
}

impl StubUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every fetch fails at the transport layer with `message`.
    pub fn unreachable(message: &str) -> Self {
        Self { failure: Some(message.to_owned()), ..Self::default() }
    }

    pub fn respond(self, url: &str, content_type: &str, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_str(content_type).unwrap());
        headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("private, max-age=86400"));
        self.responses.lock().unwrap().insert(
            url.to_owned(),
            UpstreamResponse { status: StatusCode::OK, headers, body: body.into() },
        );
        self
    }

    /// Answers `206 Partial Content` with `body` to requests carrying `Range`.
    pub fn respond_partial(self, url: &str, body: impl Into<Bytes>) -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_RANGE, HeaderValue::from_static("bytes 0-1/*"));
        self.partials.lock().unwrap().insert(
            url.to_owned(),
            UpstreamResponse { status: StatusCode::PARTIAL_CONTENT, headers, body: body.into() },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<UpstreamRequest> {
        self.seen.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Fetch for StubUpstream {
    async fn fetch(&self, req: UpstreamRequest) -> Result<UpstreamResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(req.clone());

        if let Some(message) = &self.failure {
            return Err(FetchError::Transport(message.clone()));
        }

        let found = if req.headers.contains_key(header::RANGE) {
            self.partials.lock().unwrap().get(&req.url).cloned()
        } else {
            self.responses.lock().unwrap().get(&req.url).cloned()
        };
        Ok(found.unwrap_or_else(|| UpstreamResponse {
            status: StatusCode::NOT_FOUND,
            headers: HeaderMap::new(),
            body: Bytes::from_static(b"Not Found"),
        }))
    }
}

// ── Cache doubles ────────────────────────────────────────────────────────────

/// Deletes acknowledge only after `delay`; counts acknowledged deletions.
pub struct SlowDeleteCache {
    inner: MemoryCache,
    delay: Duration,
    acknowledged: AtomicUsize,
}

impl SlowDeleteCache {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryCache::new(64, Duration::from_secs(60)),
            delay,
            acknowledged: AtomicUsize::new(0),
        }
    }

    pub fn acknowledged(&self) -> usize {
        self.acknowledged.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResponseCache for SlowDeleteCache {
    async fn lookup(&self, key: &CacheKey) -> Result<Option<CachedResponse>, CacheError> {
        self.inner.lookup(key).await
    }

    async fn store(&self, key: CacheKey, response: CachedResponse) -> Result<(), CacheError> {
        self.inner.store(key, response).await
    }

    async fn delete(&self, key: &CacheKey) -> Result<bool, CacheError> {
        tokio::time::sleep(self.delay).await;
        let existed = self.inner.delete(key).await?;
        self.acknowledged.fetch_add(1, Ordering::SeqCst);
        Ok(existed)
    }
}

/// A backend that is down for every operation.
pub struct BrokenCache;

#[async_trait]
impl ResponseCache for BrokenCache {
    async fn lookup(&self, _key: &CacheKey) -> Result<Option<CachedResponse>, CacheError> {
        Err(CacheError::Backend("connection refused".into()))
    }

    async fn store(&self, _key: CacheKey, _response: CachedResponse) -> Result<(), CacheError> {
        Err(CacheError::Backend("connection refused".into()))
    }

    async fn delete(&self, _key: &CacheKey) -> Result<bool, CacheError> {
        Err(CacheError::Backend("connection refused".into()))
    }
}

// ── Assembly ─────────────────────────────────────────────────────────────────

pub struct TestApp {
    pub router: Router,
    pub upstream: Arc<StubUpstream>,
    pub background: Background,
}

impl TestApp {
    pub fn new(config: Config, cache: Arc<dyn ResponseCache>, upstream: StubUpstream) -> Self {
        let upstream = Arc::new(upstream);
        let background = Background::new();
        let proxy = Proxy::new(
            Arc::new(config),
            cache,
            Arc::clone(&upstream) as Arc<dyn Fetch>,
            background.clone(),
        );
        Self { router: app(Arc::new(proxy)), upstream, background }
    }

    pub async fn send(&self, req: Request) -> fontgate::Response {
        self.router.call(req).await
    }

    /// Waits for background cache stores to land.
    pub async fn settle(&self) {
        self.background.drain().await;
    }
}

pub fn memory_cache() -> Arc<MemoryCache> {
    Arc::new(MemoryCache::new(64, Duration::from_secs(60)))
}

pub fn request(method: Method, uri: &str, headers: &[(&str, &str)]) -> Request {
    let mut builder = http::Request::builder()
        .method(method)
        .uri(uri)
        .header(header::HOST, PROXY_HOST);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    Request::new(builder.body(Bytes::new()).unwrap())
}

pub fn get(uri: &str) -> Request {
    request(Method::GET, uri, &[])
}

pub fn key(path_and_query: &str) -> CacheKey {
    CacheKey::from_url(&format!("http://{PROXY_HOST}{path_and_query}"))
}
