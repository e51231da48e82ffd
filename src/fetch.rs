//! Outbound requests to the upstream font hosts.

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, HeaderName, Method, StatusCode, header};
use reqwest::redirect::Policy;
use thiserror::Error;
use tracing::debug;

use crate::config::Config;
use crate::error::Error;
use crate::request::Request;
use crate::upstream::Upstream;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

const MAX_REDIRECTS: usize = 10;

/// Connection-scoped headers that never cross a proxy hop (RFC 9110 §7.6.1).
pub(crate) fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

/// Headers dropped on the way up: the HTTP client owns the target host,
/// body framing and compression negotiation.
fn forwardable(name: &HeaderName) -> bool {
    !is_hop_by_hop(name)
        && *name != header::HOST
        && *name != header::CONTENT_LENGTH
        && *name != header::ACCEPT_ENCODING
}

/// The proxied request: inbound method and headers, upstream URL.
#[derive(Clone, Debug)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
}

impl UpstreamRequest {
    pub fn for_request(req: &Request, upstream: Upstream) -> Self {
        let headers = req
            .headers()
            .iter()
            .filter(|(name, _)| forwardable(name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();

        Self {
            method: req.method().clone(),
            url: upstream.url(req.path_and_query()),
            headers,
        }
    }
}

#[derive(Clone, Debug)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// Failure to get any response out of the upstream.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Client(#[from] reqwest::Error),

    #[error("{0}")]
    Transport(String),
}

#[async_trait]
pub trait Fetch: Send + Sync {
    /// One attempt, redirects followed. Non-success statuses are `Ok`.
    async fn fetch(&self, req: UpstreamRequest) -> Result<UpstreamResponse, FetchError>;
}

/// [`Fetch`] over a shared `reqwest` connection pool.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(config.upstream_timeout)
            .redirect(Policy::limited(MAX_REDIRECTS))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn fetch(&self, req: UpstreamRequest) -> Result<UpstreamResponse, FetchError> {
        debug!(method = %req.method, url = %req.url, "fetching upstream");

        let res = self
            .client
            .request(req.method, &req.url)
            .headers(req.headers)
            .send()
            .await?;

        let status = res.status();
        let headers = res.headers().clone();
        let body = res.bytes().await?;

        debug!(%status, bytes = body.len(), "upstream responded");
        Ok(UpstreamResponse { status, headers, body })
    }
}
