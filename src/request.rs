//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use http::{HeaderMap, Method, Uri, header};

/// An incoming HTTP request.
///
/// Only the request head is kept: nothing the proxy serves reads a body.
///
/// Immutable once built: handlers read from it, and the proxy derives the
/// upstream request and the cache key from it without modifying it.
#[derive(Debug)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    params: HashMap<String, String>,
}

impl Request {
    pub fn new(req: http::Request<Bytes>) -> Self {
        let (parts, _body) = req.into_parts();
        Self {
            method: parts.method,
            uri: parts.uri,
            headers: parts.headers,
            params: HashMap::new(),
        }
    }

    pub(crate) fn with_params(mut self, params: HashMap<String, String>) -> Self {
        self.params = params;
        self
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn path(&self) -> &str { self.uri.path() }
    pub fn query(&self) -> Option<&str> { self.uri.query() }
    pub fn headers(&self) -> &HeaderMap { &self.headers }

    /// Header value as text. Values that are not visible ASCII read as absent.
    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/files/{*rest}`, `req.param("rest")` on `/files/a/b`
    /// returns `Some("a/b")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// First value of a query-string parameter, percent-decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let query = self.query()?;
        url::form_urlencoded::parse(query.as_bytes())
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    /// The host the client addressed: `Host` header, else the URI authority.
    pub fn host(&self) -> Option<&str> {
        self.header(header::HOST)
            .or_else(|| self.uri.authority().map(|a| a.as_str()))
    }

    /// `scheme://host` as the client saw it.
    ///
    /// The scheme comes from `X-Forwarded-Proto` when a TLS-terminating
    /// proxy sits in front, otherwise from the URI, otherwise `http`.
    pub fn origin(&self) -> String {
        let scheme = self
            .header("x-forwarded-proto")
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .or_else(|| self.uri.scheme_str())
            .unwrap_or("http");
        let host = self.host().unwrap_or("localhost");
        format!("{scheme}://{host}")
    }

    /// Path plus query string, exactly as received.
    pub fn path_and_query(&self) -> &str {
        self.uri.path_and_query().map_or("/", |pq| pq.as_str())
    }

    /// The absolute URL of this request.
    pub fn url(&self) -> String {
        format!("{}{}", self.origin(), self.path_and_query())
    }
}
