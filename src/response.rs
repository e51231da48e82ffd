//! Outgoing HTTP response type and the [`IntoResponse`] conversion trait.
//!
//! Bodies are fully buffered [`Bytes`]: the proxy needs the whole payload
//! anyway, once to rewrite CSS and once to keep a copy for the cache.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode, header};
use http_body_util::Full;

// ── ContentType ───────────────────────────────────────────────────────────────

/// Content-type values this service produces itself.
pub enum ContentType {
    Css,   // text/css
    Text,  // text/plain; charset=utf-8
}

impl ContentType {
    pub(crate) fn header_value(&self) -> HeaderValue {
        HeaderValue::from_static(match self {
            Self::Css  => "text/css",
            Self::Text => "text/plain; charset=utf-8",
        })
    }
}

// ── Response ─────────────────────────────────────────────────────────────────

/// An outgoing HTTP response.
///
/// ```rust
/// use fontgate::Response;
/// use http::{StatusCode, header};
///
/// Response::text("ok");
/// Response::status(StatusCode::NO_CONTENT);
/// Response::builder()
///     .status(StatusCode::FORBIDDEN)
///     .header(header::CACHE_CONTROL, "no-store")
///     .text("Access denied");
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Bytes,
}

impl Response {
    /// `200 OK` — `text/plain; charset=utf-8`.
    pub fn text(body: impl Into<String>) -> Self {
        Self::builder().text(body)
    }

    /// Response with no body.
    pub fn status(code: StatusCode) -> Self {
        Self { status: code, headers: HeaderMap::new(), body: Bytes::new() }
    }

    /// `302 Found` pointing at `location`.
    pub fn redirect(location: &str) -> Self {
        let mut res = Self::status(StatusCode::FOUND);
        if let Ok(value) = HeaderValue::from_str(location) {
            res.headers.insert(header::LOCATION, value);
        }
        res
    }

    /// Assembles a response from already-separated parts.
    pub fn from_parts(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self { status, headers, body: body.into() }
    }

    /// Builder for responses that need a custom status or extra headers.
    pub fn builder() -> ResponseBuilder {
        ResponseBuilder { headers: HeaderMap::new(), status: StatusCode::OK }
    }

    pub fn status_code(&self) -> StatusCode { self.status }
    pub fn headers(&self) -> &HeaderMap { &self.headers }
    pub fn body(&self) -> &Bytes { &self.body }

    pub fn header(&self, name: impl header::AsHeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Replaces every existing value of `name` with `value`.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    pub(crate) fn into_inner(self) -> http::Response<Full<Bytes>> {
        let mut res = http::Response::new(Full::new(self.body));
        *res.status_mut() = self.status;
        *res.headers_mut() = self.headers;
        res
    }
}

// ── ResponseBuilder ───────────────────────────────────────────────────────────

/// Fluent builder for [`Response`].
///
/// Obtain via [`Response::builder()`]. Defaults to `200 OK`.
/// Terminated by a typed body method.
pub struct ResponseBuilder {
    headers: HeaderMap,
    status: StatusCode,
}

impl ResponseBuilder {
    pub fn status(mut self, code: StatusCode) -> Self {
        self.status = code;
        self
    }

    /// Adds a header. Values that are not valid header text are skipped.
    pub fn header(mut self, name: HeaderName, value: &str) -> Self {
        if let Ok(value) = HeaderValue::from_str(value) {
            self.headers.append(name, value);
        }
        self
    }

    /// Terminate with a plain-text body (`text/plain; charset=utf-8`).
    pub fn text(self, body: impl Into<String>) -> Response {
        self.finish(ContentType::Text, Bytes::from(body.into()))
    }

    fn finish(mut self, content_type: ContentType, body: Bytes) -> Response {
        self.headers.insert(header::CONTENT_TYPE, content_type.header_value());
        Response { status: self.status, headers: self.headers, body }
    }
}

// ── IntoResponse ──────────────────────────────────────────────────────────────

/// Conversion into an HTTP [`Response`].
pub trait IntoResponse {
    fn into_response(self) -> Response;
}

impl IntoResponse for Response {
    fn into_response(self) -> Response { self }
}

impl IntoResponse for &'static str {
    fn into_response(self) -> Response { Response::text(self) }
}

impl IntoResponse for String {
    fn into_response(self) -> Response { Response::text(self) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_content_type_and_status() {
        let res = Response::builder()
            .status(StatusCode::UNAUTHORIZED)
            .text("Unauthorized");
        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.header(header::CONTENT_TYPE), Some("text/plain; charset=utf-8"));
        assert_eq!(res.body().as_ref(), b"Unauthorized");
    }

    #[test]
    fn redirect_sets_location() {
        let res = Response::redirect("https://example.com/about");
        assert_eq!(res.status_code(), StatusCode::FOUND);
        assert_eq!(res.header(header::LOCATION), Some("https://example.com/about"));
        assert!(res.body().is_empty());
    }

    #[test]
    fn set_header_overrides_existing_values() {
        let mut headers = HeaderMap::new();
        headers.append(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
        headers.append(header::CACHE_CONTROL, HeaderValue::from_static("private"));
        let mut res = Response::from_parts(StatusCode::OK, headers, "x");

        res.set_header(header::CACHE_CONTROL, HeaderValue::from_static("public, max-age=1"));
        let values: Vec<&str> = res
            .headers()
            .get_all(header::CACHE_CONTROL)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect();
        assert_eq!(values, ["public, max-age=1"]);
    }

    #[test]
    fn into_inner_preserves_parts() {
        let res = Response::builder()
            .status(StatusCode::NOT_FOUND)
            .header(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")
            .text("missing")
            .into_inner();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }
}
