//! Turns a successful upstream response into the client-facing one.

use http::{HeaderMap, HeaderValue, header};
use tracing::{debug, warn};

use crate::fetch::{UpstreamResponse, is_hop_by_hop};
use crate::response::{ContentType, Response};
use crate::rewrite::CssRewriter;
use crate::upstream::Upstream;

/// Upstream headers that describe the wire encoding, not the content.
/// The body has already been decoded and the server re-frames it.
fn copyable(name: &header::HeaderName) -> bool {
    !is_hop_by_hop(name)
        && *name != header::CONTENT_LENGTH
        && *name != header::CONTENT_ENCODING
}

/// Builds the client response.
///
/// CSS bodies are rewritten to point at `proxy_base`; when the body is not
/// valid UTF-8 the original bytes go through unchanged. Asset bodies always
/// pass through with their upstream `Content-Type`.
pub fn transform(
    upstream: Upstream,
    res: UpstreamResponse,
    proxy_base: &str,
    cache_control: &str,
) -> Response {
    let headers: HeaderMap = res
        .headers
        .iter()
        .filter(|(name, _)| copyable(name))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();

    let mut out = match upstream {
        Upstream::Css => match CssRewriter::new(proxy_base).rewrite_bytes(&res.body) {
            Ok(css) => {
                debug!(proxy_base, bytes = css.len(), "rewrote stylesheet");
                let mut out = Response::from_parts(res.status, headers, css);
                out.set_header(header::CONTENT_TYPE, ContentType::Css.header_value());
                out
            }
            Err(e) => {
                warn!(error = %e, "stylesheet is not valid UTF-8, passing it through");
                Response::from_parts(res.status, headers, res.body)
            }
        },
        Upstream::Assets => Response::from_parts(res.status, headers, res.body),
    };

    if let Ok(value) = HeaderValue::from_str(cache_control) {
        out.set_header(header::CACHE_CONTROL, value);
    }
    allow_any_origin(&mut out);
    out
}

/// Forces `Access-Control-Allow-Origin: *`.
pub fn allow_any_origin(res: &mut Response) {
    res.set_header(header::ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
}
