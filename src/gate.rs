//! Origin allow-list.
//!
//! Keeps other sites from hot-linking through the proxy. Browsers send
//! `Origin` on cross-origin font and CORS requests and `Referer` on most
//! others; requests carrying neither are treated as direct access.

use http::{StatusCode, header};
use tracing::{debug, info};
use url::Url;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

#[derive(Debug, PartialEq, Eq)]
pub enum Verdict {
    Admit,
    Deny(Denial),
}

#[derive(Debug, PartialEq, Eq)]
pub enum Denial {
    /// Neither `Origin` nor a parseable `Referer`.
    NoOrigin,
    /// An origin outside the allow-list.
    NotAllowed(String),
}

impl IntoResponse for Denial {
    fn into_response(self) -> Response {
        let body = match self {
            Self::NoOrigin => "Access denied: Direct access not allowed",
            Self::NotAllowed(_) => "Access denied",
        };
        Response::builder()
            .status(StatusCode::FORBIDDEN)
            .text(body)
    }
}

/// Decides whether `req` may use the proxy. An empty allow-list admits all.
pub fn check(allowed: &[String], req: &Request) -> Verdict {
    if allowed.is_empty() {
        return Verdict::Admit;
    }

    let Some(origin) = request_origin(req) else {
        info!("access denied: no origin or referer");
        return Verdict::Deny(Denial::NoOrigin);
    };

    if allowed.iter().any(|domain| is_allowed(&origin, domain)) {
        debug!(%origin, "origin admitted");
        Verdict::Admit
    } else {
        info!(%origin, "access denied for origin");
        Verdict::Deny(Denial::NotAllowed(origin))
    }
}

/// `Origin` as sent, else the origin of the `Referer` URL.
fn request_origin(req: &Request) -> Option<String> {
    if let Some(origin) = req.header(header::ORIGIN) {
        return Some(origin.to_owned());
    }
    let referer = Url::parse(req.header(header::REFERER)?).ok()?;
    referer.has_host().then(|| referer.origin().ascii_serialization())
}

/// Exact `https://domain` / `http://domain`, or a subdomain of `domain`.
fn is_allowed(origin: &str, domain: &str) -> bool {
    if origin == format!("https://{domain}") || origin == format!("http://{domain}") {
        return true;
    }
    let host = Url::parse(origin)
        .ok()
        .and_then(|url| url.host_str().map(str::to_owned))
        .unwrap_or_else(|| origin.to_owned());
    host.ends_with(&format!(".{domain}"))
}
