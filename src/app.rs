//! Route table.

use std::sync::Arc;

use crate::health;
use crate::proxy::Proxy;
use crate::purge::PURGE_PATH;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// Wires the reserved routes and hands every other path to the proxy.
///
/// | Path | Handler |
/// |---|---|
/// | `/` | 302 to the project page |
/// | `/purge-cache` | cache purge |
/// | `GET /healthz`, `GET /readyz` | probes |
/// | anything else | gate → cache → upstream |
pub fn app(proxy: Arc<Proxy>) -> Router {
    let homepage = proxy.config().homepage_url.clone();
    let purger = Arc::clone(&proxy);

    Router::new()
        .get("/healthz", health::liveness)
        .get("/readyz", health::readiness)
        .any("/", move |_req: Request| {
            let homepage = homepage.clone();
            async move { Response::redirect(&homepage) }
        })
        .any(PURGE_PATH, move |req: Request| {
            let proxy = Arc::clone(&purger);
            async move { proxy.purge(req).await }
        })
        .fallback(move |req: Request| {
            let proxy = Arc::clone(&proxy);
            async move { proxy.handle(req).await }
        })
}
