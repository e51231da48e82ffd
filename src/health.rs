//! Health-check handlers.
//!
//! | Probe | Path | Question |
//! |---|---|---|
//! | **Liveness** | `/healthz` | Is the process alive? |
//! | **Readiness** | `/readyz` | Can it take traffic? |
//!
//! Both answer locally and never touch the upstream hosts: an upstream
//! outage must not get the proxy restarted or pulled out of rotation, since
//! cached entries keep being served.

use crate::{Request, Response};

/// Always `200 OK` with body `"ok"`.
pub async fn liveness(_req: Request) -> Response {
    Response::text("ok")
}

/// `200 OK` with body `"ready"` once the router is serving.
pub async fn readiness(_req: Request) -> Response {
    Response::text("ready")
}
