//! HTTP server and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. Stops accepting new connections.
//! 2. Lets every in-flight connection finish.
//! 3. Waits (bounded) for background cache stores still pending.
//! 4. Returns from [`Server::serve`].

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{Instrument, error, info, info_span, warn};

use crate::background::Background;
use crate::error::Error;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

const BACKGROUND_GRACE: Duration = Duration::from_secs(30);

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
    background: Option<Background>,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    pub fn bind(addr: SocketAddr) -> Self {
        Self { addr, background: None }
    }

    /// Background tracker to drain after the last connection closes.
    pub fn background(mut self, background: Background) -> Self {
        self.background = Some(background);
        self
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Returns only after a full graceful shutdown.
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;
        let router = Arc::new(router);

        info!(addr = %self.addr, "fontgate listening");

        let mut tasks = JoinSet::new();

        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // Shutdown first, so a SIGTERM stops accepting even while
                // connections are still queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            async move { dispatch(router, req, remote_addr).await }
                        });

                        // HTTP/1.1 or HTTP/2, whichever the client speaks.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        while tasks.join_next().await.is_some() {}

        if let Some(background) = &self.background {
            background.shutdown(BACKGROUND_GRACE).await;
        }

        info!("fontgate stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Collects the body, routes the request, and converts the response.
///
/// Never returns `Err`: every failure becomes an HTTP response.
async fn dispatch(
    router: Arc<Router>,
    req: hyper::Request<hyper::body::Incoming>,
    remote_addr: SocketAddr,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let span = info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        peer = %remote_addr,
    );

    async move {
        let (parts, body) = req.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!("failed to read request body: {e}");
                return Ok(Response::status(http::StatusCode::BAD_REQUEST).into_inner());
            }
        };

        let req = Request::new(http::Request::from_parts(parts, body));
        let res = router.call(req).await;
        info!(status = res.status_code().as_u16(), "request handled");
        Ok::<_, Infallible>(res.into_inner())
    }
    .instrument(span)
    .await
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on SIGTERM (Unix) or Ctrl-C.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}
