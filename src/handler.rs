//! Handler trait and type erasure.
//!
//! Routes hold handlers of different concrete types in one radix tree, so
//! each handler is boxed behind [`ErasedHandler`]:
//!
//! ```text
//! move |req| { let proxy = proxy.clone(); async move { proxy.handle(req).await } }
//!        ↓ router.fallback(…)
//! Arc::new(FnHandler(closure))          stored as BoxedHandler
//!        ↓ at request time
//! Box::pin(async { fut.await.into_response() })
//! ```
//!
//! Per request that is one `Arc` clone and one virtual call.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::request::Request;
use crate::response::{IntoResponse, Response};

/// A boxed future resolving to a [`Response`]; `Send + 'static` so tokio can
/// move it across worker threads.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = Response> + Send + 'static>>;

#[doc(hidden)]
pub trait ErasedHandler {
    fn call(&self, req: Request) -> BoxFuture;
}

#[doc(hidden)]
pub type BoxedHandler = Arc<dyn ErasedHandler + Send + Sync + 'static>;

/// Implemented for every valid route handler.
///
/// Satisfied automatically by any `Fn(Request) -> impl Future<Output = impl IntoResponse>`,
/// which covers both `async fn` items and closures capturing shared state.
/// Sealed: only the blanket impl can provide it.
pub trait Handler: private::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn into_boxed_handler(self) -> BoxedHandler;
}

mod private {
    pub trait Sealed {}
}

impl<F, Fut, R> private::Sealed for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
}

impl<F, Fut, R> Handler for F
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn into_boxed_handler(self) -> BoxedHandler {
        Arc::new(FnHandler(self))
    }
}

struct FnHandler<F>(F);

impl<F, Fut, R> ErasedHandler for FnHandler<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send + 'static,
    R: IntoResponse + Send + 'static,
{
    fn call(&self, req: Request) -> BoxFuture {
        let fut = (self.0)(req);
        Box::pin(async move { fut.await.into_response() })
    }
}
