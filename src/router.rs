//! Radix-tree request router.
//!
//! One tree per HTTP method, one tree for method-agnostic routes, and an
//! optional fallback for everything else. The proxy itself is the fallback:
//! any path that is not a reserved route belongs to the upstream hosts.

use std::collections::HashMap;

use http::{Method, StatusCode};
use matchit::Router as MatchitRouter;

use crate::handler::{BoxedHandler, Handler};
use crate::request::Request;
use crate::response::Response;

pub struct Router {
    routes: HashMap<Method, MatchitRouter<BoxedHandler>>,
    any: MatchitRouter<BoxedHandler>,
    fallback: Option<BoxedHandler>,
}

enum Lookup {
    Found(BoxedHandler, HashMap<String, String>),
    MethodNotAllowed,
    NotFound,
}

impl Router {
    pub fn new() -> Self {
        Self { routes: HashMap::new(), any: MatchitRouter::new(), fallback: None }
    }

    /// Register a handler for a method + path pair. Returns `self` for chaining.
    ///
    /// Path parameters use `{name}` syntax and are read back with
    /// [`Request::param`].
    pub fn on(mut self, method: Method, path: &str, handler: impl Handler) -> Self {
        insert(self.routes.entry(method).or_default(), path, handler);
        self
    }

    pub fn get(self, path: &str, handler: impl Handler) -> Self {
        self.on(Method::GET, path, handler)
    }

    /// Register a handler for a path regardless of method.
    ///
    /// Method-specific routes registered with [`on`](Router::on) win over
    /// these on the same path.
    pub fn any(mut self, path: &str, handler: impl Handler) -> Self {
        insert(&mut self.any, path, handler);
        self
    }

    /// Handler for requests no route matches.
    pub fn fallback(mut self, handler: impl Handler) -> Self {
        self.fallback = Some(handler.into_boxed_handler());
        self
    }

    /// Routes one request and produces one response.
    pub async fn call(&self, req: Request) -> Response {
        match self.lookup(req.method(), req.path()) {
            Lookup::Found(handler, params) => handler.call(req.with_params(params)).await,
            Lookup::MethodNotAllowed => Response::status(StatusCode::METHOD_NOT_ALLOWED),
            Lookup::NotFound => match &self.fallback {
                Some(handler) => handler.call(req).await,
                None => Response::status(StatusCode::NOT_FOUND),
            },
        }
    }

    fn lookup(&self, method: &Method, path: &str) -> Lookup {
        let matched = self
            .routes
            .get(method)
            .and_then(|tree| tree.at(path).ok())
            .or_else(|| self.any.at(path).ok());

        if let Some(matched) = matched {
            let params = matched.params.iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            return Lookup::Found(matched.value.clone(), params);
        }

        if self.routes.values().any(|tree| tree.at(path).is_ok()) {
            Lookup::MethodNotAllowed
        } else {
            Lookup::NotFound
        }
    }
}

impl Default for Router {
    fn default() -> Self { Self::new() }
}

fn insert(tree: &mut MatchitRouter<BoxedHandler>, path: &str, handler: impl Handler) {
    tree.insert(path, handler.into_boxed_handler())
        .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
}
