//! # fontgate
//!
//! A caching reverse proxy for web fonts.
//!
//! Stylesheet requests (`/css`, `/css2`) go to `fonts.googleapis.com`;
//! everything else goes to `fonts.gstatic.com`. Font URLs inside returned
//! stylesheets are rewritten to point back at the proxy, so browsers never
//! talk to the origin hosts directly. Successful responses are cached and
//! served from the cache on later requests.
//!
//! ## Request flow
//!
//! ```text
//! /             → 302 to the project page
//! /purge-cache  → evict cache entries (optional shared secret)
//! anything else → access gate → cache → upstream → rewrite → store (background)
//! ```
//!
//! ## Running
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use fontgate::{Background, Config, HttpFetcher, MemoryCache, Proxy, Server, app};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), fontgate::Error> {
//!     let config = Arc::new(Config::from_env()?);
//!     let background = Background::new();
//!     let proxy = Proxy::new(
//!         Arc::clone(&config),
//!         Arc::new(MemoryCache::from_config(&config)),
//!         Arc::new(HttpFetcher::new(&config)?),
//!         background.clone(),
//!     );
//!
//!     Server::bind(config.listen_addr)
//!         .background(background)
//!         .serve(app(Arc::new(proxy)))
//!         .await
//! }
//! ```
//!
//! The cache and the upstream client sit behind [`ResponseCache`] and
//! [`Fetch`]; swap either for another backend without touching the pipeline.

mod app;
mod background;
mod cache;
mod config;
mod error;
mod fetch;
mod gate;
mod handler;
mod proxy;
mod purge;
mod request;
mod response;
mod rewrite;
mod router;
mod server;
mod transform;
mod upstream;

pub mod health;

pub use app::app;
pub use background::Background;
pub use cache::{CacheError, CacheKey, CachedResponse, MemoryCache, ResponseCache};
pub use config::Config;
pub use error::{ConfigError, Error, Result};
pub use fetch::{Fetch, FetchError, HttpFetcher, UpstreamRequest, UpstreamResponse};
pub use gate::{Denial, Verdict};
pub use handler::Handler;
pub use proxy::Proxy;
pub use purge::{PURGE_PATH, WELL_KNOWN_PATHS};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response, ResponseBuilder};
pub use rewrite::CssRewriter;
pub use router::Router;
pub use server::Server;
pub use upstream::{ASSET_HOST, CSS_HOST, Upstream};
