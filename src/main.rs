//! fontgate binary.
//!
//! Loads `.env` and the environment, sets up logging, and serves until
//! SIGTERM / Ctrl-C.
//!
//!   RUST_LOG=fontgate=debug LOG_FORMAT=pretty cargo run

use std::sync::Arc;

use fontgate::{Background, Config, HttpFetcher, MemoryCache, Proxy, Server, app};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), fontgate::Error> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Arc::new(Config::from_env()?);
    info!(
        listen_addr = %config.listen_addr,
        proxy_domain = config.proxy_domain.as_deref().unwrap_or("<request origin>"),
        gate = !config.allowed_origins.is_empty(),
        purge_secured = config.purge_key.is_some(),
        cache_capacity = config.cache_capacity,
        "configuration loaded"
    );

    let background = Background::new();
    let proxy = Proxy::new(
        Arc::clone(&config),
        Arc::new(MemoryCache::from_config(&config)),
        Arc::new(HttpFetcher::new(&config)?),
        background.clone(),
    );

    Server::bind(config.listen_addr)
        .background(background)
        .serve(app(Arc::new(proxy)))
        .await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter);

    let format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if format.eq_ignore_ascii_case("json") {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
