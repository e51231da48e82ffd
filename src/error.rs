//! Unified error type.

use thiserror::Error;

/// The error type returned by fontgate's fallible startup operations.
///
/// Per-request failures (denied origins, upstream errors, cache outages) are
/// expressed as HTTP [`Response`](crate::Response) values, not as `Error`s.
/// This type surfaces infrastructure failures: reading configuration,
/// building the upstream client, binding a port.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// A configuration value that is present but unusable.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
