//! Error kinds for the aggregator.

use thiserror::Error;

/// Malformed client input; always surfaced as a 400.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing name or URL")]
    MissingField,
    #[error("Invalid duration format")]
    InvalidDuration,
    #[error("Invalid type. Must be 'cpu' or 'memory'")]
    InvalidMetric,
    #[error("Invalid serverId")]
    InvalidServerId,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

/// Fetching a window from one agent failed.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("bad agent url {url}: {reason}")]
    Url { url: String, reason: String },
    #[error("request to {url} failed: {source}")]
    Request { url: String, source: reqwest::Error },
    #[error("{url} answered {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("decoding response from {url}: {source}")]
    Decode { url: String, source: reqwest::Error },
}
