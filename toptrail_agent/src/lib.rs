//! toptrail_agent: samples host and process metrics into an append-only log and serves
//! time-windowed views of it over HTTP.

pub mod api;
pub mod capture;
pub mod capture_log;
pub mod config;
pub mod error;
pub mod metrics;
pub mod state;
pub mod types;

use tracing_subscriber::{fmt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over the fallback level.
pub fn init_tracing(fallback_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(false).init();
}
