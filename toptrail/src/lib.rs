//! toptrail: aggregation server that polls capture agents, stores their per-process
//! samples and answers top-N queries over a time window.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod poller;
pub mod ranking;
pub mod registry;
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
