//! Command line and environment configuration for the aggregator.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::db::DEFAULT_DB_FILE;

pub const DEFAULT_PORT: u16 = 8081;

/// Polls toptrail agents and ranks their processes by CPU or memory.
#[derive(Debug, Parser)]
#[command(name = "toptrail", version, about)]
pub struct Config {
    /// HTTP port to listen on.
    #[arg(short, long, env = "TOPTRAIL_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// SQLite database holding servers and process samples.
    #[arg(long, env = "TOPTRAIL_DB", default_value = DEFAULT_DB_FILE)]
    pub db: PathBuf,

    /// Time between poll cycles.
    #[arg(long, default_value = "60s", value_parser = parse_positive)]
    pub poll_interval: Duration,

    /// Window requested from each agent's /view per cycle.
    #[arg(long, default_value = "1m", value_parser = parse_positive)]
    pub window: Duration,

    /// Per-request timeout when fetching from an agent.
    #[arg(long, default_value = "10s", value_parser = parse_positive)]
    pub fetch_timeout: Duration,

    /// Logging verbosity when RUST_LOG is unset (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

fn parse_positive(raw: &str) -> Result<Duration, String> {
    let d = humantime::parse_duration(raw).map_err(|e| e.to_string())?;
    if d.is_zero() {
        return Err("duration must be greater than zero".into());
    }
    Ok(d)
}
