//! Command line and environment configuration for the agent.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::capture_log::DEFAULT_LOG_FILE;

pub const DEFAULT_PORT: u16 = 8080;

/// Host metrics capture agent.
#[derive(Debug, Parser)]
#[command(name = "toptrail_agent", version, about)]
pub struct Config {
    /// HTTP port to listen on.
    #[arg(short, long, env = "TOPTRAIL_AGENT_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Append-only capture log (one JSON snapshot per line).
    #[arg(long, env = "TOPTRAIL_AGENT_LOG", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,

    /// Time between captures while capturing (e.g. 10s, 1m).
    #[arg(long, default_value = "10s", value_parser = parse_interval)]
    pub interval: Duration,

    /// Mount point whose disk usage is recorded.
    #[arg(long, env = "TOPTRAIL_AGENT_MOUNT", default_value = "/")]
    pub mount: String,

    /// Start capturing immediately instead of waiting for POST /capture.
    #[arg(long)]
    pub capture: bool,

    /// Print the captured window and exit without serving.
    #[arg(long, conflicts_with = "capture")]
    pub view: bool,

    /// Window printed by --view (e.g. 2h, 30m).
    #[arg(long, default_value = "2h", value_parser = humantime::parse_duration)]
    pub duration: Duration,

    /// Logging verbosity when RUST_LOG is unset (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

fn parse_interval(raw: &str) -> Result<Duration, String> {
    let d = humantime::parse_duration(raw).map_err(|e| e.to_string())?;
    if d.is_zero() {
        return Err("interval must be greater than zero".into());
    }
    Ok(d)
}
