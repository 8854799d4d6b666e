//! toptrail_agent entry point: parse flags, then either print a window of the log
//! (--view) or serve the capture API.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;

use toptrail_agent::{
    api::{router, window_start},
    capture::CaptureController,
    capture_log::CaptureLog,
    config::Config,
    init_tracing,
    metrics::SystemSampler,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::parse();
    init_tracing(&cfg.log_level);

    let log = CaptureLog::new(&cfg.log_file);

    if cfg.view {
        return print_view(&log, &cfg);
    }

    let sampler = SystemSampler::new(cfg.mount.clone());
    let controller = CaptureController::new(Box::new(sampler), log.clone(), cfg.interval);
    let state = AppState::new(controller, log);

    if cfg.capture {
        state.controller.start().await;
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(
        addr = %listener.local_addr()?,
        log = %cfg.log_file.display(),
        "toptrail agent listening"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("received SIGINT, shutting down");
        })
        .await
        .context("serving HTTP")?;
    Ok(())
}

fn print_view(log: &CaptureLog, cfg: &Config) -> Result<()> {
    let since = window_start(Utc::now(), cfg.duration);
    let snapshots = log
        .query(since)
        .with_context(|| format!("reading {}", log.path().display()))?;
    for m in snapshots {
        println!(
            "Timestamp: {}, CPU: {:?}, Memory Used: {:.2}%, Disk Used: {:.2}%",
            m.timestamp, m.cpu_percentages, m.memory.used_percent, m.disk.used_percent
        );
    }
    Ok(())
}
