//! Entry point for the toptrail aggregator: open the store, start polling, serve HTTP.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use toptrail::{
    api::router, config::Config, db::Db, fetch::AgentClient, init_tracing, poller::Aggregator,
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    let cfg = Config::parse();
    init_tracing(&cfg.log_level);

    let db = Db::open(&cfg.db).with_context(|| format!("opening {}", cfg.db.display()))?;
    let state = AppState::new(db);

    let client = AgentClient::new(cfg.fetch_timeout).context("building HTTP client")?;
    let aggregator = Aggregator::new(
        state.registry.clone(),
        state.ranking.clone(),
        client,
        cfg.window,
    );
    let poller = aggregator.spawn(cfg.poll_interval);
    info!(
        every = %humantime::format_duration(cfg.poll_interval),
        window = %humantime::format_duration(cfg.window),
        "polling agents"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(addr = %listener.local_addr()?, "toptrail listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("received SIGINT, shutting down");
        })
        .await
        .context("serving HTTP")?;
    poller.abort();
    Ok(())
}
