//! Periodic aggregation: pull the last window from every registered agent and
//! normalize each (snapshot, process) pair into the ranking store.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::fetch::AgentClient;
use crate::ranking::RankingStore;
use crate::registry::ServerRegistry;
use crate::types::{ProcessMetricRow, ServerRecord};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(60);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Outcome of one server within a cycle.
#[derive(Debug)]
pub enum ServerOutcome {
    Ingested { snapshots: usize, rows: usize },
    Failed(String),
}

#[derive(Clone)]
pub struct Aggregator {
    registry: ServerRegistry,
    ranking: RankingStore,
    client: AgentClient,
    window: Duration,
}

impl Aggregator {
    pub fn new(
        registry: ServerRegistry,
        ranking: RankingStore,
        client: AgentClient,
        window: Duration,
    ) -> Self {
        Self {
            registry,
            ranking,
            client,
            window,
        }
    }

    /// Run one cycle over all servers. A failing server is logged and skipped; only
    /// failing to read the registry aborts the cycle.
    pub async fn poll_once(&self) -> Result<Vec<(ServerRecord, ServerOutcome)>, StoreError> {
        let servers = self.registry.list()?;
        let mut report = Vec::with_capacity(servers.len());
        for server in servers {
            let outcome = self.poll_server(&server).await;
            match &outcome {
                ServerOutcome::Ingested { snapshots, rows } => info!(
                    server = %server.name,
                    snapshots,
                    rows,
                    "ingested agent window"
                ),
                ServerOutcome::Failed(reason) => {
                    warn!(server = %server.name, url = %server.url, "poll failed: {reason}")
                }
            }
            report.push((server, outcome));
        }
        Ok(report)
    }

    async fn poll_server(&self, server: &ServerRecord) -> ServerOutcome {
        let snapshots = match self.client.fetch_window(&server.url, self.window).await {
            Ok(s) => s,
            Err(e) => return ServerOutcome::Failed(e.to_string()),
        };
        let rows: Vec<ProcessMetricRow> = snapshots
            .iter()
            .flat_map(|s| ProcessMetricRow::from_snapshot(server.id, s))
            .collect();

        let ranking = self.ranking.clone();
        let server_id = server.id;
        let inserted = tokio::task::spawn_blocking(move || {
            let new_rows = ranking.insert(&rows)?;
            Ok::<_, StoreError>((new_rows, ranking.count(server_id)?))
        })
        .await;
        match inserted {
            Ok(Ok((rows, stored))) => {
                debug!(server = %server.name, stored, "rows held for server");
                ServerOutcome::Ingested {
                    snapshots: snapshots.len(),
                    rows,
                }
            }
            Ok(Err(e)) => ServerOutcome::Failed(format!("insert: {e}")),
            Err(e) => ServerOutcome::Failed(format!("insert task: {e}")),
        }
    }

    /// Poll every `period`, starting one period from now.
    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if let Err(e) = self.poll_once().await {
                    warn!("poll cycle skipped: {e}");
                }
            }
        })
    }
}
