//! Normalized per-process samples and the top-N query over them.

use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::params;

use crate::db::Db;
use crate::error::{StoreError, ValidationError};
use crate::types::{ProcessInfo, ProcessMetricRow};

pub const DEFAULT_LIMIT: usize = 10;

// One fixed statement per metric; the sort column never comes from the request.
const TOP_BY_CPU: &str = "SELECT pid, name, cpu, memory FROM process_metrics \
     WHERE timestamp >= ?1 AND server_id = ?2 \
     ORDER BY cpu DESC, id ASC LIMIT ?3";
const TOP_BY_MEMORY: &str = "SELECT pid, name, cpu, memory FROM process_metrics \
     WHERE timestamp >= ?1 AND server_id = ?2 \
     ORDER BY memory DESC, id ASC LIMIT ?3";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Cpu,
    Memory,
}

impl Metric {
    fn statement(self) -> &'static str {
        match self {
            Metric::Cpu => TOP_BY_CPU,
            Metric::Memory => TOP_BY_MEMORY,
        }
    }
}

impl FromStr for Metric {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpu" => Ok(Metric::Cpu),
            "memory" => Ok(Metric::Memory),
            _ => Err(ValidationError::InvalidMetric),
        }
    }
}

/// A validated `/top` request.
#[derive(Debug, Clone, PartialEq)]
pub struct TopQuery {
    pub metric: Metric,
    pub window: Duration,
    pub server_id: i64,
    pub limit: usize,
}

impl TopQuery {
    /// Validate raw request values: duration first, then metric, then server id.
    pub fn parse(
        metric: Option<&str>,
        duration: Option<&str>,
        server_id: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let window = duration
            .and_then(|d| humantime::parse_duration(d.trim()).ok())
            .ok_or(ValidationError::InvalidDuration)?;
        let metric = metric.unwrap_or_default().parse()?;
        let server_id = server_id
            .and_then(|s| s.trim().parse().ok())
            .ok_or(ValidationError::InvalidServerId)?;
        Ok(Self {
            metric,
            window,
            server_id,
            limit: DEFAULT_LIMIT,
        })
    }

    /// Oldest timestamp still inside the window, clamped rather than overflowing.
    pub fn threshold(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        chrono::Duration::from_std(self.window)
            .ok()
            .and_then(|d| now.checked_sub_signed(d))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }
}

#[derive(Clone)]
pub struct RankingStore {
    db: Db,
}

impl RankingStore {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Insert rows in one transaction. Rows already present for the same
    /// (server, pid, timestamp) are ignored; returns how many were new.
    pub fn insert(&self, rows: &[ProcessMetricRow]) -> Result<usize, StoreError> {
        let mut conn = self.db.lock()?;
        let tx = conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO process_metrics \
                 (timestamp, pid, name, cpu, memory, server_id) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for row in rows {
                inserted += stmt.execute(params![
                    row.timestamp.timestamp_millis(),
                    row.pid,
                    row.name,
                    row.cpu,
                    row.memory,
                    row.server_id,
                ])?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }

    pub fn top(
        &self,
        query: &TopQuery,
        now: DateTime<Utc>,
    ) -> Result<Vec<ProcessInfo>, StoreError> {
        let threshold = query.threshold(now).timestamp_millis();
        let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare_cached(query.metric.statement())?;
        let rows = stmt.query_map(params![threshold, query.server_id, limit], |row| {
            Ok(ProcessInfo {
                pid: row.get(0)?,
                name: row.get(1)?,
                cpu: row.get(2)?,
                memory: row.get(3)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn count(&self, server_id: i64) -> Result<u64, StoreError> {
        let conn = self.db.lock()?;
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM process_metrics WHERE server_id = ?1",
            params![server_id],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    }
}
