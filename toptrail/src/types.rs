//! Types that mirror the agent's JSON schema, plus the aggregator's own records.
//! Only the fields the aggregator reads are declared; the rest of a snapshot is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Deserialize, Clone)]
pub struct AgentProcess {
    pub pid: u32,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub cpu: f64,
    #[serde(default)]
    pub memory: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AgentSnapshot {
    pub timestamp: DateTime<Utc>,
    // Agents with an empty process table send `null` here.
    #[serde(default, deserialize_with = "null_as_empty")]
    pub processes: Vec<AgentProcess>,
}

fn null_as_empty<'de, D, T>(de: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(de)?.unwrap_or_default())
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerRecord {
    pub id: i64,
    pub name: String,
    pub url: String,
}

/// One (snapshot, process) pair tagged with the server it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessMetricRow {
    pub timestamp: DateTime<Utc>,
    pub pid: u32,
    pub name: String,
    pub cpu: f64,
    pub memory: f64,
    pub server_id: i64,
}

/// Row shape returned by `/top`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cpu: f64,
    pub memory: f64,
}

impl ProcessMetricRow {
    pub fn from_snapshot(server_id: i64, snapshot: &AgentSnapshot) -> Vec<Self> {
        snapshot
            .processes
            .iter()
            .map(|p| Self {
                timestamp: snapshot.timestamp,
                pid: p.pid,
                name: p.name.clone(),
                cpu: p.cpu,
                memory: p.memory,
                server_id,
            })
            .collect()
    }
}
