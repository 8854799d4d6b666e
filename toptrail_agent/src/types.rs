//! Snapshot types written to the capture log and served from `/view`.
//! Keep this module minimal and stable; it defines the wire format the aggregator mirrors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProcessSample {
    pub pid: u32,
    pub name: String,
    #[serde(rename = "cpu")]
    pub cpu_percent: f64,
    #[serde(rename = "memory")]
    pub memory_percent: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct MemoryStats {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    #[serde(rename = "usedPercent")]
    pub used_percent: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct DiskStats {
    // mount point the figures belong to
    pub path: String,
    pub total: u64,
    pub used: u64,
    #[serde(rename = "usedPercent")]
    pub used_percent: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MetricSnapshot {
    pub timestamp: DateTime<Utc>,
    // per-core utilisation, 0..=100, in core order
    #[serde(rename = "cpu")]
    pub cpu_percentages: Vec<f64>,
    pub memory: MemoryStats,
    pub disk: DiskStats,
    pub processes: Vec<ProcessSample>,
}
