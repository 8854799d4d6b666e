//! Metrics collection using sysinfo for toptrail_agent.

use std::path::Path;

use chrono::Utc;
use sysinfo::{Disks, MemoryRefreshKind, ProcessRefreshKind, ProcessesToUpdate, System};
use tracing::debug;

use crate::error::CollectionError;
use crate::types::{DiskStats, MemoryStats, MetricSnapshot, ProcessSample};

/// Takes one point-in-time snapshot of system and process metrics.
pub trait Sampler: Send + 'static {
    fn capture(&mut self) -> Result<MetricSnapshot, CollectionError>;
}

/// Sampler backed by a long-lived `sysinfo::System`.
///
/// CPU percentages (global and per process) are deltas against the counters read by the
/// previous capture, so the handle must outlive a single call. The constructor primes the
/// counters; the very first capture after startup may still report near-zero CPU.
pub struct SystemSampler {
    sys: System,
    disks: Disks,
    mount_point: String,
}

impl SystemSampler {
    pub fn new(mount_point: impl Into<String>) -> Self {
        let mut sys = System::new();
        sys.refresh_cpu_usage();
        sys.refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());
        sys.refresh_processes_specifics(ProcessesToUpdate::All, true, process_kind());
        Self {
            sys,
            disks: Disks::new_with_refreshed_list(),
            mount_point: mount_point.into(),
        }
    }

    fn cpu(&mut self) -> Result<Vec<f64>, CollectionError> {
        self.sys.refresh_cpu_usage();
        let per_core: Vec<f64> = self
            .sys
            .cpus()
            .iter()
            .map(|c| f64::from(c.cpu_usage()).clamp(0.0, 100.0))
            .collect();
        if per_core.is_empty() {
            return Err(CollectionError::NoCpus);
        }
        Ok(per_core)
    }

    fn memory(&mut self) -> Result<MemoryStats, CollectionError> {
        self.sys
            .refresh_memory_specifics(MemoryRefreshKind::nothing().with_ram());
        let total = self.sys.total_memory();
        if total == 0 {
            return Err(CollectionError::Memory);
        }
        let used = self.sys.used_memory();
        Ok(MemoryStats {
            total,
            used,
            free: self.sys.free_memory(),
            used_percent: percent_of(used, total),
        })
    }

    fn disk(&mut self) -> Result<DiskStats, CollectionError> {
        // Refresh the list so mounts that appear after startup are found.
        self.disks.refresh(true);
        let wanted = Path::new(&self.mount_point);
        let disk = self
            .disks
            .iter()
            .find(|d| d.mount_point() == wanted)
            .ok_or_else(|| CollectionError::DiskNotFound(self.mount_point.clone()))?;
        // sysinfo only exposes space available to unprivileged users, so root-reserved
        // blocks count as used here.
        let total = disk.total_space();
        let used = total.saturating_sub(disk.available_space());
        Ok(DiskStats {
            path: self.mount_point.clone(),
            total,
            used,
            used_percent: percent_of(used, total),
        })
    }

    fn processes(&mut self, mem_total: u64) -> Result<Vec<ProcessSample>, CollectionError> {
        self.sys
            .refresh_processes_specifics(ProcessesToUpdate::All, true, process_kind());
        let procs = self.sys.processes();
        if procs.is_empty() {
            return Err(CollectionError::Processes);
        }
        // Fields of a process that exited mid-refresh come back empty/zero; keep it anyway.
        Ok(procs
            .values()
            .map(|p| ProcessSample {
                pid: p.pid().as_u32(),
                name: p.name().to_string_lossy().into_owned(),
                cpu_percent: f64::from(p.cpu_usage()).max(0.0),
                memory_percent: percent_of(p.memory(), mem_total) as f32,
            })
            .collect())
    }
}

impl Sampler for SystemSampler {
    fn capture(&mut self) -> Result<MetricSnapshot, CollectionError> {
        let cpu_percentages = self.cpu()?;
        let memory = self.memory()?;
        let disk = self.disk()?;
        let processes = self.processes(memory.total)?;
        debug!(
            cores = cpu_percentages.len(),
            processes = processes.len(),
            "sampled system metrics"
        );
        Ok(MetricSnapshot {
            timestamp: Utc::now(),
            cpu_percentages,
            memory,
            disk,
            processes,
        })
    }
}

fn process_kind() -> ProcessRefreshKind {
    ProcessRefreshKind::nothing().with_cpu().with_memory()
}

fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
