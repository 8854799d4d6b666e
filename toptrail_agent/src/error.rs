//! Error kinds for the capture pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Aggregate OS metrics could not be read; the whole snapshot is abandoned.
#[derive(Debug, Error)]
pub enum CollectionError {
    #[error("no CPU cores reported")]
    NoCpus,
    #[error("memory statistics unavailable")]
    Memory,
    #[error("no disk mounted at {0}")]
    DiskNotFound(String),
    #[error("process table is empty")]
    Processes,
    #[error("sampler task failed: {0}")]
    Task(String),
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("encode snapshot: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("append to {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("log task failed: {0}")]
    Task(String),
}

/// One log record that did not parse as a snapshot.
#[derive(Debug, Error)]
#[error("malformed record at line {line}: {source}")]
pub struct DecodeError {
    pub line: usize,
    pub source: serde_json::Error,
}
