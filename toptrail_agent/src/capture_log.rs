//! Append-only capture log: one JSON snapshot per line.
//! Stored at a fixed path in the working directory unless overridden (--log-file).

use std::{
    fs::{self, OpenOptions},
    io::{self, BufRead, BufReader, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use tracing::warn;

use crate::error::{DecodeError, PersistError};
use crate::types::MetricSnapshot;

pub const DEFAULT_LOG_FILE: &str = "toptrail_capture.jsonl";

#[derive(Debug, Clone)]
pub struct CaptureLog {
    path: PathBuf,
}

impl CaptureLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one snapshot as a single line. Prior records are never touched.
    pub fn append(&self, snapshot: &MetricSnapshot) -> Result<(), PersistError> {
        let mut line = serde_json::to_vec(snapshot)?;
        line.push(b'\n');
        let write_err = |source| PersistError::Write {
            path: self.path.clone(),
            source,
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(write_err)?;
        // One write call per record keeps concurrent readers from seeing half a line in the
        // common case; a torn tail is skipped by `query` anyway.
        file.write_all(&line).map_err(write_err)
    }

    /// Snapshots captured strictly after `since`, in append order.
    ///
    /// The file is scanned one line at a time. A missing file is an empty log; a line that does
    /// not decode is logged and skipped so one torn write cannot hide the rest of the history.
    pub fn query(&self, since: DateTime<Utc>) -> Result<Vec<MetricSnapshot>, PersistError> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => {
                return Err(PersistError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let mut out = Vec::new();
        for (idx, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|source| PersistError::Read {
                path: self.path.clone(),
                source,
            })?;
            match decode_line(idx + 1, &line) {
                Ok(Some(snapshot)) if snapshot.timestamp > since => out.push(snapshot),
                Ok(_) => {}
                Err(e) => warn!(path = %self.path.display(), "skipping capture record: {e}"),
            }
        }
        Ok(out)
    }
}

fn decode_line(line_no: usize, line: &str) -> Result<Option<MetricSnapshot>, DecodeError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(trimmed)
        .map(Some)
        .map_err(|source| DecodeError {
            line: line_no,
            source,
        })
}
