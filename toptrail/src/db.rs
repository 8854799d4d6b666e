//! SQLite store shared by the server registry and the ranking table.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;
use tracing::info;

use crate::error::StoreError;

pub const DEFAULT_DB_FILE: &str = "toptrail.db";

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS servers (
    id      INTEGER PRIMARY KEY AUTOINCREMENT,
    name    TEXT NOT NULL,
    url     TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS process_metrics (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp   INTEGER NOT NULL,
    pid         INTEGER NOT NULL,
    name        TEXT NOT NULL,
    cpu         REAL NOT NULL,
    memory      REAL NOT NULL,
    server_id   INTEGER NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS process_metrics_sample
    ON process_metrics (server_id, pid, timestamp);
CREATE INDEX IF NOT EXISTS process_metrics_window
    ON process_metrics (server_id, timestamp);
";

/// Cloneable handle to one SQLite connection. Each caller holds the lock for a single
/// statement or transaction.
#[derive(Clone)]
pub struct Db {
    conn: Arc<Mutex<Connection>>,
}

impl Db {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.execute_batch(SCHEMA)?;
        info!(path = %path.display(), "opened store");
        Ok(Self::wrap(conn))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self::wrap(conn))
    }

    fn wrap(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}
