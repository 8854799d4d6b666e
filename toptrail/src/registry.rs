//! Registered agents: persisted (id, name, url) records in the `servers` table.

use rusqlite::params;
use tracing::info;

use crate::db::Db;
use crate::error::{StoreError, ValidationError};
use crate::types::ServerRecord;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct ServerRegistry {
    db: Db,
}

impl ServerRegistry {
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Insert a new server. Both fields are trimmed and must be non-empty.
    pub fn add(&self, name: &str, url: &str) -> Result<ServerRecord, RegistryError> {
        let (name, url) = (name.trim(), url.trim());
        if name.is_empty() || url.is_empty() {
            return Err(ValidationError::MissingField.into());
        }
        let conn = self.db.lock()?;
        conn.execute(
            "INSERT INTO servers (name, url) VALUES (?1, ?2)",
            params![name, url],
        )
        .map_err(StoreError::from)?;
        let record = ServerRecord {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            url: url.to_string(),
        };
        info!(id = record.id, name = %record.name, url = %record.url, "registered server");
        Ok(record)
    }

    pub fn list(&self) -> Result<Vec<ServerRecord>, StoreError> {
        let conn = self.db.lock()?;
        let mut stmt = conn.prepare("SELECT id, name, url FROM servers ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(ServerRecord {
                id: row.get(0)?,
                name: row.get(1)?,
                url: row.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> ServerRegistry {
        ServerRegistry::new(Db::open_in_memory().unwrap())
    }

    #[test]
    fn empty_fields_are_rejected() {
        let reg = registry();
        for (name, url) in [("", "http://a"), ("a", ""), ("  ", "http://a"), ("", "")] {
            let err = reg.add(name, url).unwrap_err();
            assert!(matches!(
                err,
                RegistryError::Invalid(ValidationError::MissingField)
            ));
        }
        assert!(reg.list().unwrap().is_empty());
    }

    #[test]
    fn list_is_ordered_by_assigned_id() {
        let reg = registry();
        let a = reg.add("a", "http://a").unwrap();
        let b = reg.add("b", " http://b ").unwrap();
        assert!(a.id < b.id);

        let all = reg.list().unwrap();
        assert_eq!(all, vec![a, b.clone()]);
        assert_eq!(b.url, "http://b");
    }

    #[test]
    fn duplicate_names_get_distinct_ids() {
        let reg = registry();
        let first = reg.add("web", "http://one").unwrap();
        let second = reg.add("web", "http://two").unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(reg.list().unwrap().len(), 2);
    }
}
