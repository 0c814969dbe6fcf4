use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::store::migrations::MIGRATIONS;
use crate::store::ObjectStore;

/// SQLite-backed bucket: objects are rows keyed by (bucket, key).
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
    bucket: String,
}

impl SqliteStore {
    /// Open (or create) a database at the given path and apply migrations.
    pub fn open(path: impl AsRef<Path>, bucket: impl Into<String>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, bucket.into())
    }

    /// Open an in-memory database (for tests).
    pub fn open_in_memory(bucket: impl Into<String>) -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, bucket.into())
    }

    fn with_connection(conn: Connection, bucket: String) -> Result<Self> {
        apply_migrations(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
            bucket,
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::InvalidData("object store connection lock poisoned".to_string()))
    }
}

fn apply_migrations(conn: &Connection) -> Result<()> {
    // Create migrations table if it doesn't exist
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let mut stmt = conn.prepare("SELECT version FROM schema_migrations ORDER BY version")?;
    let applied: Vec<u32> = stmt
        .query_map([], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    for migration in MIGRATIONS {
        if !applied.contains(&migration.version) {
            log::info!(
                "Applying migration {} ({})",
                migration.version,
                migration.name
            );
            conn.execute_batch(migration.sql)?;
            conn.execute(
                "INSERT INTO schema_migrations (version, name) VALUES (?1, ?2)",
                rusqlite::params![migration.version, migration.name],
            )?;
        }
    }

    Ok(())
}

impl ObjectStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let conn = self.conn()?;
        let body = conn
            .query_row(
                "SELECT body FROM objects WHERE bucket = ?1 AND key = ?2",
                rusqlite::params![self.bucket, key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(body)
    }

    fn put(&self, key: &str, body: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Err(Error::InvalidData("empty object key".to_string()));
        }
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO objects (bucket, key, body, size, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(bucket, key) DO UPDATE SET
                body = excluded.body,
                size = excluded.size,
                updated_at = excluded.updated_at",
            rusqlite::params![
                self.bucket,
                key,
                body,
                i64::try_from(body.len()).unwrap_or(i64::MAX),
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT key FROM objects
             WHERE bucket = ?1 AND substr(key, 1, length(?2)) = ?2
             ORDER BY key",
        )?;
        let keys = stmt
            .query_map(rusqlite::params![self.bucket, prefix], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_in_memory_applies_migrations() {
        let store = SqliteStore::open_in_memory("bucket").unwrap();
        let count: i64 = store
            .conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM schema_migrations", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_put_get_overwrite() {
        let store = SqliteStore::open_in_memory("bucket").unwrap();
        assert_eq!(store.get("data/LYRICS.csv").unwrap(), None);

        store.put("data/LYRICS.csv", b"v1").unwrap();
        store.put("data/LYRICS.csv", b"v2").unwrap();
        assert_eq!(store.get("data/LYRICS.csv").unwrap(), Some(b"v2".to_vec()));
    }

    #[test]
    fn test_buckets_are_isolated() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("objects.db");
        let country = SqliteStore::open(&path, "country").unwrap();
        country.put("data/LIB.csv", b"country").unwrap();

        let pop = SqliteStore::open(&path, "pop").unwrap();
        assert_eq!(pop.get("data/LIB.csv").unwrap(), None);
        assert!(pop.list("data/").unwrap().is_empty());
        assert_eq!(country.list("data/").unwrap(), vec!["data/LIB.csv".to_string()]);
    }

    #[test]
    fn test_list_by_prefix() {
        let store = SqliteStore::open_in_memory("bucket").unwrap();
        store.put("data/charts/CHARTS_1960-01-09.csv", b"").unwrap();
        store.put("data/charts/CHARTS_1960-01-02.csv", b"").unwrap();
        store.put("data/CHARTS.csv", b"").unwrap();

        let keys = store.list("data/charts/").unwrap();
        assert_eq!(keys.len(), 2);
        assert!(keys[0] < keys[1]);
    }

    #[test]
    fn test_reopen_keeps_objects() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("objects.db");
        SqliteStore::open(&path, "b").unwrap().put("k", b"body").unwrap();
        let reopened = SqliteStore::open(&path, "b").unwrap();
        assert_eq!(reopened.get("k").unwrap(), Some(b"body".to_vec()));
    }
}
