use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use graft_core::{CachedScript, GraftError, GraftResult};
use rusqlite::{params, Connection, OptionalExtension};

/// Persisted state for the downloaded widget script: one entry per script
/// URL, body and fetch timestamp read/written as a unit.
pub trait ScriptStore: Send + Sync {
    fn get(&self, script_url: &str) -> GraftResult<Option<CachedScript>>;
    fn put(&self, script_url: &str, entry: &CachedScript) -> GraftResult<()>;
}

const SCHEMA_V1: &str = r#"
CREATE TABLE IF NOT EXISTS script_cache (
    script_url TEXT PRIMARY KEY,
    body TEXT NOT NULL,
    fetched_at_ms INTEGER NOT NULL
);
"#;

pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &str) -> GraftResult<Self> {
        let conn = Connection::open(path).map_err(|e| GraftError::Database(e.to_string()))?;
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA busy_timeout=5000;",
        )
        .map_err(|e| GraftError::Database(e.to_string()))?;
        conn.execute_batch(SCHEMA_V1)
            .map_err(|e| GraftError::Database(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn clone_handle(&self) -> Self {
        Self {
            conn: self.conn.clone(),
        }
    }

    fn with_conn<F, T>(&self, f: F) -> GraftResult<T>
    where
        F: FnOnce(&Connection) -> Result<T, rusqlite::Error>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|e| GraftError::Database(e.to_string()))?;
        f(&conn).map_err(|e| GraftError::Database(e.to_string()))
    }
}

impl ScriptStore for SqliteStore {
    fn get(&self, script_url: &str) -> GraftResult<Option<CachedScript>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT body, fetched_at_ms FROM script_cache WHERE script_url = ?1",
                params![script_url],
                |row| {
                    Ok(CachedScript {
                        body: row.get(0)?,
                        fetched_at_ms: row.get(1)?,
                    })
                },
            )
            .optional()
        })
    }

    fn put(&self, script_url: &str, entry: &CachedScript) -> GraftResult<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT OR REPLACE INTO script_cache (script_url, body, fetched_at_ms) VALUES (?1, ?2, ?3)",
                params![script_url, entry.body, entry.fetched_at_ms],
            )?;
            Ok(())
        })
    }
}

/// Session-only store, used when no cache path is configured and in tests.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, CachedScript>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScriptStore for MemoryStore {
    fn get(&self, script_url: &str) -> GraftResult<Option<CachedScript>> {
        let entries = self
            .entries
            .lock()
            .map_err(|e| GraftError::Database(e.to_string()))?;
        Ok(entries.get(script_url).cloned())
    }

    fn put(&self, script_url: &str, entry: &CachedScript) -> GraftResult<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|e| GraftError::Database(e.to_string()))?;
        entries.insert(script_url.to_string(), entry.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_roundtrip_overwrites_as_a_unit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graft.db");
        let store = SqliteStore::open(path.to_str().unwrap()).unwrap();

        let url = "https://plugin.example/plugin-v1.js";
        assert!(store.get(url).unwrap().is_none());

        store
            .put(
                url,
                &CachedScript {
                    body: "window.Jupiter = {};".to_string(),
                    fetched_at_ms: 1_000,
                },
            )
            .unwrap();

        let entry = store.get(url).unwrap().unwrap();
        assert_eq!(entry.body, "window.Jupiter = {};");
        assert_eq!(entry.fetched_at_ms, 1_000);

        // A newer fetch supersedes both fields at once.
        store
            .put(
                url,
                &CachedScript {
                    body: "window.Jupiter = { init: function () {} };".to_string(),
                    fetched_at_ms: 2_000,
                },
            )
            .unwrap();

        let entry = store.get(url).unwrap().unwrap();
        assert_eq!(entry.fetched_at_ms, 2_000);
        assert!(entry.body.contains("init"));
    }

    #[test]
    fn sqlite_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graft.db");

        {
            let store = SqliteStore::open(path.to_str().unwrap()).unwrap();
            store
                .put(
                    "u",
                    &CachedScript {
                        body: "x".to_string(),
                        fetched_at_ms: 7,
                    },
                )
                .unwrap();
        }

        let store = SqliteStore::open(path.to_str().unwrap()).unwrap();
        assert_eq!(store.get("u").unwrap().unwrap().fetched_at_ms, 7);
    }
}
