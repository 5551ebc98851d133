// Credential storage
// The store is a string key-value surface over whatever persistence the
// host provides: an in-process map for tests and short-lived tools, or a
// SQLite file for a durable session on disk.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};

use super::types::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

/// Key-value credential storage consumed by the gateway.
///
/// Writes are best-effort: an implementation that cannot persist a value
/// must still reflect it to subsequent `get` calls for the life of the
/// process, so the session keeps working even when the disk does not.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);

    /// Store a fresh access/refresh pair. Both keys are written before
    /// control returns, so no reader observes a mix of old and new.
    fn put_pair(&self, access_token: &str, refresh_token: &str) {
        self.set(ACCESS_TOKEN_KEY, access_token);
        self.set(REFRESH_TOKEN_KEY, refresh_token);
    }

    /// Drop both tokens, ending the stored session.
    fn clear_pair(&self) {
        self.remove(ACCESS_TOKEN_KEY);
        self.remove(REFRESH_TOKEN_KEY);
    }
}

/// In-memory credential store.
#[derive(Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .expect("credential store lock poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .expect("credential store lock poisoned")
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.values
            .lock()
            .expect("credential store lock poisoned")
            .remove(key);
    }
}

/// SQLite-backed credential store over a single `auth_kv` table.
///
/// Reads and writes go through an in-memory cache; the database is the
/// durable copy. A failed disk write is logged and the cached value
/// kept, so a transient I/O problem does not drop the live session.
pub struct SqliteStore {
    conn: Mutex<rusqlite::Connection>,
    cache: Mutex<HashMap<String, String>>,
}

impl SqliteStore {
    /// Open (creating if needed) the credential database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = rusqlite::Connection::open(path)
            .with_context(|| format!("Failed to open credential database: {}", path.display()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS auth_kv (key TEXT PRIMARY KEY, value TEXT NOT NULL)",
            [],
        )
        .context("Failed to create auth_kv table")?;

        let mut cache = HashMap::new();
        {
            let mut stmt = conn
                .prepare("SELECT key, value FROM auth_kv")
                .context("Failed to read credential database")?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;
            for row in rows {
                let (key, value) = row?;
                cache.insert(key, value);
            }
        }

        Ok(Self {
            conn: Mutex::new(conn),
            cache: Mutex::new(cache),
        })
    }
}

impl CredentialStore for SqliteStore {
    fn get(&self, key: &str) -> Option<String> {
        self.cache
            .lock()
            .expect("credential cache lock poisoned")
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.cache
            .lock()
            .expect("credential cache lock poisoned")
            .insert(key.to_string(), value.to_string());

        let conn = self.conn.lock().expect("credential db lock poisoned");
        if let Err(e) = conn.execute(
            "INSERT INTO auth_kv (key, value) VALUES (?1, ?2) \
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        ) {
            tracing::warn!(key, error = %e, "failed to persist credential");
        }
    }

    fn remove(&self, key: &str) {
        self.cache
            .lock()
            .expect("credential cache lock poisoned")
            .remove(key);

        let conn = self.conn.lock().expect("credential db lock poisoned");
        if let Err(e) = conn.execute("DELETE FROM auth_kv WHERE key = ?1", [key]) {
            tracing::warn!(key, error = %e, "failed to remove persisted credential");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);

        store.set(ACCESS_TOKEN_KEY, "T1");
        assert_eq!(store.get(ACCESS_TOKEN_KEY), Some("T1".to_string()));

        store.remove(ACCESS_TOKEN_KEY);
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);
    }

    #[test]
    fn test_pair_helpers() {
        let store = MemoryStore::new();
        store.put_pair("T1", "R1");
        assert_eq!(store.get(ACCESS_TOKEN_KEY), Some("T1".to_string()));
        assert_eq!(store.get(REFRESH_TOKEN_KEY), Some("R1".to_string()));

        store.clear_pair();
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);
        assert_eq!(store.get(REFRESH_TOKEN_KEY), None);
    }

    #[test]
    fn test_sqlite_store_roundtrip() {
        let store = SqliteStore::open(Path::new(":memory:")).unwrap();

        store.put_pair("T1", "R1");
        assert_eq!(store.get(ACCESS_TOKEN_KEY), Some("T1".to_string()));
        assert_eq!(store.get(REFRESH_TOKEN_KEY), Some("R1".to_string()));

        store.put_pair("T2", "R2");
        assert_eq!(store.get(ACCESS_TOKEN_KEY), Some("T2".to_string()));

        store.clear_pair();
        assert_eq!(store.get(ACCESS_TOKEN_KEY), None);
    }

    #[test]
    fn test_sqlite_store_survives_reopen() {
        let dir = std::env::temp_dir().join(format!("chokai-store-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("credentials.db");

        {
            let store = SqliteStore::open(&path).unwrap();
            store.put_pair("T1", "R1");
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY), Some("T1".to_string()));
        assert_eq!(store.get(REFRESH_TOKEN_KEY), Some("R1".to_string()));

        std::fs::remove_dir_all(&dir).ok();
    }
}
