//! Durable key-value storage for the login session.
//!
//! The session only ever needs get/set/delete by key, so the auth code talks
//! to the [`SessionStore`] trait and can run against [`MemoryStore`] in tests
//! and [`SqliteStore`] on disk.

use crate::error::Result;
use log::{debug, trace};
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;

/// Key of the PKCE code verifier (present only while a login is pending)
pub const CODE_VERIFIER: &str = "code_verifier";
pub const ACCESS_TOKEN: &str = "access_token";
pub const REFRESH_TOKEN: &str = "refresh_token";

/// Get/set/delete string values by key.
pub trait SessionStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn delete(&mut self, key: &str) -> Result<()>;
}

/// Process-local store. Forgets everything on exit.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

/// SQLite-backed store that survives restarts.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the session database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        debug!("Opening session store at {}", path.display());
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// In-memory SQLite database, mostly useful in tests.
    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS session (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }
}

impl SessionStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM session WHERE key = ?1", [key], |row| row.get(0))
            .optional()?;
        trace!("session get '{key}': {}", if value.is_some() { "hit" } else { "miss" });
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO session (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            [key, value],
        )?;
        trace!("session set '{key}'");
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM session WHERE key = ?1", [key])?;
        trace!("session delete '{key}'");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(store: &mut dyn SessionStore) -> Result<()> {
        assert_eq!(store.get(ACCESS_TOKEN)?, None);

        store.set(ACCESS_TOKEN, "first")?;
        store.set(ACCESS_TOKEN, "second")?;
        assert_eq!(store.get(ACCESS_TOKEN)?.as_deref(), Some("second"));

        store.delete(ACCESS_TOKEN)?;
        assert_eq!(store.get(ACCESS_TOKEN)?, None);

        // Deleting a missing key is fine
        store.delete(REFRESH_TOKEN)?;
        Ok(())
    }

    #[test]
    fn test_memory_store() -> Result<()> {
        exercise(&mut MemoryStore::new())
    }

    #[test]
    fn test_sqlite_store_in_memory() -> Result<()> {
        exercise(&mut SqliteStore::open_in_memory()?)
    }

    #[test]
    fn test_sqlite_store_survives_reopen() -> Result<()> {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let path = temp_dir.path().join("session.db");

        {
            let mut store = SqliteStore::open(&path)?;
            store.set(CODE_VERIFIER, "verifier-123")?;
        }

        let store = SqliteStore::open(&path)?;
        assert_eq!(store.get(CODE_VERIFIER)?.as_deref(), Some("verifier-123"));
        Ok(())
    }
}
