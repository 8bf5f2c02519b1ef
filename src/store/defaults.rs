use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use std::sync::{Mutex, MutexGuard};

/// Keyed blob storage shared between processes (the `kv` table)
pub struct SharedDefaults {
    conn: Mutex<Connection>,
}

impl SharedDefaults {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|err| err.into_inner())
    }

    /// Value stored under `key`, if any
    pub fn data(&self, key: &str) -> rusqlite::Result<Option<Vec<u8>>> {
        self.conn()
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
    }

    /// Replace the value under `key` in a single statement
    pub fn set(&self, key: &str, value: &[u8]) -> rusqlite::Result<()> {
        self.conn().execute(
            "INSERT INTO kv (key, value, modified_ts) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, modified_ts = excluded.modified_ts",
            rusqlite::params![key, value, Utc::now().timestamp()],
        )?;
        Ok(())
    }
}
