use rusqlite::{Connection, OpenFlags};
use std::path::Path;
use std::time::Duration;
use anyhow::{Context, Result};
use crate::db::migrations::MigrationManager;

/// How long a connection waits on a lock held by the other process
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Database connection manager
pub struct DbConnection;

impl DbConnection {
    /// Connect to the database, creating it and parent directories if needed
    pub fn connect(db_path: &Path) -> Result<Connection> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let conn = Connection::open(db_path)
            .with_context(|| format!("Failed to open database: {}", db_path.display()))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Failed to configure database busy timeout")?;

        // Initialize schema
        MigrationManager::initialize(&conn)
            .context("Failed to initialize database schema")?;

        Ok(conn)
    }

    /// Open an existing database without write access.
    /// Never creates the file and never migrates the schema.
    pub fn open_read_only(db_path: &Path) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open database read-only: {}", db_path.display()))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Failed to configure database busy timeout")?;
        Ok(conn)
    }

    /// Connect to an in-memory database (for testing)
    pub fn connect_in_memory() -> Result<Connection> {
        let conn = Connection::open_in_memory()
            .context("Failed to open in-memory database")?;

        MigrationManager::initialize(&conn)
            .context("Failed to initialize database schema")?;

        Ok(conn)
    }
}
