use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use super::{Backend, StoreError};

/// Get the database path (~/.local/share/galdiff/galdiff.db or platform equivalent)
pub fn default_db_path() -> Result<PathBuf, StoreError> {
    let data_dir = directories::ProjectDirs::from("", "", "galdiff")
        .ok_or(StoreError::NoDataDir)?
        .data_dir()
        .to_path_buf();

    Ok(data_dir.join("galdiff.db"))
}

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS records (
            storage_key TEXT PRIMARY KEY NOT NULL,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        )",
        [],
    )?;

    Ok(())
}

/// Database handle. Open once per command, reuse across all operations.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open (creating if needed) the database at `path`.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        init_schema(&conn)?;
        Ok(SqliteBackend { conn })
    }

    pub fn open_default() -> Result<Self, StoreError> {
        Self::open(&default_db_path()?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        init_schema(&conn)?;
        Ok(SqliteBackend { conn })
    }
}

impl Backend for SqliteBackend {
    fn get(&self, storage_key: &str) -> Result<Option<String>, StoreError> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM records WHERE storage_key = ?1",
                params![storage_key],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    fn put(&mut self, storage_key: &str, value: &str) -> Result<(), StoreError> {
        let updated_at = chrono::Utc::now().timestamp_millis();

        self.conn.execute(
            "INSERT INTO records (storage_key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(storage_key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![storage_key, value, updated_at],
        )?;

        Ok(())
    }

    fn remove(&mut self, storage_key: &str) -> Result<(), StoreError> {
        self.conn.execute(
            "DELETE FROM records WHERE storage_key = ?1",
            params![storage_key],
        )?;

        Ok(())
    }
}
