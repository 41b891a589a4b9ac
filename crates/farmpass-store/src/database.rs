//! SQLite handle. Every constructor leaves the schema at the current
//! version before returning.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use rusqlite::Connection;

use crate::error::{Result, StoreError};
use crate::migrations;

const DB_FILE: &str = "farmpass.db";

pub struct Database {
    conn: Connection,
}

impl Database {
    /// `farmpass.db` in the platform data directory, e.g.
    /// `~/.local/share/farmpass/farmpass.db` on Linux.
    pub fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("com", "farmpass", "farmpass").ok_or(StoreError::NoDataDir)?;
        Self::open_at(&dirs.data_dir().join(DB_FILE))
    }

    /// Creates missing parent directories. Several handles may share one
    /// file; the journal runs in WAL mode.
    pub fn open_at(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        tracing::info!(path = %path.display(), "opening session database");

        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(std::time::Duration::from_secs(2))?;
        Self::prepare(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(mut conn: Connection) -> Result<Self> {
        migrations::run_migrations(&mut conn)?;
        Ok(Self { conn })
    }

    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Backing file, `None` for an in-memory database.
    pub fn path(&self) -> Option<PathBuf> {
        self.conn.path().filter(|p| !p.is_empty()).map(PathBuf::from)
    }
}
