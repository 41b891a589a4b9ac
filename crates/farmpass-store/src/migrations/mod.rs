//! Schema versioning through `PRAGMA user_version`.

mod v001_sessions;

use rusqlite::Connection;

use crate::error::{Result, StoreError};

type Step = fn(&Connection) -> rusqlite::Result<()>;

/// Ordered; entry `n` upgrades the schema to version `n + 1`.
const STEPS: &[(&str, Step)] = &[("v001_sessions", v001_sessions::up)];

pub fn schema_version() -> u32 {
    STEPS.len() as u32
}

/// Apply every step newer than the stored version, each in its own
/// transaction together with its version bump.
pub fn run_migrations(conn: &mut Connection) -> Result<()> {
    let stored: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let target = schema_version();

    if stored > target {
        return Err(StoreError::SchemaTooNew {
            found: stored,
            supported: target,
        });
    }

    for (index, (name, up)) in STEPS.iter().enumerate().skip(stored as usize) {
        let version = index as u32 + 1;
        tracing::info!(migration = *name, version, "applying migration");

        let tx = conn.transaction()?;
        up(&tx).map_err(|e| StoreError::Migration(format!("{name}: {e}")))?;
        tx.pragma_update(None, "user_version", version)?;
        tx.commit()?;
    }
    Ok(())
}
