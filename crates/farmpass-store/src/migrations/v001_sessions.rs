//! v001: session slots.

use rusqlite::Connection;

/// One row per authentication domain, keyed by its storage key. `record`
/// holds the `{user, token}` JSON as written.
pub fn up(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
             storage_key TEXT PRIMARY KEY NOT NULL,
             record      TEXT NOT NULL,
             updated_at  TEXT NOT NULL
         );",
    )
}
