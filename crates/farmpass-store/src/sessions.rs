use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use farmpass_shared::{Session, SessionDomain};

use crate::database::Database;
use crate::error::Result;

/// Persistence port for authentication sessions, one slot per domain.
///
/// Implementations must only ever touch `domain.storage_key()` for a given
/// domain, so the customer and restaurant sessions never clobber each other.
pub trait SessionStore {
    /// Missing, corrupt or partial state is `None`; never an error.
    fn load(&self, domain: SessionDomain) -> Option<Session>;

    /// Single write; replaces any prior session for this domain only.
    fn save(&mut self, session: &Session) -> Result<()>;

    fn clear(&mut self, domain: SessionDomain) -> Result<()>;
}

impl Database {
    /// Raw stored record under `key`, exactly as written.
    pub fn raw_session(&self, key: &str) -> Result<Option<String>> {
        let record = self
            .conn()
            .query_row(
                "SELECT record FROM sessions WHERE storage_key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(record)
    }

    fn write_session(&self, key: &str, record: &str) -> Result<()> {
        self.conn().execute(
            "INSERT OR REPLACE INTO sessions (storage_key, record, updated_at)
             VALUES (?1, ?2, ?3)",
            params![key, record, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }
}

impl SessionStore for Database {
    fn load(&self, domain: SessionDomain) -> Option<Session> {
        let raw = match self.raw_session(domain.storage_key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(%domain, error = %e, "failed to read stored session");
                return None;
            }
        };

        let session = Session::from_record(domain, &raw);
        if session.is_none() {
            tracing::warn!(%domain, "stored session is corrupt or partial, ignoring");
        }
        session
    }

    fn save(&mut self, session: &Session) -> Result<()> {
        let record = session.to_record()?;
        self.write_session(session.domain.storage_key(), &record)?;
        tracing::debug!(domain = %session.domain, "session saved");
        Ok(())
    }

    fn clear(&mut self, domain: SessionDomain) -> Result<()> {
        self.conn().execute(
            "DELETE FROM sessions WHERE storage_key = ?1",
            params![domain.storage_key()],
        )?;
        tracing::debug!(%domain, "session cleared");
        Ok(())
    }
}
