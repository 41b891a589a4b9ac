use std::collections::HashMap;

use farmpass_shared::{Session, SessionDomain};

use crate::error::Result;
use crate::sessions::SessionStore;

/// Session store kept in process memory. Records are held in their
/// serialized form so it behaves like the on-disk store byte for byte.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    records: HashMap<String, String>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self, key: &str) -> Option<&str> {
        self.records.get(key).map(String::as_str)
    }

    /// Seed a raw record, bypassing validation.
    pub fn insert_raw(&mut self, key: &str, record: &str) {
        self.records.insert(key.to_string(), record.to_string());
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, domain: SessionDomain) -> Option<Session> {
        self.raw(domain.storage_key())
            .and_then(|raw| Session::from_record(domain, raw))
    }

    fn save(&mut self, session: &Session) -> Result<()> {
        let record = session.to_record()?;
        self.records
            .insert(session.domain.storage_key().to_string(), record);
        Ok(())
    }

    fn clear(&mut self, domain: SessionDomain) -> Result<()> {
        self.records.remove(domain.storage_key());
        Ok(())
    }
}
