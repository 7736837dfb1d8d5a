use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use super::lock;
use crate::db::queries;
use crate::models::Session;

/// Per-user session table. Writes are whole-record upserts; the last one wins.
pub trait SessionStore: Send + Sync {
    /// Loads the session for `user_id`, or a fresh MENU session on first contact.
    fn get(&self, user_id: &str) -> anyhow::Result<Session>;
    fn put(&self, session: &Session) -> anyhow::Result<()>;
    fn reset(&self, user_id: &str) -> anyhow::Result<()> {
        self.put(&Session::new(user_id))
    }
}

#[derive(Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, user_id: &str) -> anyhow::Result<Session> {
        let sessions = lock(&self.sessions)?;
        Ok(sessions
            .get(user_id)
            .cloned()
            .unwrap_or_else(|| Session::new(user_id)))
    }

    fn put(&self, session: &Session) -> anyhow::Result<()> {
        lock(&self.sessions)?.insert(session.id.clone(), session.clone());
        Ok(())
    }
}

pub struct SqliteSessionStore {
    db: Arc<Mutex<Connection>>,
}

impl SqliteSessionStore {
    pub fn new(db: Arc<Mutex<Connection>>) -> Self {
        Self { db }
    }
}

impl SessionStore for SqliteSessionStore {
    fn get(&self, user_id: &str) -> anyhow::Result<Session> {
        let db = lock(&self.db)?;
        Ok(queries::get_session(&db, user_id)?.unwrap_or_else(|| Session::new(user_id)))
    }

    fn put(&self, session: &Session) -> anyhow::Result<()> {
        let db = lock(&self.db)?;
        queries::save_session(&db, session)
    }

    fn reset(&self, user_id: &str) -> anyhow::Result<()> {
        let db = lock(&self.db)?;
        queries::delete_session(&db, user_id)?;
        Ok(())
    }
}
