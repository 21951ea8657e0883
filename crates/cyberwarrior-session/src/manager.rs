//! The session manager: tracks every signed-in connection.
//!
//! `SessionManager` is NOT thread-safe by itself. The server keeps it
//! behind a `tokio::sync::Mutex` and only holds the lock for a single
//! insert or remove.

use std::collections::HashMap;
use std::sync::Arc;

use cyberwarrior_protocol::SessionId;

use crate::{EventSender, Session, SessionError, SessionRef};

/// Registry of live sessions, keyed by id.
///
/// ```text
/// signin ──→ create() ──→ [live] ──→ disconnect() ──→ (gone)
/// ```
///
/// `disconnect` succeeds at most once per session. The server relies on
/// that to turn a dropped connection into exactly one synthetic leave.
#[derive(Debug)]
pub struct SessionManager {
    sessions: HashMap<SessionId, SessionRef>,
    next_id: u64,
}

impl SessionManager {
    pub fn new() -> Self {
        Self {
            sessions: HashMap::new(),
            next_id: 1,
        }
    }

    /// Creates a session with a fresh id. Names may collide.
    pub fn create(&mut self, name: impl Into<String>, outbound: EventSender) -> SessionRef {
        let id = SessionId(self.next_id);
        self.next_id += 1;

        let session = Arc::new(Session::new(id, name, outbound));
        self.sessions.insert(id, Arc::clone(&session));

        tracing::info!(session_id = %id, name = session.name(), "session created");
        session
    }

    /// Removes a session and hands it back to the caller for cleanup.
    ///
    /// # Errors
    /// Returns [`SessionError::NotFound`] if the session was never created
    /// or was already disconnected.
    pub fn disconnect(&mut self, id: SessionId) -> Result<SessionRef, SessionError> {
        let session = self
            .sessions
            .remove(&id)
            .ok_or(SessionError::NotFound(id))?;
        tracing::info!(session_id = %id, "session disconnected");
        Ok(session)
    }

    pub fn get(&self, id: SessionId) -> Option<&SessionRef> {
        self.sessions.get(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}
