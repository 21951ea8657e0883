//! Session: the server's record of one signed-in connection.
//!
//! A session tracks:
//! - WHO the player is (`SessionId` and display name)
//! - WHERE to send events (a bounded outbound channel drained by the
//!   connection's writer task)
//! - WHICH room they occupy, if any

use std::sync::{Arc, Mutex, PoisonError};

use cyberwarrior_protocol::{RoomId, ServerEvent, SessionId};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

/// Outbound half of a session's event queue.
pub type EventSender = mpsc::Sender<ServerEvent>;

/// Events a session may have queued before new ones are dropped.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 256;

/// Sessions are shared between the connection task, the router and every
/// room actor the player passes through.
pub type SessionRef = Arc<Session>;

#[derive(Debug)]
pub struct Session {
    id: SessionId,
    name: String,
    /// The room slot. A session is in at most one room at a time.
    ///
    /// A plain `std` mutex: it is only held for a load or a swap, never
    /// across an `.await`.
    room: Mutex<Option<RoomId>>,
    outbound: EventSender,
}

impl Session {
    pub fn new(id: SessionId, name: impl Into<String>, outbound: EventSender) -> Self {
        Self {
            id,
            name: name.into(),
            room: Mutex::new(None),
            outbound,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Display name. Not unique.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The room this session currently occupies.
    pub fn room(&self) -> Option<RoomId> {
        *self.room.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claims the room slot for `room_id`. Returns false if the session is
    /// already in a room.
    pub fn try_enter(&self, room_id: RoomId) -> bool {
        let mut slot = self.room.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }
        *slot = Some(room_id);
        true
    }

    /// Clears the room slot, but only if it still points at `room_id`.
    pub fn leave_room(&self, room_id: RoomId) {
        let mut slot = self.room.lock().unwrap_or_else(PoisonError::into_inner);
        if *slot == Some(room_id) {
            *slot = None;
        }
    }

    /// Queues an event for delivery. Fire-and-forget: never waits. If the
    /// connection is gone, or its queue is full because the client stopped
    /// reading, the event is dropped.
    pub fn send(&self, event: ServerEvent) {
        match self.outbound.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                tracing::warn!(session_id = %self.id, "outbound queue full, dropping event");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::trace!(session_id = %self.id, "dropping event for closed connection");
            }
        }
    }
}
