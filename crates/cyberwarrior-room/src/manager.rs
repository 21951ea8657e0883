//! Room registry: creates, finds and removes rooms.

use std::collections::BTreeMap;
use std::sync::Arc;

use cyberwarrior_catalog::CardCatalog;
use cyberwarrior_protocol::RoomId;
use cyberwarrior_session::SessionRef;

use crate::room::spawn_room;
use crate::{RoomConfig, RoomError, RoomHandle};

/// Every live room, keyed by id.
///
/// Not thread-safe by itself; the [`ActionRouter`](crate::ActionRouter)
/// keeps it behind its own mutex, separate from any room's actor, so
/// creating or looking up a room never waits on an unrelated game.
#[derive(Debug)]
pub struct RoomRegistry {
    /// Ordered so listings come out in id order.
    rooms: BTreeMap<RoomId, RoomHandle>,
    /// Next id to hand out. Ids are never reused.
    next_id: u64,
}

impl RoomRegistry {
    /// Creates an empty registry. The first room gets id 1.
    pub fn new() -> Self {
        Self {
            rooms: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Allocates an id and spawns a WAITING room with `host` seated.
    ///
    /// # Errors
    /// Returns [`RoomError::AlreadyInRoom`] if the host already occupies a
    /// room. No id is consumed in that case.
    pub fn create_room(
        &mut self,
        name: impl Into<String>,
        host: &SessionRef,
        catalog: Arc<CardCatalog>,
        config: RoomConfig,
    ) -> Result<RoomHandle, RoomError> {
        let room_id = RoomId(self.next_id);
        if !host.try_enter(room_id) {
            let current = host.room().unwrap_or(room_id);
            return Err(RoomError::AlreadyInRoom(host.id(), current));
        }
        self.next_id += 1;

        let name = name.into();
        tracing::info!(%room_id, name = %name, host = %host.id(), "room created");
        let handle = spawn_room(room_id, name, Arc::clone(host), catalog, config);
        self.rooms.insert(room_id, handle.clone());
        Ok(handle)
    }

    /// Looks up a room. An absent id is a normal miss.
    pub fn get(&self, room_id: RoomId) -> Option<RoomHandle> {
        self.rooms.get(&room_id).cloned()
    }

    /// Drops a room from the registry and returns its handle so the caller
    /// can shut the actor down outside the registry lock. Removing an
    /// absent id is a no-op.
    pub fn remove(&mut self, room_id: RoomId) -> Option<RoomHandle> {
        let handle = self.rooms.remove(&room_id);
        if handle.is_some() {
            tracing::info!(%room_id, "room removed");
        }
        handle
    }

    /// Returns cloned handles to every room, in id order.
    ///
    /// Callers use these to query rooms without holding the registry lock.
    pub fn handles(&self) -> Vec<RoomHandle> {
        self.rooms.values().cloned().collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}
