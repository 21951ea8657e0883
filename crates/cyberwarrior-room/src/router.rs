//! Action router: turns decoded client events into room operations.
//!
//! ```text
//! connection ──ClientEvent──→ ActionRouter ──RoomCommand──→ room actor
//!                                  │
//!                                  └── RoomRegistry (own mutex)
//! ```
//!
//! The registry lock is only held to create, look up or remove a room.
//! Everything that touches a room's state goes through that room's actor.

use std::sync::Arc;

use cyberwarrior_catalog::CardCatalog;
use cyberwarrior_protocol::{
    ClientEvent, Outcome, PlayRequest, RoomCreated, RoomId, RoomSummary, ServerEvent,
};
use cyberwarrior_session::SessionRef;
use tokio::sync::Mutex;

use crate::game::rejection;
use crate::{LeaveOutcome, RoomConfig, RoomError, RoomHandle, RoomRegistry};

/// Dispatches client events for every session on the server.
#[derive(Debug)]
pub struct ActionRouter {
    rooms: Mutex<RoomRegistry>,
    catalog: Arc<CardCatalog>,
    config: RoomConfig,
}

impl ActionRouter {
    pub fn new(catalog: Arc<CardCatalog>, config: RoomConfig) -> Self {
        Self {
            rooms: Mutex::new(RoomRegistry::new()),
            catalog,
            config,
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Handle to a live room, if it exists.
    pub async fn room(&self, room_id: RoomId) -> Option<RoomHandle> {
        self.rooms.lock().await.get(room_id)
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.room_count()
    }

    /// Handles one event from a signed-in session.
    pub async fn dispatch(&self, session: &SessionRef, event: ClientEvent) {
        match event {
            ClientEvent::Signin { .. } => {
                tracing::debug!(session_id = %session.id(), "signin reached router, ignoring");
            }
            ClientEvent::Create { game_name } => self.create(session, game_name).await,
            ClientEvent::Search => self.search(session).await,
            ClientEvent::Join { game_id } => self.join(session, game_id).await,
            ClientEvent::Leave => self.leave(session).await,
            ClientEvent::Start => self.start(session).await,
            ClientEvent::Play(request) => self.play(session, request).await,
        }
    }

    /// Synthetic leave for a dropped connection.
    ///
    /// The caller guarantees this runs at most once per session.
    pub async fn disconnect(&self, session: &SessionRef) {
        if session.room().is_some() {
            self.leave(session).await;
        }
    }

    async fn create(&self, session: &SessionRef, game_name: Option<String>) {
        let session_id = session.id();
        let Some(game_name) = game_name else {
            tracing::debug!(%session_id, "create without gameName, dropping");
            return;
        };

        let created = self.rooms.lock().await.create_room(
            game_name.clone(),
            session,
            Arc::clone(&self.catalog),
            self.config.clone(),
        );
        match created {
            Ok(handle) => session.send(ServerEvent::Create(Outcome::accepted(RoomCreated {
                game_id: handle.room_id(),
                game_name,
            }))),
            Err(reason) => {
                tracing::debug!(%session_id, %reason, "create rejected");
                session.send(ServerEvent::Create(Outcome::rejected()));
            }
        }
    }

    async fn search(&self, session: &SessionRef) {
        let handles = self.rooms.lock().await.handles();

        let mut rooms = Vec::with_capacity(handles.len());
        for handle in handles {
            // A room that closed since the snapshot no longer answers.
            if let Ok(info) = handle.get_info().await {
                rooms.push(RoomSummary {
                    game_id: info.room_id,
                    game_name: info.name.clone(),
                    player_count: info.player_count(),
                    is_full: info.is_full(),
                });
            }
        }
        session.send(ServerEvent::Search {
            result: true,
            rooms,
        });
    }

    async fn join(&self, session: &SessionRef, game_id: Option<RoomId>) {
        let session_id = session.id();
        let Some(room_id) = game_id else {
            tracing::debug!(%session_id, "join without gameId, dropping");
            return;
        };
        if let Some(current) = session.room() {
            tracing::debug!(%session_id, %current, "join while already in a room");
            session.send(ServerEvent::Join(Outcome::rejected()));
            return;
        }

        let handle = self.rooms.lock().await.get(room_id);
        let result = match handle {
            Some(handle) => handle.join(Arc::clone(session)).await,
            None => Err(RoomError::NotFound(room_id)),
        };
        if let Err(reason) = result {
            tracing::debug!(%session_id, %room_id, %reason, "join rejected");
            session.send(ServerEvent::Join(Outcome::rejected()));
        }
    }

    async fn leave(&self, session: &SessionRef) {
        let session_id = session.id();
        let room_id = match current_room(session) {
            Ok(room_id) => room_id,
            Err(reason) => {
                tracing::debug!(%session_id, %reason, "leave rejected");
                session.send(ServerEvent::Leave(Outcome::rejected()));
                return;
            }
        };

        let handle = self.rooms.lock().await.get(room_id);
        let result = match handle {
            Some(handle) => handle.leave(session_id).await,
            None => Err(RoomError::NotFound(room_id)),
        };
        match result {
            Ok(LeaveOutcome { closed: true }) => self.close_room(room_id).await,
            Ok(LeaveOutcome { closed: false }) => {}
            Err(reason) => {
                tracing::debug!(%session_id, %room_id, %reason, "leave on stale room");
                session.leave_room(room_id);
                session.send(ServerEvent::Leave(Outcome::rejected()));
            }
        }
    }

    async fn start(&self, session: &SessionRef) {
        let session_id = session.id();
        let room_id = match current_room(session) {
            Ok(room_id) => room_id,
            Err(reason) => {
                tracing::debug!(%session_id, %reason, "start ignored");
                return;
            }
        };
        let handle = self.rooms.lock().await.get(room_id);
        match handle {
            Some(handle) => {
                if let Err(reason) = handle.start(session_id).await {
                    tracing::debug!(%session_id, %room_id, %reason, "start not delivered");
                }
            }
            None => tracing::debug!(%session_id, %room_id, "start on stale room"),
        }
    }

    async fn play(&self, session: &SessionRef, request: PlayRequest) {
        let session_id = session.id();
        let room_id = match current_room(session) {
            Ok(room_id) => room_id,
            Err(reason) => {
                tracing::debug!(%session_id, %reason, "play rejected");
                session.send(rejection(&request));
                return;
            }
        };

        let handle = self.rooms.lock().await.get(room_id);
        let delivered = match handle {
            Some(handle) => handle.play(session_id, request).await,
            None => Err(RoomError::NotFound(room_id)),
        };
        if let Err(reason) = delivered {
            tracing::debug!(%session_id, %room_id, %reason, "play not delivered");
            session.send(rejection(&request));
        }
    }

    /// Removes a closed room from the registry. A no-op if it is already
    /// gone.
    async fn close_room(&self, room_id: RoomId) {
        let handle = self.rooms.lock().await.remove(room_id);
        if let Some(handle) = handle {
            // The actor stops itself on close; this only covers a room
            // that is somehow still running.
            let _ = handle.shutdown().await;
        }
    }
}

/// The room the session currently occupies.
fn current_room(session: &SessionRef) -> Result<RoomId, RoomError> {
    session.room().ok_or(RoomError::NoRoom(session.id()))
}
