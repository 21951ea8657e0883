//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel. Commands are handled one at a time, so every
//! validate → mutate → broadcast sequence is atomic for that room while
//! other rooms run independently.

use std::collections::HashMap;
use std::sync::Arc;

use cyberwarrior_catalog::CardCatalog;
use cyberwarrior_protocol::{
    CardId, JoinNotice, Outcome, PlayRequest, Recipient, RoomId, Scores, ServerEvent, SessionId,
};
use cyberwarrior_session::SessionRef;
use tokio::sync::{mpsc, oneshot};

use crate::game::{MAX_PLAYERS, Outbox, Room, rejection};
use crate::{RoomConfig, RoomError, RoomState};

/// Commands sent to a room actor through its channel.
///
/// The `oneshot::Sender` in some variants is a reply channel: the caller
/// sends a command and waits for the response on it.
#[derive(Debug)]
pub(crate) enum RoomCommand {
    /// Add a player to the room.
    Join {
        session: SessionRef,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a player, closing the room if the closure rule says so.
    Leave {
        session_id: SessionId,
        reply: oneshot::Sender<Result<LeaveOutcome, RoomError>>,
    },

    /// Host asks to deal and begin.
    Start { session_id: SessionId },

    /// An in-game action.
    Play {
        session_id: SessionId,
        request: PlayRequest,
    },

    /// Request a snapshot of the room.
    GetInfo { reply: oneshot::Sender<RoomInfo> },

    /// Shut down the room.
    Shutdown,
}

/// What a completed leave did to the room.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// The room closed and its actor has stopped.
    pub closed: bool,
}

/// A snapshot of a room's state.
#[derive(Debug, Clone)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub name: String,
    pub state: RoomState,
    /// Members in join order.
    pub players: Vec<SessionId>,
    pub max_players: usize,
    pub turn_index: usize,
    pub discard: Option<CardId>,
    pub hands: HashMap<SessionId, Vec<CardId>>,
    pub scores: HashMap<SessionId, Scores>,
}

impl RoomInfo {
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }
}

/// Handle to a running room actor. Used to send commands to it.
///
/// Cheap to clone: it's just an `mpsc::Sender` wrapper. The
/// `RoomRegistry` holds one of these per room.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// Returns the room's unique ID.
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// Seats `session` in the room and broadcasts the new roster.
    ///
    /// The session's room slot is claimed inside the actor, so a session
    /// already in another room is rejected with `AlreadyInRoom`.
    pub async fn join(&self, session: SessionRef) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                session,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::NotFound(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::NotFound(self.room_id))?
    }

    /// Removes a player and delivers the leave notices.
    pub async fn leave(&self, session_id: SessionId) -> Result<LeaveOutcome, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave {
                session_id,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::NotFound(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::NotFound(self.room_id))?
    }

    /// Asks the room to start (fire-and-forget).
    pub async fn start(&self, session_id: SessionId) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Start { session_id })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Sends an in-game action to the room (fire-and-forget).
    pub async fn play(
        &self,
        session_id: SessionId,
        request: PlayRequest,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Play {
                session_id,
                request,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Requests a snapshot of the room.
    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room: Room,
    /// Members plus, briefly, anyone being sent a farewell.
    sessions: HashMap<SessionId, SessionRef>,
    catalog: Arc<CardCatalog>,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Runs the actor loop, processing commands until the room closes.
    async fn run(mut self) {
        let room_id = self.room.id();
        tracing::debug!(%room_id, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join { session, reply } => {
                    let result = self.handle_join(session);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { session_id, reply } => {
                    let result = self.handle_leave(session_id);
                    let closed = matches!(result, Ok(LeaveOutcome { closed: true }));
                    let _ = reply.send(result);
                    if closed {
                        break;
                    }
                }
                RoomCommand::Start { session_id } => {
                    self.handle_start(session_id);
                }
                RoomCommand::Play {
                    session_id,
                    request,
                } => {
                    self.handle_play(session_id, request);
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(%room_id, "room shutting down");
                    break;
                }
            }
        }

        tracing::debug!(%room_id, "room actor stopped");
    }

    fn handle_join(&mut self, session: SessionRef) -> Result<(), RoomError> {
        let room_id = self.room.id();
        let session_id = session.id();

        if !session.try_enter(room_id) {
            let current = session.room().unwrap_or(room_id);
            return Err(RoomError::AlreadyInRoom(session_id, current));
        }
        if let Err(e) = self.room.join(session_id, session.name()) {
            session.leave_room(room_id);
            return Err(e);
        }

        tracing::info!(
            %room_id,
            %session_id,
            players = self.room.players().len(),
            "player joined"
        );

        let notice = ServerEvent::Join(Outcome::accepted(JoinNotice {
            player_join: session.name().to_owned(),
            roster: self.room.roster(),
        }));
        self.sessions.insert(session_id, session);
        self.dispatch(vec![(Recipient::All, notice)]);
        Ok(())
    }

    fn handle_leave(&mut self, session_id: SessionId) -> Result<LeaveOutcome, RoomError> {
        let room_id = self.room.id();
        let departure = self.room.leave(session_id)?;

        tracing::info!(
            %room_id,
            %session_id,
            players = self.room.players().len(),
            "player left"
        );

        // Clear room slots before any notice goes out, so a client that
        // reacts to its farewell is already free to join elsewhere.
        for id in std::iter::once(session_id).chain(departure.evicted.iter().copied()) {
            if let Some(session) = self.sessions.get(&id) {
                session.leave_room(room_id);
            }
        }

        self.dispatch(departure.outbox);

        self.sessions.remove(&session_id);
        for id in &departure.evicted {
            self.sessions.remove(id);
        }

        if departure.closed {
            tracing::info!(%room_id, evicted = departure.evicted.len(), "room closed");
        }
        Ok(LeaveOutcome {
            closed: departure.closed,
        })
    }

    fn handle_start(&mut self, session_id: SessionId) {
        let room_id = self.room.id();
        match self.room.start(session_id, &self.catalog) {
            Ok(outbox) => {
                tracing::info!(%room_id, players = self.room.players().len(), "game started");
                self.dispatch(outbox);
            }
            Err(reason) => {
                tracing::debug!(%room_id, %session_id, %reason, "start ignored");
            }
        }
    }

    fn handle_play(&mut self, session_id: SessionId, request: PlayRequest) {
        let room_id = self.room.id();
        if !self.room.is_member(session_id) {
            tracing::debug!(%room_id, %session_id, "play from non-member");
            self.reject(session_id, &request);
            return;
        }

        match self.room.play(session_id, request, &self.catalog) {
            Ok(outbox) => self.dispatch(outbox),
            Err(reason) if reason.is_silent() => {
                tracing::debug!(%room_id, %session_id, %reason, "play dropped");
            }
            Err(reason) => {
                tracing::debug!(%room_id, %session_id, %reason, "play rejected");
                self.reject(session_id, &request);
            }
        }
    }

    fn reject(&self, session_id: SessionId, request: &PlayRequest) {
        self.send_to(session_id, rejection(request));
    }

    /// Dispatches outbound events to the correct recipients.
    fn dispatch(&self, outbox: Outbox) {
        for (recipient, event) in outbox {
            match recipient {
                Recipient::All => {
                    for id in self.room.players() {
                        self.send_to(*id, event.clone());
                    }
                }
                Recipient::Player(id) => self.send_to(id, event),
            }
        }
    }

    /// Sends an event to a single session. Silently dropped if the
    /// session's connection is gone.
    fn send_to(&self, session_id: SessionId, event: ServerEvent) {
        if let Some(session) = self.sessions.get(&session_id) {
            session.send(event);
        }
    }

    fn info(&self) -> RoomInfo {
        let room = &self.room;
        let players = room.players().to_vec();
        RoomInfo {
            room_id: room.id(),
            name: room.name().to_owned(),
            state: room.state(),
            max_players: MAX_PLAYERS,
            turn_index: room.turn_index(),
            discard: room.discard().map(|card| card.id),
            hands: players
                .iter()
                .filter_map(|id| room.hand(*id).map(|hand| (*id, hand.to_vec())))
                .collect(),
            scores: players
                .iter()
                .filter_map(|id| room.scores(*id).map(|scores| (*id, scores)))
                .collect(),
            players,
        }
    }
}

/// Spawns a room actor with `host` already seated and returns its handle.
///
/// The caller must already have claimed the host's room slot.
/// `config.channel_size` bounds the command queue; when it is full,
/// senders wait.
pub(crate) fn spawn_room(
    room_id: RoomId,
    name: String,
    host: SessionRef,
    catalog: Arc<CardCatalog>,
    config: RoomConfig,
) -> RoomHandle {
    let (tx, rx) = mpsc::channel(config.channel_size.max(1));

    let room = Room::new(room_id, name, host.id(), host.name(), config);
    let mut sessions = HashMap::new();
    sessions.insert(host.id(), host);

    let actor = RoomActor {
        room,
        sessions,
        catalog,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        sender: tx,
    }
}
