//! The turn state machine for one room.
//!
//! [`Room`] is plain data with synchronous methods: each method validates,
//! mutates and returns the events to deliver, or fails without touching
//! anything. The room actor owns one `Room` and is what makes each call
//! atomic with respect to other requests for the same room.
//!
//! ```text
//! TURN    ── actor attacks ──────────────→ COUNTER
//! TURN    ── actor defends (+1 score) ───→ TURN | END
//! TURN    ── actor skips ────────────────→ TURN
//! COUNTER ── target counters ────────────→ TURN
//! COUNTER ── target skips (±1 scores) ───→ TURN | END
//! ```

use std::collections::HashMap;

use cyberwarrior_catalog::CardCatalog;
use cyberwarrior_protocol::{
    AttackPlayed, Card, CardCategory, CardId, CardType, CounterPlayed, DefendPlayed, LeaveNotice,
    Outcome, PlayEvent, PlayRequest, PlayersScores, Recipient, RoomId, RoomRoster, Scores,
    ServerEvent, SessionId, SkipPlayed,
};

use crate::{RoomConfig, RoomError, RoomState};

/// Seats per room. The turn order alternates between exactly two players.
pub const MAX_PLAYERS: usize = 2;

/// Events produced by one room operation, in delivery order.
pub type Outbox = Vec<(Recipient, ServerEvent)>;

/// A player's hand and score, owned by the room.
#[derive(Debug, Clone)]
struct Seat {
    name: String,
    hand: Vec<CardId>,
    scores: Scores,
}

impl Seat {
    fn new(name: String) -> Self {
        Self {
            name,
            hand: Vec::new(),
            scores: Scores::default(),
        }
    }
}

/// The result of removing a player.
#[derive(Debug)]
pub struct Departure {
    pub outbox: Outbox,
    /// Members removed because the room closed. Does not include the
    /// player who left.
    pub evicted: Vec<SessionId>,
    pub closed: bool,
}

/// Full mutable state of one game.
#[derive(Debug)]
pub struct Room {
    id: RoomId,
    name: String,
    config: RoomConfig,
    state: RoomState,
    host: SessionId,
    host_name: String,
    /// Join order. Never reordered.
    players: Vec<SessionId>,
    /// Exactly one seat per entry in `players`.
    seats: HashMap<SessionId, Seat>,
    turn_index: usize,
    discard: Option<Card>,
}

impl Room {
    /// A new WAITING room with the host as its only member.
    pub fn new(
        id: RoomId,
        name: impl Into<String>,
        host: SessionId,
        host_name: impl Into<String>,
        config: RoomConfig,
    ) -> Self {
        let host_name = host_name.into();
        let mut seats = HashMap::new();
        seats.insert(host, Seat::new(host_name.clone()));
        Self {
            id,
            name: name.into(),
            config,
            state: RoomState::Waiting,
            host,
            host_name,
            players: vec![host],
            seats,
            turn_index: 0,
            discard: None,
        }
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn host(&self) -> SessionId {
        self.host
    }

    pub fn players(&self) -> &[SessionId] {
        &self.players
    }

    pub fn turn_index(&self) -> usize {
        self.turn_index
    }

    pub fn discard(&self) -> Option<&Card> {
        self.discard.as_ref()
    }

    pub fn hand(&self, id: SessionId) -> Option<&[CardId]> {
        self.seats.get(&id).map(|seat| seat.hand.as_slice())
    }

    pub fn scores(&self, id: SessionId) -> Option<Scores> {
        self.seats.get(&id).map(|seat| seat.scores)
    }

    pub fn is_member(&self, id: SessionId) -> bool {
        self.seats.contains_key(&id)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn can_start(&self) -> bool {
        self.players.len() >= 2
    }

    /// Closure rule, evaluated after every leave.
    pub fn should_close(&self) -> bool {
        self.is_empty()
            || (self.state == RoomState::Waiting && !self.players.contains(&self.host))
            || (self.state != RoomState::Waiting && self.players.len() < 2)
    }

    pub fn roster(&self) -> RoomRoster {
        RoomRoster {
            game_id: self.id,
            game_name: self.name.clone(),
            host: self.host_name.clone(),
            players: self.players.iter().map(|id| self.name_of(*id)).collect(),
            is_can_start: self.can_start(),
        }
    }

    /// Scores by display name. On a name collision the later player wins.
    pub fn players_scores(&self) -> PlayersScores {
        self.players
            .iter()
            .filter_map(|id| self.seats.get(id))
            .map(|seat| (seat.name.clone(), seat.scores))
            .collect()
    }

    /// The last player, in join order, whose scores meet the threshold.
    pub fn winner(&self) -> Option<SessionId> {
        let threshold = self.config.win_score_per_category;
        self.players.iter().rev().copied().find(|id| {
            self.seats
                .get(id)
                .is_some_and(|seat| seat.scores.has_won(threshold))
        })
    }

    fn name_of(&self, id: SessionId) -> String {
        self.seats
            .get(&id)
            .map(|seat| seat.name.clone())
            .unwrap_or_default()
    }

    fn acting_player(&self) -> Option<SessionId> {
        self.players.get(self.turn_index).copied()
    }

    fn attack_target(&self) -> Option<SessionId> {
        self.players
            .get((self.turn_index + 1) % MAX_PLAYERS)
            .copied()
    }

    fn advance_turn(&mut self) {
        self.turn_index = (self.turn_index + 1) % MAX_PLAYERS;
    }

    // -----------------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------------

    pub fn join(&mut self, id: SessionId, name: impl Into<String>) -> Result<(), RoomError> {
        if !self.state.is_joinable() {
            return Err(RoomError::InvalidState {
                room_id: self.id,
                state: self.state,
            });
        }
        if self.is_member(id) {
            return Err(RoomError::AlreadyInRoom(id, self.id));
        }
        if self.is_full() {
            return Err(RoomError::RoomFull(self.id));
        }

        self.players.push(id);
        self.seats.insert(id, Seat::new(name.into()));
        Ok(())
    }

    /// Removes `id` and, if the room must close, evicts everyone else.
    ///
    /// Each remaining member gets the updated roster, followed by its own
    /// farewell when the room closes. The leaver's farewell comes last.
    pub fn leave(&mut self, id: SessionId) -> Result<Departure, RoomError> {
        let pos = self
            .players
            .iter()
            .position(|p| *p == id)
            .ok_or(RoomError::NotInRoom(id, self.id))?;
        self.players.remove(pos);
        let leaver = self
            .seats
            .remove(&id)
            .map(|seat| seat.name)
            .unwrap_or_default();

        if pos < self.turn_index {
            self.turn_index -= 1;
        }
        if self.turn_index >= self.players.len() {
            self.turn_index = 0;
        }

        let closed = self.should_close();
        let roster = self.roster();
        let mut outbox = Outbox::new();
        let mut evicted = Vec::new();

        for member in self.players.clone() {
            outbox.push((
                Recipient::Player(member),
                ServerEvent::Leave(Outcome::accepted(LeaveNotice {
                    player_leave: leaver.clone(),
                    roster: Some(roster.clone()),
                })),
            ));
            if closed {
                outbox.push((
                    Recipient::Player(member),
                    ServerEvent::Leave(Outcome::accepted(LeaveNotice {
                        player_leave: self.name_of(member),
                        roster: None,
                    })),
                ));
                evicted.push(member);
            }
        }

        if closed {
            self.players.clear();
            self.seats.clear();
        }

        outbox.push((
            Recipient::Player(id),
            ServerEvent::Leave(Outcome::accepted(LeaveNotice {
                player_leave: leaver,
                roster: None,
            })),
        ));

        Ok(Departure {
            outbox,
            evicted,
            closed,
        })
    }

    // -----------------------------------------------------------------------
    // Game
    // -----------------------------------------------------------------------

    /// Deals every player a fresh hand and hands the first turn to the host.
    pub fn start(
        &mut self,
        requester: SessionId,
        catalog: &CardCatalog,
    ) -> Result<Outbox, RoomError> {
        if requester != self.host || self.players.first() != Some(&requester) {
            return Err(RoomError::NotHost(requester));
        }
        if !self.can_start() {
            return Err(RoomError::NotEnoughPlayers);
        }
        if self.state != RoomState::Waiting {
            return Err(RoomError::InvalidState {
                room_id: self.id,
                state: self.state,
            });
        }

        let mut hands = Vec::with_capacity(self.players.len());
        for id in &self.players {
            let cards: Vec<Card> = (0..self.config.hand_size)
                .map(|_| catalog.draw_random().clone())
                .collect();
            hands.push((*id, cards));
        }

        self.state = RoomState::Turn;
        self.turn_index = 0;
        let first = self.name_of(self.players[0]);

        let mut outbox = Outbox::new();
        for (id, cards) in hands {
            if let Some(seat) = self.seats.get_mut(&id) {
                seat.hand = cards.iter().map(|card| card.id).collect();
            }
            outbox.push((Recipient::Player(id), ServerEvent::Start { result: true }));
            outbox.push((
                Recipient::Player(id),
                ServerEvent::Play(PlayEvent::Draw {
                    result: true,
                    cards,
                }),
            ));
            outbox.push((
                Recipient::Player(id),
                ServerEvent::Play(PlayEvent::Turn {
                    result: true,
                    player_turn: first.clone(),
                }),
            ));
        }
        Ok(outbox)
    }

    /// Applies one in-game action.
    pub fn play(
        &mut self,
        actor: SessionId,
        request: PlayRequest,
        catalog: &CardCatalog,
    ) -> Result<Outbox, RoomError> {
        if self.state == RoomState::End {
            return Err(RoomError::GameOver);
        }
        match request {
            PlayRequest::Attack { card_id } => self.attack(actor, card_id, catalog),
            PlayRequest::Defend { card_id } => self.defend(actor, card_id, catalog),
            PlayRequest::Counter { card_id } => self.counter(actor, card_id, catalog),
            PlayRequest::Skip => self.skip(actor, catalog),
        }
    }

    fn attack(
        &mut self,
        actor: SessionId,
        card_id: Option<CardId>,
        catalog: &CardCatalog,
    ) -> Result<Outbox, RoomError> {
        self.require_acting(actor)?;
        self.require_state(RoomState::Turn)?;
        let card_id = card_id.ok_or(RoomError::MissingField("cardId"))?;
        let card = self.card_in_hand(actor, card_id, catalog)?;
        if card.card_type != CardType::Attack {
            return Err(RoomError::IneligibleCard(card_id));
        }

        let target = self.attack_target().unwrap_or(actor);
        self.remove_from_hand(actor, card_id);
        self.state = RoomState::Counter;
        self.discard = Some(card.clone());

        Ok(vec![(
            Recipient::All,
            ServerEvent::Play(PlayEvent::Attack(Outcome::accepted(AttackPlayed {
                player_attack: self.name_of(actor),
                player_target: self.name_of(target),
                card,
            }))),
        )])
    }

    fn defend(
        &mut self,
        actor: SessionId,
        card_id: Option<CardId>,
        catalog: &CardCatalog,
    ) -> Result<Outbox, RoomError> {
        self.require_acting(actor)?;
        self.require_state(RoomState::Turn)?;
        let card_id = card_id.ok_or(RoomError::MissingField("cardId"))?;
        let card = self.card_in_hand(actor, card_id, catalog)?;
        if card.card_type != CardType::Defend || card.category == CardCategory::Wild {
            return Err(RoomError::IneligibleCard(card_id));
        }

        self.remove_from_hand(actor, card_id);
        self.discard = Some(card.clone());
        self.advance_turn();
        if let Some(seat) = self.seats.get_mut(&actor) {
            seat.scores.add(card.category, 1);
        }

        let winner = self.winner();
        let mut outbox = Outbox::new();
        if winner.is_none() {
            self.state = RoomState::Turn;
            let drawn = self.draw_into(actor, catalog);
            outbox.push(private_draw(actor, drawn));
        } else {
            self.state = RoomState::End;
        }

        outbox.push((
            Recipient::All,
            ServerEvent::Play(PlayEvent::Defend(Outcome::accepted(DefendPlayed {
                player_defend: self.name_of(actor),
                card,
                players_scores: self.players_scores(),
            }))),
        ));
        outbox.push((Recipient::All, self.turn_or_end(winner)));
        Ok(outbox)
    }

    fn counter(
        &mut self,
        actor: SessionId,
        card_id: Option<CardId>,
        catalog: &CardCatalog,
    ) -> Result<Outbox, RoomError> {
        if self.attack_target() != Some(actor) {
            return Err(RoomError::NotYourTurn(actor));
        }
        self.require_state(RoomState::Counter)?;
        let card_id = card_id.ok_or(RoomError::MissingField("cardId"))?;
        let card = self.card_in_hand(actor, card_id, catalog)?;
        let attack = self.discard.clone().ok_or(RoomError::InvalidState {
            room_id: self.id,
            state: self.state,
        })?;
        if card.card_type != CardType::Defend {
            return Err(RoomError::IneligibleCard(card_id));
        }
        if card.category != CardCategory::Wild && card.category != attack.category {
            return Err(RoomError::CategoryMismatch(card_id));
        }
        if !card.shares_sub_category(&attack) {
            return Err(RoomError::SubCategoryMismatch(card_id));
        }

        let mut outbox = Outbox::new();
        if let Some(attacker) = self.acting_player() {
            let drawn = self.draw_into(attacker, catalog);
            outbox.push(private_draw(attacker, drawn));
        }

        self.state = RoomState::Turn;
        self.discard = Some(card.clone());
        self.remove_from_hand(actor, card_id);
        self.advance_turn();

        outbox.push((
            Recipient::All,
            ServerEvent::Play(PlayEvent::Counter(Outcome::accepted(CounterPlayed {
                player_counter: self.name_of(actor),
                card,
                players_scores: self.players_scores(),
            }))),
        ));
        outbox.push((Recipient::All, self.turn_or_end(None)));
        Ok(outbox)
    }

    fn skip(&mut self, actor: SessionId, catalog: &CardCatalog) -> Result<Outbox, RoomError> {
        match self.state {
            RoomState::Turn => {
                self.require_acting(actor)?;
                self.advance_turn();
                let drawn = self.draw_into(actor, catalog);
                Ok(vec![
                    private_draw(actor, drawn),
                    (Recipient::All, self.skip_played(actor)),
                    (Recipient::All, self.turn_or_end(None)),
                ])
            }
            RoomState::Counter => {
                if self.attack_target() != Some(actor) {
                    return Err(RoomError::NotYourTurn(actor));
                }
                let attacker = self.acting_player().unwrap_or(actor);
                let category = self
                    .discard
                    .as_ref()
                    .map(|card| card.category)
                    .ok_or(RoomError::InvalidState {
                        room_id: self.id,
                        state: self.state,
                    })?;

                // A WILD attack carries no score category; both adds are no-ops.
                if let Some(seat) = self.seats.get_mut(&attacker) {
                    seat.scores.add(category, 1);
                }
                if let Some(seat) = self.seats.get_mut(&actor) {
                    seat.scores.add(category, -1);
                }
                self.advance_turn();

                let winner = self.winner();
                let mut outbox = Outbox::new();
                if winner.is_none() {
                    self.state = RoomState::Turn;
                    let drawn = self.draw_into(attacker, catalog);
                    outbox.push(private_draw(attacker, drawn));
                } else {
                    self.state = RoomState::End;
                }
                outbox.push((Recipient::All, self.skip_played(actor)));
                outbox.push((Recipient::All, self.turn_or_end(winner)));
                Ok(outbox)
            }
            state => Err(RoomError::InvalidState {
                room_id: self.id,
                state,
            }),
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn require_acting(&self, actor: SessionId) -> Result<(), RoomError> {
        if self.acting_player() == Some(actor) {
            Ok(())
        } else {
            Err(RoomError::NotYourTurn(actor))
        }
    }

    fn require_state(&self, expected: RoomState) -> Result<(), RoomError> {
        if self.state == expected {
            Ok(())
        } else {
            Err(RoomError::InvalidState {
                room_id: self.id,
                state: self.state,
            })
        }
    }

    fn card_in_hand(
        &self,
        actor: SessionId,
        card_id: CardId,
        catalog: &CardCatalog,
    ) -> Result<Card, RoomError> {
        let in_hand = self
            .seats
            .get(&actor)
            .is_some_and(|seat| seat.hand.contains(&card_id));
        if !in_hand {
            return Err(RoomError::CardNotInHand(card_id));
        }
        catalog
            .lookup(card_id)
            .cloned()
            .ok_or(RoomError::UnknownCard(card_id))
    }

    /// Removes one copy; hands may hold duplicates.
    fn remove_from_hand(&mut self, actor: SessionId, card_id: CardId) {
        if let Some(seat) = self.seats.get_mut(&actor) {
            if let Some(pos) = seat.hand.iter().position(|id| *id == card_id) {
                seat.hand.remove(pos);
            }
        }
    }

    fn draw_into(&mut self, id: SessionId, catalog: &CardCatalog) -> Card {
        let card = catalog.draw_random().clone();
        if let Some(seat) = self.seats.get_mut(&id) {
            seat.hand.push(card.id);
        }
        card
    }

    fn skip_played(&self, actor: SessionId) -> ServerEvent {
        ServerEvent::Play(PlayEvent::Skip(Outcome::accepted(SkipPlayed {
            player_skip: self.name_of(actor),
            players_scores: self.players_scores(),
        })))
    }

    fn turn_or_end(&self, winner: Option<SessionId>) -> ServerEvent {
        match winner {
            Some(id) => {
                tracing::info!(room_id = %self.id, winner = %id, "game won");
                ServerEvent::Play(PlayEvent::End {
                    result: true,
                    player_win: self.name_of(id),
                })
            }
            None => ServerEvent::Play(PlayEvent::Turn {
                result: true,
                player_turn: self
                    .acting_player()
                    .map(|id| self.name_of(id))
                    .unwrap_or_default(),
            }),
        }
    }
}

fn private_draw(id: SessionId, card: Card) -> (Recipient, ServerEvent) {
    (
        Recipient::Player(id),
        ServerEvent::Play(PlayEvent::Draw {
            result: true,
            cards: vec![card],
        }),
    )
}

/// The negative reply for a rejected play request.
pub fn rejection(request: &PlayRequest) -> ServerEvent {
    ServerEvent::Play(match request {
        PlayRequest::Attack { .. } => PlayEvent::Attack(Outcome::rejected()),
        PlayRequest::Defend { .. } => PlayEvent::Defend(Outcome::rejected()),
        PlayRequest::Counter { .. } => PlayEvent::Counter(Outcome::rejected()),
        PlayRequest::Skip => PlayEvent::Skip(Outcome::rejected()),
    })
}
