//! Integration tests for the room system, driven through the router.

use std::sync::Arc;
use std::time::Duration;

use cyberwarrior_catalog::CardCatalog;
use cyberwarrior_protocol::{
    Card, CardCategory, CardId, CardType, ClientEvent, JoinNotice, LeaveNotice, Outcome, PlayEvent,
    PlayRequest, RoomCreated, RoomId, RoomRoster, RoomSummary, ServerEvent, SubCategory,
};
use cyberwarrior_room::{ActionRouter, RoomConfig, RoomInfo, RoomState};
use cyberwarrior_session::{DEFAULT_OUTBOUND_CAPACITY, SessionManager, SessionRef};
use tokio::sync::mpsc;

// =========================================================================
// Cards
// =========================================================================

const ATK_RED: CardId = CardId(1);
const DEF_RED: CardId = CardId(2);
const DEF_RED_SQUARE: CardId = CardId(3);
const DEF_ORANGE: CardId = CardId(4);
const DEF_BLUE: CardId = CardId(5);

fn card(id: CardId, card_type: CardType, category: CardCategory, sub: SubCategory) -> Card {
    Card {
        id,
        title: format!("card {}", id.0),
        image: format!("{}.png", id.0),
        description: String::new(),
        card_type,
        category,
        sub_categories: vec![sub],
    }
}

fn catalog(ids: &[CardId]) -> Arc<CardCatalog> {
    let all = [
        card(ATK_RED, CardType::Attack, CardCategory::Red, SubCategory::Circle),
        card(DEF_RED, CardType::Defend, CardCategory::Red, SubCategory::Circle),
        card(DEF_RED_SQUARE, CardType::Defend, CardCategory::Red, SubCategory::Square),
        card(DEF_ORANGE, CardType::Defend, CardCategory::Orange, SubCategory::Circle),
        card(DEF_BLUE, CardType::Defend, CardCategory::Blue, SubCategory::Circle),
    ];
    let cards = all.into_iter().filter(|c| ids.contains(&c.id)).collect();
    Arc::new(CardCatalog::new(cards).unwrap())
}

/// Hands this large make every catalog card all but certain to be dealt.
fn big_hands() -> RoomConfig {
    RoomConfig {
        hand_size: 60,
        ..RoomConfig::default()
    }
}

// =========================================================================
// Helpers
// =========================================================================

struct Client {
    session: SessionRef,
    rx: mpsc::Receiver<ServerEvent>,
}

impl Client {
    fn new(sessions: &mut SessionManager, name: &str) -> Self {
        let (tx, rx) = mpsc::channel(DEFAULT_OUTBOUND_CAPACITY);
        Self {
            session: sessions.create(name, tx),
            rx,
        }
    }

    async fn next(&mut self) -> ServerEvent {
        tokio::time::timeout(Duration::from_secs(2), self.rx.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed")
    }

    fn assert_idle(&mut self) {
        if let Ok(event) = self.rx.try_recv() {
            panic!("unexpected event: {event:?}");
        }
    }
}

struct Table {
    router: ActionRouter,
    a: Client,
    b: Client,
    room_id: RoomId,
}

impl Table {
    async fn send(&self, who: &Client, event: ClientEvent) {
        self.router.dispatch(&who.session, event).await;
    }

    async fn play(&self, who: &Client, request: PlayRequest) {
        self.send(who, ClientEvent::Play(request)).await;
    }

    /// Snapshot of the room. Also a barrier: the actor answers only after
    /// every earlier command has been handled.
    async fn info(&self) -> RoomInfo {
        self.router
            .room(self.room_id)
            .await
            .expect("room exists")
            .get_info()
            .await
            .unwrap()
    }

    fn drain(&mut self) {
        while self.a.rx.try_recv().is_ok() {}
        while self.b.rx.try_recv().is_ok() {}
    }
}

/// Alice hosts "Arena" and Bob joins. Both inboxes are drained.
async fn seated(catalog: Arc<CardCatalog>, config: RoomConfig) -> Table {
    let mut sessions = SessionManager::new();
    let a = Client::new(&mut sessions, "alice");
    let b = Client::new(&mut sessions, "bob");
    let router = ActionRouter::new(catalog, config);

    router
        .dispatch(
            &a.session,
            ClientEvent::Create {
                game_name: Some("Arena".into()),
            },
        )
        .await;
    let room_id = a.session.room().expect("host seated");
    router
        .dispatch(
            &b.session,
            ClientEvent::Join {
                game_id: Some(room_id),
            },
        )
        .await;

    let mut table = Table {
        router,
        a,
        b,
        room_id,
    };
    table.drain();
    table
}

/// A seated table with the game started and inboxes drained.
async fn started(catalog: Arc<CardCatalog>, config: RoomConfig) -> Table {
    let mut table = seated(catalog, config).await;
    table.send(&table.a, ClientEvent::Start).await;
    assert_eq!(table.info().await.state, RoomState::Turn);
    table.drain();
    table
}

fn roster(players: &[&str], is_can_start: bool) -> RoomRoster {
    RoomRoster {
        game_id: RoomId(1),
        game_name: "Arena".into(),
        host: "alice".into(),
        players: players.iter().map(|p| p.to_string()).collect(),
        is_can_start,
    }
}

// =========================================================================
// Lobby
// =========================================================================

#[tokio::test]
async fn test_create_then_join_broadcasts_roster() {
    let mut sessions = SessionManager::new();
    let mut a = Client::new(&mut sessions, "alice");
    let mut b = Client::new(&mut sessions, "bob");
    let router = ActionRouter::new(catalog(&[ATK_RED]), RoomConfig::default());

    router
        .dispatch(
            &a.session,
            ClientEvent::Create {
                game_name: Some("Arena".into()),
            },
        )
        .await;
    assert_eq!(
        a.next().await,
        ServerEvent::Create(Outcome::accepted(RoomCreated {
            game_id: RoomId(1),
            game_name: "Arena".into(),
        }))
    );

    router
        .dispatch(
            &b.session,
            ClientEvent::Join {
                game_id: Some(RoomId(1)),
            },
        )
        .await;

    let expected = ServerEvent::Join(Outcome::accepted(JoinNotice {
        player_join: "bob".into(),
        roster: roster(&["alice", "bob"], true),
    }));
    assert_eq!(a.next().await, expected);
    assert_eq!(b.next().await, expected);
    assert_eq!(b.session.room(), Some(RoomId(1)));
}

#[tokio::test]
async fn test_create_while_in_room_rejected() {
    let mut table = seated(catalog(&[ATK_RED]), RoomConfig::default()).await;
    table
        .send(
            &table.a,
            ClientEvent::Create {
                game_name: Some("Other".into()),
            },
        )
        .await;
    assert_eq!(table.a.next().await, ServerEvent::Create(Outcome::rejected()));
    assert_eq!(table.router.room_count().await, 1);
}

#[tokio::test]
async fn test_create_without_name_is_dropped() {
    let mut sessions = SessionManager::new();
    let mut a = Client::new(&mut sessions, "alice");
    let router = ActionRouter::new(catalog(&[ATK_RED]), RoomConfig::default());

    router
        .dispatch(&a.session, ClientEvent::Create { game_name: None })
        .await;

    a.assert_idle();
    assert_eq!(router.room_count().await, 0);
    assert_eq!(a.session.room(), None);
}

#[tokio::test]
async fn test_join_rejections() {
    let mut table = seated(catalog(&[ATK_RED]), RoomConfig::default()).await;
    let mut sessions = SessionManager::new();
    let mut carol = Client::new(&mut sessions, "carol");

    // Full.
    table
        .router
        .dispatch(
            &carol.session,
            ClientEvent::Join {
                game_id: Some(table.room_id),
            },
        )
        .await;
    assert_eq!(carol.next().await, ServerEvent::Join(Outcome::rejected()));
    assert_eq!(carol.session.room(), None);

    // Missing room.
    table
        .router
        .dispatch(
            &carol.session,
            ClientEvent::Join {
                game_id: Some(RoomId(99)),
            },
        )
        .await;
    assert_eq!(carol.next().await, ServerEvent::Join(Outcome::rejected()));

    // Already in a room.
    table
        .send(
            &table.b,
            ClientEvent::Join {
                game_id: Some(table.room_id),
            },
        )
        .await;
    assert_eq!(table.b.next().await, ServerEvent::Join(Outcome::rejected()));
    assert_eq!(table.info().await.players.len(), 2);
    table.a.assert_idle();
}

#[tokio::test]
async fn test_join_started_game_rejected() {
    let table = started(catalog(&[ATK_RED]), RoomConfig::default()).await;
    let mut sessions = SessionManager::new();
    let mut carol = Client::new(&mut sessions, "carol");

    table
        .router
        .dispatch(
            &carol.session,
            ClientEvent::Join {
                game_id: Some(table.room_id),
            },
        )
        .await;
    assert_eq!(carol.next().await, ServerEvent::Join(Outcome::rejected()));
    assert_eq!(carol.session.room(), None);
}

#[tokio::test]
async fn test_search_lists_rooms_in_id_order() {
    let mut table = seated(catalog(&[ATK_RED]), RoomConfig::default()).await;
    let mut sessions = SessionManager::new();
    let mut carol = Client::new(&mut sessions, "carol");
    table
        .router
        .dispatch(
            &carol.session,
            ClientEvent::Create {
                game_name: Some("Solo".into()),
            },
        )
        .await;
    carol.next().await;

    table.send(&table.a, ClientEvent::Search).await;
    assert_eq!(
        table.a.next().await,
        ServerEvent::Search {
            result: true,
            rooms: vec![
                RoomSummary {
                    game_id: RoomId(1),
                    game_name: "Arena".into(),
                    player_count: 2,
                    is_full: true,
                },
                RoomSummary {
                    game_id: RoomId(2),
                    game_name: "Solo".into(),
                    player_count: 1,
                    is_full: false,
                },
            ],
        }
    );
}

// =========================================================================
// Start
// =========================================================================

#[tokio::test]
async fn test_start_by_guest_is_ignored() {
    let mut table = seated(catalog(&[ATK_RED]), RoomConfig::default()).await;
    table.send(&table.b, ClientEvent::Start).await;

    let info = table.info().await;
    assert_eq!(info.state, RoomState::Waiting);
    assert!(info.hands.values().all(|hand| hand.is_empty()));
    table.a.assert_idle();
    table.b.assert_idle();
}

#[tokio::test]
async fn test_start_deals_five_cards_each() {
    let mut table = seated(catalog(&[ATK_RED]), RoomConfig::default()).await;
    table.send(&table.a, ClientEvent::Start).await;

    let info = table.info().await;
    assert_eq!(info.state, RoomState::Turn);
    assert_eq!(info.turn_index, 0);
    for client in [&mut table.a, &mut table.b] {
        assert_eq!(info.hands[&client.session.id()].len(), 5);
        assert_eq!(client.next().await, ServerEvent::Start { result: true });
        match client.next().await {
            ServerEvent::Play(PlayEvent::Draw { result, cards }) => {
                assert!(result);
                assert_eq!(cards.len(), 5);
                assert!(cards.iter().all(|c| c.id == ATK_RED));
            }
            other => panic!("expected draw, got {other:?}"),
        }
        assert_eq!(
            client.next().await,
            ServerEvent::Play(PlayEvent::Turn {
                result: true,
                player_turn: "alice".into()
            })
        );
    }
}

// =========================================================================
// Play
// =========================================================================

#[tokio::test]
async fn test_attack_then_counter() {
    let mut table = started(catalog(&[ATK_RED, DEF_RED]), big_hands()).await;

    table
        .play(&table.a, PlayRequest::Attack { card_id: Some(ATK_RED) })
        .await;
    for client in [&mut table.a, &mut table.b] {
        match client.next().await {
            ServerEvent::Play(PlayEvent::Attack(Outcome {
                result: true,
                body: Some(body),
            })) => {
                assert_eq!(body.player_attack, "alice");
                assert_eq!(body.player_target, "bob");
                assert_eq!(body.card.id, ATK_RED);
            }
            other => panic!("expected attack, got {other:?}"),
        }
    }
    let info = table.info().await;
    assert_eq!(info.state, RoomState::Counter);
    assert_eq!(info.discard, Some(ATK_RED));

    table
        .play(&table.b, PlayRequest::Counter { card_id: Some(DEF_RED) })
        .await;

    // The attacker's private draw arrives before the broadcast.
    assert!(matches!(
        table.a.next().await,
        ServerEvent::Play(PlayEvent::Draw { cards, .. }) if cards.len() == 1
    ));
    for client in [&mut table.a, &mut table.b] {
        assert!(matches!(
            client.next().await,
            ServerEvent::Play(PlayEvent::Counter(Outcome { result: true, .. }))
        ));
        assert_eq!(
            client.next().await,
            ServerEvent::Play(PlayEvent::Turn {
                result: true,
                player_turn: "bob".into()
            })
        );
    }

    let info = table.info().await;
    assert_eq!(info.state, RoomState::Turn);
    assert_eq!(info.turn_index, 1);
    assert_eq!(info.discard, Some(DEF_RED));
    table.b.assert_idle();
}

#[tokio::test]
async fn test_counter_without_shared_subcategory_rejected() {
    let mut table = started(catalog(&[ATK_RED, DEF_RED_SQUARE]), big_hands()).await;
    table
        .play(&table.a, PlayRequest::Attack { card_id: Some(ATK_RED) })
        .await;
    let before = table.info().await;
    table.drain();

    table
        .play(
            &table.b,
            PlayRequest::Counter {
                card_id: Some(DEF_RED_SQUARE),
            },
        )
        .await;

    assert_eq!(
        table.b.next().await,
        ServerEvent::Play(PlayEvent::Counter(Outcome::rejected()))
    );
    let after = table.info().await;
    assert_eq!(after.state, RoomState::Counter);
    let b = table.b.session.id();
    assert_eq!(after.hands[&b], before.hands[&b]);
    table.a.assert_idle();
}

#[tokio::test]
async fn test_out_of_turn_play_rejected_to_requester_only() {
    let mut table = started(catalog(&[ATK_RED]), RoomConfig::default()).await;
    table
        .play(&table.b, PlayRequest::Attack { card_id: Some(ATK_RED) })
        .await;

    assert_eq!(
        table.b.next().await,
        ServerEvent::Play(PlayEvent::Attack(Outcome::rejected()))
    );
    assert_eq!(table.info().await.state, RoomState::Turn);
    table.a.assert_idle();
}

#[tokio::test]
async fn test_play_missing_card_is_dropped() {
    let mut table = started(catalog(&[ATK_RED]), RoomConfig::default()).await;
    table
        .play(&table.a, PlayRequest::Attack { card_id: None })
        .await;

    assert_eq!(table.info().await.state, RoomState::Turn);
    table.a.assert_idle();
    table.b.assert_idle();
}

#[tokio::test]
async fn test_play_outside_room_rejected() {
    let mut sessions = SessionManager::new();
    let mut a = Client::new(&mut sessions, "alice");
    let router = ActionRouter::new(catalog(&[ATK_RED]), RoomConfig::default());

    router
        .dispatch(&a.session, ClientEvent::Play(PlayRequest::Skip))
        .await;
    assert_eq!(
        a.next().await,
        ServerEvent::Play(PlayEvent::Skip(Outcome::rejected()))
    );
}

#[tokio::test]
async fn test_successive_defends_end_game() {
    let mut table = started(catalog(&[DEF_RED, DEF_ORANGE, DEF_BLUE]), big_hands()).await;

    table
        .play(&table.a, PlayRequest::Defend { card_id: Some(DEF_RED) })
        .await;
    table.play(&table.b, PlayRequest::Skip).await;
    table
        .play(&table.a, PlayRequest::Defend { card_id: Some(DEF_ORANGE) })
        .await;
    table.play(&table.b, PlayRequest::Skip).await;
    table
        .play(&table.a, PlayRequest::Defend { card_id: Some(DEF_BLUE) })
        .await;

    let info = table.info().await;
    assert_eq!(info.state, RoomState::End);
    let scores = info.scores[&table.a.session.id()];
    assert_eq!((scores.red, scores.orange, scores.blue), (1, 1, 1));

    let mut last = None;
    while let Ok(event) = table.b.rx.try_recv() {
        last = Some(event);
    }
    assert_eq!(
        last,
        Some(ServerEvent::Play(PlayEvent::End {
            result: true,
            player_win: "alice".into()
        }))
    );
    table.drain();

    // Any further play is refused.
    table.play(&table.b, PlayRequest::Skip).await;
    assert_eq!(
        table.b.next().await,
        ServerEvent::Play(PlayEvent::Skip(Outcome::rejected()))
    );
    table
        .play(&table.a, PlayRequest::Defend { card_id: Some(DEF_RED) })
        .await;
    assert_eq!(
        table.a.next().await,
        ServerEvent::Play(PlayEvent::Defend(Outcome::rejected()))
    );
}

#[tokio::test]
async fn test_concurrent_skips_keep_room_consistent() {
    let table = Arc::new(started(catalog(&[ATK_RED]), RoomConfig::default()).await);

    let mut tasks = Vec::new();
    for i in 0..40 {
        let table = Arc::clone(&table);
        tasks.push(tokio::spawn(async move {
            let who = if i % 2 == 0 { &table.a } else { &table.b };
            table.play(who, PlayRequest::Skip).await;
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let info = table.info().await;
    let Ok(mut table) = Arc::try_unwrap(table) else {
        panic!("tasks still hold the table");
    };

    // Every accepted skip is broadcast, so alice's inbox sees them all.
    let mut accepted = 0;
    while let Ok(event) = table.a.rx.try_recv() {
        if let ServerEvent::Play(PlayEvent::Skip(Outcome { result: true, .. })) = event {
            accepted += 1;
        }
    }

    assert_eq!(info.players.len(), 2);
    assert_eq!(info.state, RoomState::Turn);
    assert!(accepted > 0);
    // Each accepted skip drew exactly one card for the skipper and passed
    // the turn once.
    let drawn: usize = info.hands.values().map(|h| h.len()).sum::<usize>() - 10;
    assert_eq!(drawn, accepted);
    assert_eq!(info.turn_index, accepted % 2);
}

// =========================================================================
// Leave and closure
// =========================================================================

#[tokio::test]
async fn test_leave_mid_game_closes_room() {
    let mut table = started(catalog(&[ATK_RED]), RoomConfig::default()).await;
    table.send(&table.b, ClientEvent::Leave).await;

    assert_eq!(
        table.a.next().await,
        ServerEvent::Leave(Outcome::accepted(LeaveNotice {
            player_leave: "bob".into(),
            roster: Some(roster(&["alice"], false)),
        }))
    );
    assert_eq!(
        table.a.next().await,
        ServerEvent::Leave(Outcome::accepted(LeaveNotice {
            player_leave: "alice".into(),
            roster: None,
        }))
    );
    assert_eq!(
        table.b.next().await,
        ServerEvent::Leave(Outcome::accepted(LeaveNotice {
            player_leave: "bob".into(),
            roster: None,
        }))
    );

    assert_eq!(table.router.room_count().await, 0);
    assert!(table.router.room(table.room_id).await.is_none());
    assert_eq!(table.a.session.room(), None);
    assert_eq!(table.b.session.room(), None);
}

#[tokio::test]
async fn test_guest_leave_while_waiting_keeps_room() {
    let mut table = seated(catalog(&[ATK_RED]), RoomConfig::default()).await;
    table.send(&table.b, ClientEvent::Leave).await;

    assert_eq!(
        table.a.next().await,
        ServerEvent::Leave(Outcome::accepted(LeaveNotice {
            player_leave: "bob".into(),
            roster: Some(roster(&["alice"], false)),
        }))
    );
    assert!(matches!(table.b.next().await, ServerEvent::Leave(_)));
    assert_eq!(table.info().await.players, vec![table.a.session.id()]);
    assert_eq!(table.a.session.room(), Some(table.room_id));
}

#[tokio::test]
async fn test_host_leave_while_waiting_closes_room() {
    let mut table = seated(catalog(&[ATK_RED]), RoomConfig::default()).await;
    table.send(&table.a, ClientEvent::Leave).await;

    assert!(matches!(table.b.next().await, ServerEvent::Leave(_)));
    assert_eq!(
        table.b.next().await,
        ServerEvent::Leave(Outcome::accepted(LeaveNotice {
            player_leave: "bob".into(),
            roster: None,
        }))
    );
    assert_eq!(table.router.room_count().await, 0);
    assert_eq!(table.b.session.room(), None);
}

#[tokio::test]
async fn test_leave_outside_room_rejected() {
    let mut sessions = SessionManager::new();
    let mut a = Client::new(&mut sessions, "alice");
    let router = ActionRouter::new(catalog(&[ATK_RED]), RoomConfig::default());

    router.dispatch(&a.session, ClientEvent::Leave).await;
    assert_eq!(a.next().await, ServerEvent::Leave(Outcome::rejected()));
}

#[tokio::test]
async fn test_disconnect_is_synthetic_leave() {
    let mut table = started(catalog(&[ATK_RED]), RoomConfig::default()).await;
    table.router.disconnect(&table.b.session).await;

    assert!(matches!(table.a.next().await, ServerEvent::Leave(_)));
    assert!(matches!(table.a.next().await, ServerEvent::Leave(_)));
    assert_eq!(table.router.room_count().await, 0);

    // The evicted member has no room left to leave.
    table.router.disconnect(&table.a.session).await;
    table.a.assert_idle();
}

#[tokio::test]
async fn test_closed_room_id_is_not_reused() {
    let mut table = seated(catalog(&[ATK_RED]), RoomConfig::default()).await;
    table.send(&table.a, ClientEvent::Leave).await;
    table.drain();

    table
        .send(
            &table.a,
            ClientEvent::Create {
                game_name: Some("Again".into()),
            },
        )
        .await;
    assert_eq!(
        table.a.next().await,
        ServerEvent::Create(Outcome::accepted(RoomCreated {
            game_id: RoomId(2),
            game_name: "Again".into(),
        }))
    );
}
