//! Deadline and countdown behavior against paused tokio time
//!
//! Paused time advances automatically once every task is idle, so the armed
//! sleeps fire deterministically and the resulting messages can be pulled off
//! the session channel and fed back in by hand.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use cracklist::{
    ConnectionId, EngineSettings, GameSession, PlayCardPayload, PromptCatalog, ServerEvent,
    SessionMessage, SessionState,
};

use crate::mocks::{AcceptAllJudge, MemoryTransport};

fn catalog() -> PromptCatalog {
    PromptCatalog::new(vec![vec!["Fruits".to_string()], vec!["Countries".to_string()]])
}

fn session_with_players(
    players: usize,
) -> (
    GameSession,
    UnboundedReceiver<SessionMessage>,
    Vec<Uuid>,
    MemoryTransport,
) {
    let transport = MemoryTransport::new();
    let (mut session, rx) = GameSession::with_rng_seed(
        "s-timer",
        Arc::new(transport.clone()),
        Arc::new(AcceptAllJudge),
        catalog(),
        EngineSettings::default(),
        7,
    );

    let mut uuids = Vec::new();
    for i in 0..players {
        let uuid = Uuid::new_v4();
        session.join(
            ConnectionId::new(format!("conn-{}", i)),
            uuid,
            format!("player-{}", i),
        );
        uuids.push(uuid);
    }

    (session, rx, uuids, transport)
}

#[tokio::test(start_paused = true)]
async fn test_turn_deadline_fires_and_penalizes() {
    let (mut session, mut rx, uuids, transport) = session_with_players(2);
    session.start(uuids[0]);

    let current = session.current_player().unwrap();
    let size = session.hand(&current).unwrap().len();
    transport.clear();

    let message = rx.recv().await.expect("the armed deadline must fire");
    assert!(matches!(message, SessionMessage::TurnTimeout { .. }));
    session.handle_message(message);

    assert_eq!(session.hand(&current).unwrap().len(), size + 1);
    assert_ne!(session.current_player(), Some(current));
    assert!(transport
        .events_named("turn-timeout")
        .iter()
        .all(|event| *event == ServerEvent::TurnTimeout { player: current }));
    assert!(!transport.events_named("turn-timeout").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_consecutive_timeouts_alternate_players() {
    let (mut session, mut rx, uuids, _transport) = session_with_players(2);
    session.start(uuids[0]);

    let first = session.current_player().unwrap();
    let message = rx.recv().await.unwrap();
    session.handle_message(message);

    let second = session.current_player().unwrap();
    assert_ne!(second, first);

    let message = rx.recv().await.unwrap();
    session.handle_message(message);

    // Back to the first player, both carrying one penalty card
    assert_eq!(session.current_player(), Some(first));
    assert_eq!(session.hand(&first).unwrap().len(), 9);
    assert_eq!(session.hand(&second).unwrap().len(), 9);
}

#[tokio::test(start_paused = true)]
async fn test_stale_timeout_after_play_is_ignored() {
    let (mut session, mut rx, uuids, transport) = session_with_players(2);
    session.start(uuids[0]);

    // Pull the fired deadline off the channel, but act before handling it
    let stale = rx.recv().await.unwrap();
    assert!(matches!(stale, SessionMessage::TurnTimeout { .. }));

    let current = session.current_player().unwrap();
    let card = session.hand(&current).unwrap()[0].clone();
    let answer = card.is_letter().then(|| "Zebra".to_string());
    session.play_card(
        current,
        &PlayCardPayload {
            card_id: card.id,
            answer,
            target_uuid: None,
        },
    );
    assert_eq!(session.state(), SessionState::Turn);

    transport.clear();
    session.handle_message(stale);
    assert!(transport.events_named("turn-timeout").is_empty());
    assert!(transport.events_named("penalty-draw").is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_deletion_countdown_destroys_abandoned_session() {
    let (mut session, mut rx, uuids, transport) = session_with_players(1);
    session.left(uuids[0]);

    let message = rx.recv().await.expect("the countdown must fire");
    assert!(matches!(message, SessionMessage::DeletionDue { .. }));
    session.handle_message(message);

    assert_eq!(transport.deleted_sessions(), vec!["s-timer".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_rejoin_cancels_deletion_countdown() {
    let (mut session, mut rx, uuids, transport) = session_with_players(1);
    session.left(uuids[0]);
    session.join(ConnectionId::from("conn-0-back"), uuids[0], "player-0".to_string());

    // The aborted countdown task never delivers; the channel stays quiet
    let outcome =
        tokio::time::timeout(std::time::Duration::from_secs(60 * 60), rx.recv()).await;
    assert!(outcome.is_err(), "no timer message may arrive after a rejoin");
    assert!(transport.deleted_sessions().is_empty());
}
