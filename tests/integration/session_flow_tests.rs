//! Full session lifecycle tests: lobby, rounds, game end and restart
//!
//! These tests own the session directly instead of spawning it, so state can
//! be inspected between messages. Timer-driven messages are delivered by hand
//! where a test needs them; timer behavior itself is covered in the timer
//! tests.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;
use uuid::Uuid;

use cracklist::{
    CardKind, ClientCommand, ConfigurationUpdate, ConnectionId, EngineSettings, GameSession,
    PenaltyReason, PlayCardPayload, PromptCatalog, ServerEvent, SessionMessage, SessionState,
};

use crate::mocks::{AcceptAllJudge, MemoryTransport, StartsWithJudge};

fn catalog() -> PromptCatalog {
    PromptCatalog::new(vec![
        vec!["Fruits".to_string(), "Vegetables".to_string()],
        vec!["Countries".to_string()],
        vec!["Animals".to_string(), "Rivers".to_string()],
    ])
}

fn session_with_players(
    players: usize,
    seed: u64,
) -> (
    GameSession,
    UnboundedReceiver<SessionMessage>,
    Vec<Uuid>,
    MemoryTransport,
) {
    let transport = MemoryTransport::new();
    let (mut session, rx) = GameSession::with_rng_seed(
        "s-flow",
        Arc::new(transport.clone()),
        Arc::new(AcceptAllJudge),
        catalog(),
        EngineSettings::default(),
        seed,
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

/// Make one legal move for the current player: the first letter card in hand
/// if any, otherwise the first action card. A seat stranded without cards by
/// a swap sits out its turn through the fired deadline, which needs paused
/// tokio time in the caller. Answers are generated unique so they are always
/// accepted.
async fn play_one_turn(
    session: &mut GameSession,
    rx: &mut UnboundedReceiver<SessionMessage>,
    counter: &mut u64,
) {
    let current = session.current_player().expect("a turn must be active");
    let hand = session
        .hand(&current)
        .expect("current player holds a hand")
        .to_vec();

    let card = match hand.iter().find(|c| c.is_letter()).or_else(|| hand.first()) {
        Some(card) => card.clone(),
        None => {
            // Only the turn deadline refills a stranded hand
            let message = rx.recv().await.expect("the armed deadline must fire");
            session.handle_message(message);
            return;
        }
    };

    *counter += 1;
    let answer = matches!(card.kind, CardKind::Letter { .. })
        .then(|| format!("answer-{}", counter));

    session.play_card(
        current,
        &PlayCardPayload {
            card_id: card.id,
            answer,
            target_uuid: None,
        },
    );
}

#[tokio::test]
async fn test_spawned_actor_processes_handle_traffic() {
    let transport = MemoryTransport::new();
    let handle = GameSession::spawn(
        "s-actor",
        Arc::new(transport.clone()),
        Arc::new(AcceptAllJudge),
        catalog(),
        EngineSettings::default(),
    );
    assert!(!handle.is_closed());

    let uuid = Uuid::new_v4();
    handle.join(ConnectionId::from("conn-actor"), uuid, "player-0");

    let mut joined = false;
    for _ in 0..100 {
        tokio::task::yield_now().await;
        if !transport.events_named("player-join").is_empty() {
            joined = true;
            break;
        }
    }
    assert!(joined, "the spawned actor must process handle traffic");
}

#[tokio::test]
async fn test_lobby_configuration_lock_and_master_flow() {
    let (mut session, _rx, uuids, transport) = session_with_players(3, 11);
    assert_eq!(session.state(), SessionState::Config);
    assert_eq!(session.master_uuid(), Some(uuids[0]));

    // Master reconfigures through the command dispatch path
    session.handle_message(SessionMessage::Command {
        uuid: uuids[0],
        command: ClientCommand::UpdateConfiguration {
            configuration: ConfigurationUpdate {
                points_to_win: Some(serde_json::json!("4")),
                auto_penalty_distribution: None,
            },
        },
    });
    assert_eq!(session.configuration().points_to_win, 4);

    // A non-master update changes nothing
    session.handle_message(SessionMessage::Command {
        uuid: uuids[1],
        command: ClientCommand::UpdateConfiguration {
            configuration: ConfigurationUpdate {
                points_to_win: Some(serde_json::json!(9)),
                auto_penalty_distribution: None,
            },
        },
    });
    assert_eq!(session.configuration().points_to_win, 4);

    // Lock the lobby, a stranger bounces off
    session.handle_message(SessionMessage::Command {
        uuid: uuids[0],
        command: ClientCommand::SetLock { locked: true },
    });
    assert!(session.is_locked());

    let stranger = Uuid::new_v4();
    let stranger_conn = ConnectionId::from("conn-stranger");
    session.join(stranger_conn.clone(), stranger, "stranger".to_string());
    assert!(session.player(&stranger).is_none());
    assert_eq!(
        transport.events_for(&stranger_conn),
        vec![ServerEvent::Kick { locked: true }]
    );

    // Hand over mastership, then the new master kicks a player
    session.handle_message(SessionMessage::Command {
        uuid: uuids[0],
        command: ClientCommand::SwitchMaster { target: uuids[1] },
    });
    assert_eq!(session.master_uuid(), Some(uuids[1]));

    session.handle_message(SessionMessage::Command {
        uuid: uuids[1],
        command: ClientCommand::Kick { target: uuids[2] },
    });
    assert!(session.player(&uuids[2]).is_none());
    assert_eq!(session.player_count(), 2);
}

#[tokio::test]
async fn test_game_start_deals_hands_and_opens_first_turn() {
    let (mut session, _rx, uuids, transport) = session_with_players(3, 12);
    transport.clear();

    session.handle_message(SessionMessage::Command {
        uuid: uuids[0],
        command: ClientCommand::StartGame,
    });

    assert_eq!(session.state(), SessionState::Turn);
    assert_eq!(session.round(), 1);
    assert_eq!(session.turn_order().len(), 3);
    for uuid in &uuids {
        assert_eq!(session.hand(uuid).unwrap().len(), 8);
    }
    assert!(session.current_list().is_some());
    assert!(session.turn_deadline().is_some());

    assert_eq!(transport.stat("games"), 1);
    assert_eq!(transport.stat("rounds"), 1);

    match transport.last_named("turn-started") {
        Some(ServerEvent::TurnStarted { player, duration, round, list, .. }) => {
            assert_eq!(Some(player), session.current_player());
            assert_eq!(duration, 20_000);
            assert_eq!(round, 1);
            assert_eq!(list.as_deref(), session.current_list());
        }
        other => panic!("expected a turn-started event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_start_rejected_without_enough_players() {
    let (mut session, _rx, uuids, transport) = session_with_players(1, 13);
    session.handle_message(SessionMessage::Command {
        uuid: uuids[0],
        command: ClientCommand::StartGame,
    });
    assert_eq!(session.state(), SessionState::Config);
    assert_eq!(transport.stat("games"), 0);
}

#[tokio::test]
async fn test_reconnect_mid_round_gets_catch_up() {
    let (mut session, _rx, uuids, transport) = session_with_players(3, 14);
    session.handle_message(SessionMessage::Command {
        uuid: uuids[0],
        command: ClientCommand::StartGame,
    });

    session.handle_message(SessionMessage::Command {
        uuid: uuids[1],
        command: ClientCommand::Leave,
    });
    assert!(!session.player(&uuids[1]).unwrap().online);
    assert_eq!(session.turn_order().len(), 2);

    let new_conn = ConnectionId::from("conn-1-reborn");
    transport.clear();
    session.join(new_conn.clone(), uuids[1], "player-1".to_string());

    assert!(session.player(&uuids[1]).unwrap().online);
    // A departure forfeits the seat for the rest of the round
    assert_eq!(session.turn_order().len(), 2);

    let direct = transport.events_for(&new_conn);
    let snapshot = direct.iter().find_map(|event| match event {
        ServerEvent::CatchUpGameState(snapshot) => Some(snapshot.clone()),
        _ => None,
    });
    let snapshot = snapshot.expect("reconnect must receive a catch-up snapshot");
    assert_eq!(snapshot.state, SessionState::Turn);
    assert_eq!(snapshot.round, 1);
    assert_eq!(snapshot.players, session.turn_order().to_vec());
    assert!(direct
        .iter()
        .any(|event| matches!(event, ServerEvent::HandUpdated { .. })));
}

#[tokio::test]
async fn test_first_letter_judge_refuses_then_accepts() {
    let transport = MemoryTransport::new();
    let (mut session, _rx) = GameSession::with_rng_seed(
        "s-judge",
        Arc::new(transport.clone()),
        Arc::new(StartsWithJudge),
        catalog(),
        EngineSettings::default(),
        21,
    );
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    session.join(ConnectionId::from("conn-a"), first, "player-a".to_string());
    session.join(ConnectionId::from("conn-b"), second, "player-b".to_string());
    session.start(first);

    let current = session.current_player().unwrap();
    let card = session
        .hand(&current)
        .unwrap()
        .iter()
        .find(|c| c.is_letter())
        .cloned()
        .expect("a fresh hand holds a letter card");
    let letter = match card.kind {
        CardKind::Letter { letter, .. } => letter,
        _ => panic!("expected a letter card"),
    };
    let size = session.hand(&current).unwrap().len();
    transport.clear();

    // An answer opening with the wrong letter bounces with a penalty draw
    let wrong = if letter.eq_ignore_ascii_case(&'z') { "Apple" } else { "Zebra" };
    session.play_card(
        current,
        &PlayCardPayload {
            card_id: card.id,
            answer: Some(wrong.to_string()),
            target_uuid: None,
        },
    );
    match transport.last_named("answer-refused") {
        Some(ServerEvent::AnswerRefused { player, reason }) => {
            assert_eq!(player, current);
            assert_eq!(reason, PenaltyReason::InvalidLetter);
        }
        other => panic!("expected an answer-refused event, got {:?}", other),
    }
    assert_eq!(session.hand(&current).unwrap().len(), size + 1);
    assert_ne!(session.current_player(), Some(current));

    // The next player clears the same judge with a matching opening letter
    let next = session.current_player().unwrap();
    let next_card = session
        .hand(&next)
        .unwrap()
        .iter()
        .find(|c| c.is_letter())
        .cloned()
        .expect("a fresh hand holds a letter card");
    let next_letter = match next_card.kind {
        CardKind::Letter { letter, .. } => letter,
        _ => panic!("expected a letter card"),
    };
    let answer = format!("{}ebra", next_letter);
    session.play_card(
        next,
        &PlayCardPayload {
            card_id: next_card.id,
            answer: Some(answer.clone()),
            target_uuid: None,
        },
    );
    match transport.last_named("card-played") {
        Some(ServerEvent::CardPlayed { player, answer: played, .. }) => {
            assert_eq!(player, next);
            assert_eq!(played.as_deref(), Some(answer.as_str()));
        }
        other => panic!("expected a card-played event, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_quick_game_runs_to_completion() {
    let (mut session, mut rx, uuids, transport) = session_with_players(2, 15);

    session.update_configuration(
        uuids[0],
        &ConfigurationUpdate {
            points_to_win: Some(serde_json::json!(1)),
            auto_penalty_distribution: None,
        },
    );
    session.start(uuids[0]);

    let mut counter = 0;
    for _ in 0..20_000 {
        if session.state() != SessionState::Turn {
            break;
        }
        play_one_turn(&mut session, &mut rx, &mut counter).await;
    }

    assert_eq!(session.state(), SessionState::End);
    let winner = match transport.last_named("game-ended") {
        Some(ServerEvent::GameEnded { winner, scores }) => {
            assert_eq!(scores[&winner], 1);
            winner
        }
        other => panic!("expected a game-ended event, got {:?}", other),
    };
    assert_eq!(session.score(&winner), 1);
    assert!(session.hand(&winner).unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_multi_round_game_winner_leads_next_round() {
    let (mut session, mut rx, uuids, transport) = session_with_players(3, 16);
    session.start(uuids[0]);

    let mut counter = 0;
    let mut rounds_seen = 0;
    for _ in 0..60_000 {
        match session.state() {
            SessionState::Turn => play_one_turn(&mut session, &mut rx, &mut counter).await,
            SessionState::RoundEnd => {
                rounds_seen += 1;
                let winner = match transport.last_named("round-ended") {
                    Some(ServerEvent::RoundEnded { winner, .. }) => winner,
                    other => panic!("expected a round-ended event, got {:?}", other),
                };
                // Deliver what the pause timer would send
                let round = session.round();
                session.handle_message(SessionMessage::RoundPauseElapsed { winner, round });
                assert_eq!(session.state(), SessionState::Turn);
                assert_eq!(session.round(), round + 1);
                assert_eq!(session.current_player(), Some(winner));
            }
            SessionState::End => break,
            other => panic!("unexpected state during simulation: {:?}", other),
        }
    }

    assert_eq!(session.state(), SessionState::End);
    // At least two rounds must have ended in a pause before someone hit three
    assert!(rounds_seen >= 2);
    match transport.last_named("game-ended") {
        Some(ServerEvent::GameEnded { winner, scores }) => {
            assert_eq!(scores[&winner], 3);
        }
        other => panic!("expected a game-ended event, got {:?}", other),
    }
}

#[tokio::test(start_paused = true)]
async fn test_restart_returns_to_lobby_with_scores_cleared() {
    let (mut session, mut rx, uuids, transport) = session_with_players(2, 17);

    session.update_configuration(
        uuids[0],
        &ConfigurationUpdate {
            points_to_win: Some(serde_json::json!(1)),
            auto_penalty_distribution: None,
        },
    );
    session.start(uuids[0]);

    let mut counter = 0;
    for _ in 0..20_000 {
        if session.state() != SessionState::Turn {
            break;
        }
        play_one_turn(&mut session, &mut rx, &mut counter).await;
    }
    assert_eq!(session.state(), SessionState::End);

    transport.clear();
    session.handle_message(SessionMessage::Command {
        uuid: uuids[0],
        command: ClientCommand::Restart,
    });

    assert_eq!(session.state(), SessionState::Config);
    assert_eq!(session.round(), 0);
    assert_eq!(session.score(&uuids[0]), 0);
    assert_eq!(session.score(&uuids[1]), 0);
    assert!(session.turn_order().is_empty());
    assert!(session.hand(&uuids[0]).is_none());
    assert!(transport.last_named("game-restarted").is_some());

    // The lobby is playable again
    session.start(uuids[0]);
    assert_eq!(session.state(), SessionState::Turn);
}
