//! The game session controller: one authoritative state machine per session
//!
//! The controller owns the roster, decks, hands, scores and turn order, emits
//! events through the injected [`Transport`] port and consults the injected
//! [`AnswerJudge`] port. Unauthorized or precondition-violating commands are
//! silently dropped; clients resynchronize through the catch-up snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::{ConfigurationUpdate, EngineSettings, SessionConfiguration};
use crate::deck::{self, ActionKind, Card, CardKind, Deck, PromptCatalog};
use crate::events::{
    ClientCommand, GameSnapshot, PenaltyReason, PlayCardPayload, PlayedCard, PlayerRef,
    ServerEvent,
};
use crate::ports::{AnswerJudge, ConnectionId, Transport};
use crate::session::player::Player;
use crate::session::turn::{OneShotTimer, TurnOrder};
use crate::session::{SessionHandle, SessionMessage, SessionState};

/// One accepted answer in the current round, kept for duplicate detection
#[derive(Debug, Clone)]
pub struct AnswerRecord {
    pub uuid: Uuid,
    pub letter: char,
    pub answer: String,
}

/// Authoritative state machine for a single game session
pub struct GameSession {
    id: String,
    transport: Arc<dyn Transport>,
    judge: Arc<dyn AnswerJudge>,
    catalog: PromptCatalog,
    settings: EngineSettings,
    tx: UnboundedSender<SessionMessage>,
    rng: StdRng,

    players: HashMap<Uuid, Player>,
    master: Option<Uuid>,
    locked: bool,

    state: SessionState,
    configuration: SessionConfiguration,

    hands: HashMap<Uuid, Vec<Card>>,
    play_deck: Deck,
    play_discard: Vec<Card>,
    prompt_deck: Deck,
    prompt_discard: Vec<Card>,
    current_list_card: Option<Card>,
    current_list: Option<String>,

    order: TurnOrder,
    turn_timer: OneShotTimer,
    turn_deadline: Option<i64>,
    deletion_timer: OneShotTimer,

    answers: Vec<AnswerRecord>,
    scores: HashMap<Uuid, u32>,
    round: u32,
}

impl GameSession {
    /// Create a session and the receiving end of its message channel
    pub fn new(
        id: impl Into<String>,
        transport: Arc<dyn Transport>,
        judge: Arc<dyn AnswerJudge>,
        catalog: PromptCatalog,
        settings: EngineSettings,
    ) -> (Self, UnboundedReceiver<SessionMessage>) {
        Self::with_rng(id, transport, judge, catalog, settings, StdRng::from_entropy())
    }

    /// Create a session with a seeded RNG, for reproducible shuffles
    pub fn with_rng_seed(
        id: impl Into<String>,
        transport: Arc<dyn Transport>,
        judge: Arc<dyn AnswerJudge>,
        catalog: PromptCatalog,
        settings: EngineSettings,
        seed: u64,
    ) -> (Self, UnboundedReceiver<SessionMessage>) {
        Self::with_rng(
            id,
            transport,
            judge,
            catalog,
            settings,
            StdRng::seed_from_u64(seed),
        )
    }

    fn with_rng(
        id: impl Into<String>,
        transport: Arc<dyn Transport>,
        judge: Arc<dyn AnswerJudge>,
        catalog: PromptCatalog,
        settings: EngineSettings,
        rng: StdRng,
    ) -> (Self, UnboundedReceiver<SessionMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Self {
            id: id.into(),
            transport,
            judge,
            catalog,
            settings,
            tx,
            rng,
            players: HashMap::new(),
            master: None,
            locked: false,
            state: SessionState::Config,
            configuration: SessionConfiguration::default(),
            hands: HashMap::new(),
            play_deck: Deck::empty(),
            play_discard: Vec::new(),
            prompt_deck: Deck::empty(),
            prompt_discard: Vec::new(),
            current_list_card: None,
            current_list: None,
            order: TurnOrder::new(),
            turn_timer: OneShotTimer::new(),
            turn_deadline: None,
            deletion_timer: OneShotTimer::new(),
            answers: Vec::new(),
            scores: HashMap::new(),
            round: 0,
        };
        (session, rx)
    }

    /// Spawn the session as a detached actor and return its handle
    pub fn spawn(
        id: impl Into<String>,
        transport: Arc<dyn Transport>,
        judge: Arc<dyn AnswerJudge>,
        catalog: PromptCatalog,
        settings: EngineSettings,
    ) -> SessionHandle {
        let (session, rx) = Self::new(id, transport, judge, catalog, settings);
        let handle = SessionHandle::new(session.tx.clone());
        tokio::spawn(session.run(rx));
        handle
    }

    /// Drive the actor loop until every handle is dropped
    pub async fn run(mut self, mut rx: UnboundedReceiver<SessionMessage>) {
        while let Some(message) = rx.recv().await {
            self.handle_message(message);
        }
        debug!(session = %self.id, "session channel closed, actor stopping");
    }

    /// Process one inbound message to completion
    pub fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Join {
                connection,
                uuid,
                pseudonym,
            } => self.join(connection, uuid, pseudonym),
            SessionMessage::Command { uuid, command } => self.handle_command(uuid, command),
            SessionMessage::TurnTimeout { generation } => self.handle_turn_timeout(generation),
            SessionMessage::DeletionDue { generation } => self.handle_deletion_due(generation),
            SessionMessage::RoundPauseElapsed { winner, round } => {
                self.handle_round_pause_elapsed(winner, round)
            }
        }
    }

    fn handle_command(&mut self, uuid: Uuid, command: ClientCommand) {
        match command {
            ClientCommand::Leave => self.left(uuid),
            ClientCommand::Kick { target } => self.kick_by_master(uuid, target),
            ClientCommand::SetLock { locked } => self.set_lock(uuid, locked),
            ClientCommand::SwitchMaster { target } => self.switch_master(uuid, target),
            ClientCommand::UpdateConfiguration { configuration } => {
                self.update_configuration(uuid, &configuration)
            }
            ClientCommand::StartGame => self.start(uuid),
            ClientCommand::PlayCard(payload) => self.play_card(uuid, &payload),
            ClientCommand::Restart => self.restart(uuid),
        }
    }

    // ---- roster ----------------------------------------------------------

    /// Admit a connection under a client-held identity. Idempotent.
    pub fn join(&mut self, connection: ConnectionId, uuid: Uuid, pseudonym: String) {
        let becomes_master =
            self.online_players().next().is_none() || self.master == Some(uuid);

        match self.players.get_mut(&uuid) {
            Some(player) => {
                player.online = true;
                player.connection = Some(connection);
                player.pseudonym = pseudonym;
                player.master = becomes_master;
            }
            None => {
                if self.locked {
                    info!(session = %self.id, player = %uuid, "locked session, rejecting join");
                    self.kick(uuid, true, Some(connection));
                    return;
                }

                self.players.insert(
                    uuid,
                    Player::new(uuid, pseudonym, becomes_master, connection),
                );
                self.transport.increment_stat("players");
            }
        }

        if becomes_master {
            self.master = Some(uuid);
        }

        info!(session = %self.id, player = %uuid, "player joined");

        let public = match self.players.get(&uuid) {
            Some(player) => player.public(),
            None => return,
        };
        self.broadcast(&ServerEvent::PlayerJoin { player: public });

        self.catch_up(&uuid);
        self.update_master_presence();

        self.deletion_timer.cancel();
    }

    /// Mark a player offline and take them out of the active round
    pub fn left(&mut self, uuid: Uuid) {
        let Some(player) = self.players.get_mut(&uuid) else {
            return;
        };
        player.online = false;
        player.connection = None;

        info!(session = %self.id, player = %uuid, "player left");

        if self.order.remove(&uuid) {
            self.hands.remove(&uuid);

            if self.state == SessionState::Turn {
                self.turn_timer.cancel();
                self.turn_deadline = None;

                if !self.order.is_empty() {
                    self.begin_turn();
                }
            }
        }

        self.broadcast(&ServerEvent::PlayerLeft {
            player: PlayerRef { uuid },
        });

        if self.online_players().next().is_none() {
            self.start_deletion_countdown();
        }
    }

    /// Remove a player outright: no offline retention, score and hand dropped
    fn kick(&mut self, target: Uuid, locked: bool, connection_override: Option<ConnectionId>) {
        let connection = connection_override
            .or_else(|| self.players.get(&target).and_then(|p| p.connection.clone()));
        if let Some(connection) = &connection {
            self.transport.send(connection, &ServerEvent::Kick { locked });
        }

        if self.players.remove(&target).is_some() {
            self.hands.remove(&target);
            self.scores.remove(&target);
            self.broadcast(&ServerEvent::PlayerLeft {
                player: PlayerRef { uuid: target },
            });
        }
    }

    pub fn kick_by_master(&mut self, uuid: Uuid, target: Uuid) {
        if self.master != Some(uuid) {
            return;
        }
        self.kick(target, false, None);
    }

    pub fn set_lock(&mut self, uuid: Uuid, locked: bool) {
        if self.master != Some(uuid) {
            return;
        }
        self.locked = locked;
        self.broadcast(&ServerEvent::GameLocked { locked });
    }

    pub fn switch_master(&mut self, uuid: Uuid, target: Uuid) {
        if self.master != Some(uuid) {
            return;
        }
        self.elect_master(target);
    }

    fn update_master_presence(&mut self) {
        let master_online = self
            .master
            .and_then(|m| self.players.get(&m))
            .map_or(false, |p| p.online);
        if !master_online {
            self.elect_random_master();
        }
    }

    fn elect_random_master(&mut self) {
        let online = self.online_uuids();
        if online.is_empty() {
            self.master = None;
            return;
        }
        let chosen = online[self.rng.gen_range(0..online.len())];
        self.elect_master(chosen);
    }

    fn elect_master(&mut self, new_master: Uuid) {
        if !self.players.contains_key(&new_master) {
            return;
        }

        if let Some(old) = self.master.and_then(|m| self.players.get_mut(&m)) {
            old.master = false;
        }
        if let Some(player) = self.players.get_mut(&new_master) {
            player.master = true;
        }

        self.master = Some(new_master);
        self.broadcast(&ServerEvent::SetMaster {
            master: PlayerRef { uuid: new_master },
        });
    }

    // ---- configuration and lifecycle -------------------------------------

    /// Apply a configuration update from the master; echo the current
    /// configuration back to anyone else so their UI cannot drift.
    pub fn update_configuration(&mut self, uuid: Uuid, update: &ConfigurationUpdate) {
        if self.state != SessionState::Config {
            return;
        }
        if !self.players.contains_key(&uuid) {
            return;
        }
        if self.master != Some(uuid) {
            let event = ServerEvent::ConfigUpdated {
                configuration: self.configuration.clone(),
            };
            self.send_to(&uuid, &event);
            return;
        }

        self.configuration = SessionConfiguration::from_update(update);
        self.broadcast(&ServerEvent::ConfigUpdated {
            configuration: self.configuration.clone(),
        });
    }

    /// Master-only: begin the first round. Requires at least two online players.
    pub fn start(&mut self, uuid: Uuid) {
        if !self.players.contains_key(&uuid) {
            return;
        }
        if self.master != Some(uuid) {
            return;
        }
        if self.online_players().count() < 2 {
            return;
        }

        info!(session = %self.id, "starting game");
        self.transport.increment_stat("games");
        self.setup_new_round(None);
    }

    /// Master-only: back to the lobby, scores cleared, offline players purged
    pub fn restart(&mut self, uuid: Uuid) {
        if self.master != Some(uuid) {
            return;
        }

        info!(session = %self.id, "restarting game");

        self.state = SessionState::Config;
        self.round = 0;
        self.scores.clear();
        self.answers.clear();
        self.current_list = None;
        self.current_list_card = None;
        self.order.clear();
        self.hands.clear();
        self.turn_deadline = None;
        self.turn_timer.cancel();

        self.players.retain(|_, player| player.online);

        self.broadcast(&ServerEvent::GameRestarted {});
        self.broadcast(&ServerEvent::ConfigUpdated {
            configuration: self.configuration.clone(),
        });
    }

    // ---- round setup -----------------------------------------------------

    fn setup_new_round(&mut self, starting_player: Option<Uuid>) {
        self.state = SessionState::RoundSetup;
        self.round += 1;
        self.transport.increment_stat("rounds");
        self.answers.clear();

        self.play_deck = deck::build_play_deck(&mut self.rng);
        self.play_discard.clear();
        self.prompt_deck = deck::build_prompt_deck(&self.catalog, &mut self.rng);
        self.prompt_discard.clear();

        // Stable base order so a seeded RNG reproduces the permutation
        let mut seats = self.online_uuids();
        seats.sort();
        if seats.is_empty() {
            self.start_deletion_countdown();
            return;
        }
        seats.shuffle(&mut self.rng);

        self.order.reset(seats);
        if let Some(leader) = starting_player {
            self.order.rotate_to(&leader);
        }
        self.turn_deadline = None;

        debug!(session = %self.id, round = self.round, "round setup");

        self.hands.clear();
        let hand_size = self.settings.hand_size;
        for uuid in self.order.seats().to_vec() {
            let hand = self.play_deck.draw(hand_size);
            self.hands.insert(uuid, hand);
            self.send_hand(&uuid);
        }

        self.ensure_prompt_deck();
        match self.prompt_deck.draw(1).pop() {
            Some(card) => {
                self.prompt_discard.push(card.clone());
                self.current_list = Some(deck::pick_list_option(Some(&card), &mut self.rng));
                self.current_list_card = Some(card);
            }
            None => {
                self.current_list_card = None;
                self.current_list = Some(String::new());
            }
        }

        self.broadcast_snapshot();
        self.state = SessionState::Turn;
        self.begin_turn();
    }

    // ---- turn scheduling -------------------------------------------------

    fn current_turn_duration(&self) -> u64 {
        let last_card = self
            .order
            .current_player()
            .and_then(|uuid| self.hands.get(&uuid))
            .map_or(false, |hand| hand.len() == 1);
        if last_card {
            self.settings.last_card_turn_duration_ms
        } else {
            self.settings.turn_duration_ms
        }
    }

    /// Arm the deadline for the current seat and announce the turn.
    /// Arming always cancels the previous deadline first.
    fn begin_turn(&mut self) {
        if self.order.is_empty() {
            self.start_deletion_countdown();
            return;
        }
        let Some(player) = self.order.current_player() else {
            return;
        };

        let duration = self.current_turn_duration();
        let deadline = Utc::now().timestamp_millis() + duration as i64;
        self.turn_deadline = Some(deadline);
        self.turn_timer.arm(duration, &self.tx, |generation| {
            SessionMessage::TurnTimeout { generation }
        });

        self.broadcast(&ServerEvent::TurnStarted {
            player,
            deadline,
            duration,
            list: self.current_list.clone(),
            round: self.round,
        });
    }

    fn advance_turn(&mut self) {
        self.order.advance();
        self.begin_turn();
    }

    fn handle_turn_timeout(&mut self, generation: u64) {
        if !self.turn_timer.is_live(generation) {
            return;
        }
        self.turn_timer.fired();

        if self.state != SessionState::Turn {
            return;
        }
        let Some(player) = self.order.current_player() else {
            return;
        };

        warn!(session = %self.id, player = %player, "turn timed out");
        self.apply_penalty_draw(player, 1, PenaltyReason::Timeout);
        self.broadcast(&ServerEvent::TurnTimeout { player });
        self.advance_turn();
    }

    // ---- card play -------------------------------------------------------

    /// Play a card from the current player's hand. Out-of-turn, wrong-state
    /// and unknown-card submissions are silently dropped.
    pub fn play_card(&mut self, uuid: Uuid, payload: &PlayCardPayload) {
        if self.state != SessionState::Turn {
            return;
        }
        if self.order.current_player() != Some(uuid) {
            return;
        }

        let Some(card) = self
            .hands
            .get(&uuid)
            .and_then(|hand| hand.iter().find(|c| c.id == payload.card_id))
            .cloned()
        else {
            return;
        };

        match card.kind {
            CardKind::Letter { letter, penalty } => {
                self.process_letter_card(uuid, &card, letter, penalty, payload)
            }
            CardKind::Action { action } => self.process_action_card(uuid, &card, action, payload),
            // List cards never sit in hands
            CardKind::List { .. } => {}
        }
    }

    fn process_letter_card(
        &mut self,
        uuid: Uuid,
        card: &Card,
        letter: char,
        penalty: u8,
        payload: &PlayCardPayload,
    ) {
        let answer = payload.answer.as_deref().unwrap_or("").trim().to_string();

        if answer.is_empty() {
            self.refuse_answer(uuid, PenaltyReason::Empty);
            return;
        }
        if !self.judge.is_answer_valid(letter, &answer) {
            self.refuse_answer(uuid, PenaltyReason::InvalidLetter);
            return;
        }
        if self
            .answers
            .iter()
            .any(|entry| self.judge.answers_equivalent(&entry.answer, &answer))
        {
            self.refuse_answer(uuid, PenaltyReason::Duplicate);
            return;
        }

        let Some(removed) = self.remove_card_from_hand(&uuid, card.id) else {
            return;
        };
        self.play_discard.push(removed);
        self.answers.push(AnswerRecord {
            uuid,
            letter,
            answer: answer.clone(),
        });

        let targets = self.penalty_targets(&uuid, penalty);
        for target in &targets {
            self.draw_cards_for_player(*target, 1);
        }

        self.broadcast(&ServerEvent::CardPlayed {
            player: uuid,
            card: PlayedCard::Letter { letter, penalty },
            answer: Some(answer),
        });
        if penalty > 0 {
            self.broadcast(&ServerEvent::PenaltyApplied {
                player: uuid,
                amount: penalty,
                targets,
            });
        }

        if self.hands.get(&uuid).map_or(true, |hand| hand.is_empty()) {
            self.handle_round_win(uuid);
        } else {
            self.advance_turn();
        }
    }

    /// A misplay never stalls play: refuse, penalize, advance
    fn refuse_answer(&mut self, uuid: Uuid, reason: PenaltyReason) {
        debug!(session = %self.id, player = %uuid, ?reason, "answer refused");
        self.broadcast(&ServerEvent::AnswerRefused {
            player: uuid,
            reason,
        });
        self.apply_penalty_draw(uuid, 1, reason);
        self.advance_turn();
    }

    fn process_action_card(
        &mut self,
        uuid: Uuid,
        card: &Card,
        action: ActionKind,
        payload: &PlayCardPayload,
    ) {
        let Some(removed) = self.remove_card_from_hand(&uuid, card.id) else {
            return;
        };
        self.play_discard.push(removed);

        match action {
            ActionKind::Switch => {
                let direction = self.order.flip_direction();
                self.broadcast(&ServerEvent::DirectionChanged { direction });
            }
            ActionKind::Stop => {
                self.order.set_skip();
                self.broadcast(&ServerEvent::SkipNext { player: uuid });
            }
            ActionKind::Swap => self.handle_swap(uuid, payload.target_uuid),
            ActionKind::CrackList => self.handle_crack_list(uuid),
        }

        // An action card alone can never end a round
        if self.hands.get(&uuid).map_or(false, |hand| hand.is_empty()) {
            self.draw_cards_for_player(uuid, 1);
        }

        self.broadcast(&ServerEvent::CardPlayed {
            player: uuid,
            card: PlayedCard::Action { action },
            answer: None,
        });

        self.advance_turn();
    }

    fn handle_swap(&mut self, author: Uuid, requested: Option<Uuid>) {
        let target = requested
            .filter(|t| *t != author && self.hands.contains_key(t))
            .or_else(|| {
                self.order
                    .seats()
                    .iter()
                    .find(|seat| **seat != author)
                    .copied()
            });
        let Some(target) = target else {
            return;
        };

        let author_hand = self.hands.remove(&author).unwrap_or_default();
        let target_hand = self.hands.remove(&target).unwrap_or_default();

        let mut sizes = HashMap::new();
        sizes.insert(author, target_hand.len());
        sizes.insert(target, author_hand.len());

        self.hands.insert(author, target_hand);
        self.hands.insert(target, author_hand);
        self.send_hand(&author);
        self.send_hand(&target);

        self.broadcast(&ServerEvent::HandsSwapped {
            author,
            target,
            sizes,
        });
    }

    fn handle_crack_list(&mut self, uuid: Uuid) {
        self.ensure_prompt_deck();
        let list = match self.prompt_deck.draw(1).pop() {
            Some(card) => {
                self.prompt_discard.push(card.clone());
                let list = deck::pick_list_option(Some(&card), &mut self.rng);
                self.current_list_card = Some(card);
                list
            }
            None => {
                self.current_list_card = None;
                String::new()
            }
        };
        self.current_list = Some(list.clone());

        self.broadcast(&ServerEvent::ListChanged { player: uuid, list });
    }

    // ---- penalties and card supply ---------------------------------------

    /// Opponents charged for a played letter card, round-robin starting at
    /// the seat right after the author's absolute turn position.
    fn penalty_targets(&self, author: &Uuid, amount: u8) -> Vec<Uuid> {
        if amount == 0 {
            return Vec::new();
        }

        let opponents: Vec<Uuid> = self
            .order
            .seats()
            .iter()
            .filter(|seat| *seat != author)
            .copied()
            .collect();
        if opponents.is_empty() {
            return Vec::new();
        }

        (0..amount as usize)
            .map(|i| opponents[(self.order.current_index() + 1 + i) % opponents.len()])
            .collect()
    }

    fn apply_penalty_draw(&mut self, uuid: Uuid, amount: u8, reason: PenaltyReason) {
        self.draw_cards_for_player(uuid, amount);
        self.broadcast(&ServerEvent::PenaltyDraw {
            player: uuid,
            amount,
            reason,
        });
    }

    fn draw_cards_for_player(&mut self, uuid: Uuid, amount: u8) {
        for _ in 0..amount {
            self.ensure_play_deck();
            let Some(card) = self.play_deck.draw(1).pop() else {
                break;
            };
            self.hands.entry(uuid).or_default().push(card);
        }
        self.send_hand(&uuid);
    }

    fn ensure_play_deck(&mut self) {
        if !self.play_deck.is_empty() {
            return;
        }
        let deck = std::mem::take(&mut self.play_deck);
        self.play_deck = deck.ensure(&mut self.play_discard, &mut self.rng);
    }

    fn ensure_prompt_deck(&mut self) {
        if !self.prompt_deck.is_empty() {
            return;
        }
        let deck = std::mem::take(&mut self.prompt_deck);
        self.prompt_deck = deck.ensure(&mut self.prompt_discard, &mut self.rng);
    }

    fn remove_card_from_hand(&mut self, uuid: &Uuid, card_id: Uuid) -> Option<Card> {
        let hand = self.hands.get_mut(uuid)?;
        let index = hand.iter().position(|card| card.id == card_id)?;
        let card = hand.remove(index);
        self.send_hand(uuid);
        Some(card)
    }

    // ---- round and game end ----------------------------------------------

    fn handle_round_win(&mut self, winner: Uuid) {
        self.turn_timer.cancel();
        self.turn_deadline = None;
        self.state = SessionState::RoundEnd;

        let score = self.scores.entry(winner).or_insert(0);
        *score += 1;
        let score = *score;

        info!(session = %self.id, winner = %winner, score, "round won");

        if score >= self.configuration.points_to_win {
            self.end_game(winner);
            return;
        }

        self.broadcast(&ServerEvent::RoundEnded {
            winner,
            scores: self.scores.clone(),
        });

        let tx = self.tx.clone();
        let round = self.round;
        let pause = self.settings.round_pause_ms;
        tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(pause)).await;
            let _ = tx.send(SessionMessage::RoundPauseElapsed { winner, round });
        });
    }

    /// Guarded continuation of the round pause: ignored if the session was
    /// restarted or torn down in the meantime.
    fn handle_round_pause_elapsed(&mut self, winner: Uuid, round: u32) {
        if self.state != SessionState::RoundEnd || self.round != round {
            return;
        }
        self.setup_new_round(Some(winner));
    }

    fn end_game(&mut self, winner: Uuid) {
        self.state = SessionState::End;
        info!(session = %self.id, winner = %winner, "game ended");
        self.broadcast(&ServerEvent::GameEnded {
            winner,
            scores: self.scores.clone(),
        });
    }

    // ---- session deletion ------------------------------------------------

    fn start_deletion_countdown(&mut self) {
        info!(session = %self.id, "no players online, arming deletion countdown");
        self.deletion_timer
            .arm(self.settings.deletion_threshold_ms, &self.tx, |generation| {
                SessionMessage::DeletionDue { generation }
            });
    }

    fn handle_deletion_due(&mut self, generation: u64) {
        if !self.deletion_timer.is_live(generation) {
            return;
        }
        self.deletion_timer.fired();

        info!(session = %self.id, "deletion countdown elapsed, destroying session");
        self.turn_timer.cancel();
        self.transport.delete_session(&self.id);
    }

    // ---- messaging -------------------------------------------------------

    fn broadcast(&self, event: &ServerEvent) {
        for player in self.players.values().filter(|p| p.online) {
            if let Some(connection) = &player.connection {
                self.transport.send(connection, event);
            }
        }
    }

    fn send_to(&self, uuid: &Uuid, event: &ServerEvent) {
        let Some(player) = self.players.get(uuid) else {
            return;
        };
        if !player.online {
            return;
        }
        if let Some(connection) = &player.connection {
            self.transport.send(connection, event);
        }
    }

    fn send_hand(&self, uuid: &Uuid) {
        let hand = self.hands.get(uuid).cloned().unwrap_or_default();
        self.send_to(uuid, &ServerEvent::HandUpdated { hand });
    }

    fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            state: self.state,
            round: self.round,
            list: self.current_list.clone(),
            players: self.order.seats().to_vec(),
            current_player: self.order.current_player(),
            direction: self.order.direction(),
            scores: self.scores.clone(),
            deadline: self.turn_deadline,
            duration: (self.state == SessionState::Turn).then(|| self.current_turn_duration()),
            configuration: self.configuration.clone(),
        }
    }

    fn broadcast_snapshot(&self) {
        self.broadcast(&ServerEvent::CatchUpGameState(self.snapshot()));
    }

    /// Full state snapshot plus private hand, sent to one player so client
    /// and server converge without replaying history
    fn catch_up(&self, uuid: &Uuid) {
        self.send_to(uuid, &ServerEvent::CatchUpGameState(self.snapshot()));
        self.send_hand(uuid);
    }

    // ---- introspection ---------------------------------------------------

    fn online_players(&self) -> impl Iterator<Item = &Player> {
        self.players.values().filter(|p| p.online)
    }

    fn online_uuids(&self) -> Vec<Uuid> {
        self.online_players().map(|p| p.uuid).collect()
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn configuration(&self) -> &SessionConfiguration {
        &self.configuration
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn master_uuid(&self) -> Option<Uuid> {
        self.master
    }

    pub fn player(&self, uuid: &Uuid) -> Option<&Player> {
        self.players.get(uuid)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn current_player(&self) -> Option<Uuid> {
        self.order.current_player()
    }

    pub fn direction(&self) -> i8 {
        self.order.direction()
    }

    pub fn turn_order(&self) -> &[Uuid] {
        self.order.seats()
    }

    pub fn hand(&self, uuid: &Uuid) -> Option<&[Card]> {
        self.hands.get(uuid).map(|h| h.as_slice())
    }

    pub fn score(&self, uuid: &Uuid) -> u32 {
        self.scores.get(uuid).copied().unwrap_or(0)
    }

    pub fn answers(&self) -> &[AnswerRecord] {
        &self.answers
    }

    pub fn current_list(&self) -> Option<&str> {
        self.current_list.as_deref()
    }

    pub fn turn_deadline(&self) -> Option<i64> {
        self.turn_deadline
    }
}
