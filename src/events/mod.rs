//! Wire surface: outbound events and inbound commands
//!
//! Every payload the session emits or accepts is defined here with its exact
//! JSON shape: kebab-case event names, camelCase field names. The transport
//! layer serializes [`ServerEvent`] values and parses [`ClientCommand`] values;
//! the session itself never touches raw JSON.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{ConfigurationUpdate, SessionConfiguration};
use crate::deck::{ActionKind, Card};
use crate::session::SessionState;

/// Public projection of a player, safe to broadcast
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicPlayer {
    pub uuid: Uuid,
    pub pseudonym: String,
    pub ready: bool,
    pub master: bool,
    pub online: bool,
}

/// Minimal player reference used by events that only need an identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub uuid: Uuid,
}

/// Why a penalty draw was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PenaltyReason {
    Empty,
    InvalidLetter,
    Duplicate,
    Timeout,
}

/// Reduced card view broadcast when a card is played (no identifier)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayedCard {
    #[serde(rename = "LETTER")]
    Letter { letter: char, penalty: u8 },
    #[serde(rename = "ACTION")]
    Action { action: ActionKind },
}

/// Full game state snapshot, sent on (re)connection and after round setup so
/// clients converge without replaying history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub state: SessionState,
    pub round: u32,
    pub list: Option<String>,
    pub players: Vec<Uuid>,
    pub current_player: Option<Uuid>,
    pub direction: i8,
    pub scores: HashMap<Uuid, u32>,
    pub deadline: Option<i64>,
    pub duration: Option<u64>,
    pub configuration: SessionConfiguration,
}

/// Events broadcast or unicast to clients
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    PlayerJoin {
        player: PublicPlayer,
    },
    PlayerLeft {
        player: PlayerRef,
    },
    Kick {
        locked: bool,
    },
    GameLocked {
        locked: bool,
    },
    SetMaster {
        master: PlayerRef,
    },
    ConfigUpdated {
        configuration: SessionConfiguration,
    },
    CatchUpGameState(GameSnapshot),
    HandUpdated {
        hand: Vec<Card>,
    },
    #[serde(rename_all = "camelCase")]
    TurnStarted {
        player: Uuid,
        deadline: i64,
        duration: u64,
        list: Option<String>,
        round: u32,
    },
    CardPlayed {
        player: Uuid,
        card: PlayedCard,
        #[serde(skip_serializing_if = "Option::is_none")]
        answer: Option<String>,
    },
    PenaltyApplied {
        player: Uuid,
        amount: u8,
        targets: Vec<Uuid>,
    },
    PenaltyDraw {
        player: Uuid,
        amount: u8,
        reason: PenaltyReason,
    },
    AnswerRefused {
        player: Uuid,
        reason: PenaltyReason,
    },
    TurnTimeout {
        player: Uuid,
    },
    DirectionChanged {
        direction: i8,
    },
    SkipNext {
        player: Uuid,
    },
    ListChanged {
        player: Uuid,
        list: String,
    },
    HandsSwapped {
        author: Uuid,
        target: Uuid,
        sizes: HashMap<Uuid, usize>,
    },
    RoundEnded {
        winner: Uuid,
        scores: HashMap<Uuid, u32>,
    },
    GameEnded {
        winner: Uuid,
        scores: HashMap<Uuid, u32>,
    },
    GameRestarted {},
}

impl ServerEvent {
    /// Wire name of this event
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::PlayerJoin { .. } => "player-join",
            ServerEvent::PlayerLeft { .. } => "player-left",
            ServerEvent::Kick { .. } => "kick",
            ServerEvent::GameLocked { .. } => "game-locked",
            ServerEvent::SetMaster { .. } => "set-master",
            ServerEvent::ConfigUpdated { .. } => "config-updated",
            ServerEvent::CatchUpGameState(_) => "catch-up-game-state",
            ServerEvent::HandUpdated { .. } => "hand-updated",
            ServerEvent::TurnStarted { .. } => "turn-started",
            ServerEvent::CardPlayed { .. } => "card-played",
            ServerEvent::PenaltyApplied { .. } => "penalty-applied",
            ServerEvent::PenaltyDraw { .. } => "penalty-draw",
            ServerEvent::AnswerRefused { .. } => "answer-refused",
            ServerEvent::TurnTimeout { .. } => "turn-timeout",
            ServerEvent::DirectionChanged { .. } => "direction-changed",
            ServerEvent::SkipNext { .. } => "skip-next",
            ServerEvent::ListChanged { .. } => "list-changed",
            ServerEvent::HandsSwapped { .. } => "hands-swapped",
            ServerEvent::RoundEnded { .. } => "round-ended",
            ServerEvent::GameEnded { .. } => "game-ended",
            ServerEvent::GameRestarted {} => "game-restarted",
        }
    }
}

/// Payload of a play-card command
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayCardPayload {
    pub card_id: Uuid,
    /// Submitted answer, letter cards only
    #[serde(default)]
    pub answer: Option<String>,
    /// Chosen opponent, SWAP cards only
    #[serde(default)]
    pub target_uuid: Option<Uuid>,
}

/// Commands a connected client may issue
///
/// Join is not listed here: it carries the transport connection reference and
/// enters through [`crate::session::SessionHandle::join`].
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "command", content = "payload", rename_all = "kebab-case")]
pub enum ClientCommand {
    Leave,
    Kick { target: Uuid },
    SetLock { locked: bool },
    SwitchMaster { target: Uuid },
    UpdateConfiguration { configuration: ConfigurationUpdate },
    StartGame,
    PlayCard(PlayCardPayload),
    Restart,
}
