//! Game session: top-level state machine, turn scheduling and actor plumbing
//!
//! Each session is a single sequential actor: exactly one inbound command or
//! fired timer is processed to completion before the next is considered, so
//! no locking exists inside a session. Sessions are mutually independent.

pub mod controller;
pub mod player;
pub mod turn;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::events::ClientCommand;
use crate::ports::ConnectionId;

pub use controller::{AnswerRecord, GameSession};
pub use player::Player;
pub use turn::{OneShotTimer, TurnOrder};

/// Lifecycle states of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionState {
    /// Lobby: players join, the master edits the configuration
    Config,
    /// Decks are built and hands dealt; transitions to Turn immediately
    RoundSetup,
    /// A turn is active with an armed deadline
    Turn,
    /// A round was won; either the game ends or a new round is pending
    RoundEnd,
    /// Game over; only restart leaves this state
    End,
}

/// Everything the session actor can process: client traffic and fired timers
#[derive(Debug)]
pub enum SessionMessage {
    /// A connection joins (or rejoins) with a client-held identity
    Join {
        connection: ConnectionId,
        uuid: Uuid,
        pseudonym: String,
    },
    /// A parsed command from an identified client
    Command { uuid: Uuid, command: ClientCommand },
    /// The armed turn deadline elapsed
    TurnTimeout { generation: u64 },
    /// The whole-session deletion countdown elapsed
    DeletionDue { generation: u64 },
    /// The pause after a round win elapsed; start the next round
    RoundPauseElapsed { winner: Uuid, round: u32 },
}

/// Clonable handle for feeding messages into a spawned session actor
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: UnboundedSender<SessionMessage>,
}

impl SessionHandle {
    pub(crate) fn new(tx: UnboundedSender<SessionMessage>) -> Self {
        Self { tx }
    }

    /// Deliver a join from the transport layer
    pub fn join(&self, connection: ConnectionId, uuid: Uuid, pseudonym: impl Into<String>) {
        let _ = self.tx.send(SessionMessage::Join {
            connection,
            uuid,
            pseudonym: pseudonym.into(),
        });
    }

    /// Deliver a parsed client command
    pub fn command(&self, uuid: Uuid, command: ClientCommand) {
        let _ = self.tx.send(SessionMessage::Command { uuid, command });
    }

    /// Has the session actor stopped?
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
