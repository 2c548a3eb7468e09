//! Cracklist - server-authoritative session engine for a category +
//! first-letter card game
//!
//! One [`GameSession`] runs one game for a small group of connected players:
//! - a multi-state lifecycle (lobby, round setup, turns, round end, game end)
//! - authoritative turn deadlines with absolute-epoch broadcasts
//! - turn-order algebra: direction reversal, one-shot skip, departure reindex
//! - failure-tolerant card supply with discard recycling
//!
//! Network transport, player identity and answer dictionaries stay outside
//! the engine: the host injects a [`Transport`] and an [`AnswerJudge`] at
//! session construction.

pub mod config;
pub mod deck;
pub mod error;
pub mod events;
pub mod logging;
pub mod ports;
pub mod session;

// Re-export commonly used types for convenience
pub use error::{GameResult, SessionError};

// Re-export configuration types
pub use config::{ConfigurationUpdate, EngineSettings, SessionConfiguration};

// Re-export the deck engine surface
pub use deck::{ActionKind, Card, CardKind, Deck, PromptCatalog};

// Re-export the wire surface
pub use events::{
    ClientCommand, GameSnapshot, PenaltyReason, PlayCardPayload, PlayedCard, PlayerRef,
    PublicPlayer, ServerEvent,
};

// Re-export the consumed ports
pub use ports::{AnswerJudge, ConnectionId, Transport};

// Re-export the session core
pub use session::{
    GameSession, Player, SessionHandle, SessionMessage, SessionState, TurnOrder,
};
