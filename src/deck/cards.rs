//! Card types and the fixed play-deck composition

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-letter multiplicities in the play deck, roughly following
/// natural-language letter frequency.
pub const LETTER_DISTRIBUTION: [(char, usize); 26] = [
    ('A', 3),
    ('B', 3),
    ('C', 3),
    ('D', 3),
    ('E', 3),
    ('F', 2),
    ('G', 2),
    ('H', 3),
    ('I', 2),
    ('J', 2),
    ('K', 2),
    ('L', 3),
    ('M', 3),
    ('N', 3),
    ('O', 3),
    ('P', 3),
    ('Q', 1),
    ('R', 3),
    ('S', 3),
    ('T', 3),
    ('U', 2),
    ('V', 2),
    ('W', 1),
    ('X', 1),
    ('Y', 1),
    ('Z', 1),
];

/// Action card counts in the play deck
pub const ACTION_DISTRIBUTION: [(ActionKind, usize); 4] = [
    (ActionKind::Switch, 4),
    (ActionKind::Stop, 4),
    (ActionKind::Swap, 4),
    (ActionKind::CrackList, 5),
];

/// Penalty tier for a letter: opponents drawing extra cards when it is played
pub fn penalty_for(letter: char) -> u8 {
    match letter {
        'Q' | 'X' => 3,
        'I' | 'J' | 'K' | 'W' | 'Y' | 'Z' => 2,
        'E' | 'H' | 'O' | 'U' => 1,
        _ => 0,
    }
}

/// Action card effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    /// Flip the turn direction
    Switch,
    /// Skip the next player's turn
    Stop,
    /// Exchange hands with an opponent
    Swap,
    /// Replace the active prompt
    CrackList,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::Switch => "SWITCH",
            ActionKind::Stop => "STOP",
            ActionKind::Swap => "SWAP",
            ActionKind::CrackList => "CRACK_LIST",
        };
        write!(f, "{}", name)
    }
}

/// Card payload, tagged by kind on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CardKind {
    #[serde(rename = "LETTER")]
    Letter { letter: char, penalty: u8 },
    #[serde(rename = "ACTION")]
    Action { action: ActionKind },
    #[serde(rename = "LIST")]
    List { options: Vec<String> },
}

/// A single card with a stable, globally-unique identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: CardKind,
}

impl Card {
    pub fn letter(letter: char) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: CardKind::Letter {
                letter,
                penalty: penalty_for(letter),
            },
        }
    }

    pub fn action(action: ActionKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: CardKind::Action { action },
        }
    }

    pub fn list(options: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: CardKind::List { options },
        }
    }

    pub fn is_letter(&self) -> bool {
        matches!(self.kind, CardKind::Letter { .. })
    }

    pub fn is_action(&self) -> bool {
        matches!(self.kind, CardKind::Action { .. })
    }
}
