//! Deck engine: card generation, shuffling, drawing and recycling
//!
//! Two independent decks exist per round: the play deck (letter and action
//! cards, fixed composition) and the prompt deck (one list card per catalog
//! entry). Drawing never fails: short draws return what is available, and an
//! exhausted deck recycles its discard pile.

pub mod cards;

use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::SessionError;

pub use cards::{penalty_for, ActionKind, Card, CardKind, ACTION_DISTRIBUTION, LETTER_DISTRIBUTION};

/// An ordered pile of cards, drawn from the front
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_cards(cards: Vec<Card>) -> Self {
        Self { cards }
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Split off the first `n` cards. If fewer than `n` remain, returns all
    /// available cards; callers must tolerate short draws.
    pub fn draw(&mut self, n: usize) -> Vec<Card> {
        let n = n.min(self.cards.len());
        self.cards.drain(..n).collect()
    }

    /// Return a ready-to-draw deck, recycling the discard pile if needed.
    ///
    /// A non-empty deck is reshuffled as-is. An empty deck absorbs the
    /// reshuffled discard pile, which is left empty. If both are empty the
    /// result is an empty deck; callers must tolerate zero-card availability.
    pub fn ensure<R: Rng>(mut self, discard: &mut Vec<Card>, rng: &mut R) -> Self {
        if !self.is_empty() || discard.is_empty() {
            self.shuffle(rng);
            return self;
        }

        let mut recycled: Vec<Card> = std::mem::take(discard);
        recycled.shuffle(rng);
        Deck::from_cards(recycled)
    }
}

/// Build the fixed-composition play deck: letters with frequency-based
/// multiplicities and penalties, plus the four action card kinds.
pub fn build_play_deck<R: Rng>(rng: &mut R) -> Deck {
    let mut cards = Vec::new();

    for (letter, count) in LETTER_DISTRIBUTION {
        for _ in 0..count {
            cards.push(Card::letter(letter));
        }
    }

    for (action, count) in ACTION_DISTRIBUTION {
        for _ in 0..count {
            cards.push(Card::action(action));
        }
    }

    let mut deck = Deck::from_cards(cards);
    deck.shuffle(rng);
    deck
}

/// Build the prompt deck: one list card per catalog entry, options verbatim
pub fn build_prompt_deck<R: Rng>(catalog: &PromptCatalog, rng: &mut R) -> Deck {
    let cards = catalog
        .entries()
        .iter()
        .map(|options| Card::list(options.clone()))
        .collect();

    let mut deck = Deck::from_cards(cards);
    deck.shuffle(rng);
    deck
}

/// Uniformly pick one option from a list card's option set.
///
/// A missing card or an empty option set yields an empty string; that is a
/// degenerate prompt, not a fatal condition.
pub fn pick_list_option<R: Rng>(card: Option<&Card>, rng: &mut R) -> String {
    match card.map(|c| &c.kind) {
        Some(CardKind::List { options }) if !options.is_empty() => {
            options[rng.gen_range(0..options.len())].clone()
        }
        _ => String::new(),
    }
}

/// A static collection of category-prompt option sets, supplied at deck-build
/// time by the host
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromptCatalog {
    entries: Vec<Vec<String>>,
}

impl PromptCatalog {
    pub fn new(entries: Vec<Vec<String>>) -> Self {
        Self { entries }
    }

    /// Parse a catalog from a JSON array of option-set arrays
    pub fn from_json_str(json: &str) -> Result<Self, SessionError> {
        let entries: Vec<Vec<String>> = serde_json::from_str(json)
            .map_err(|e| SessionError::Catalog(format!("invalid catalog JSON: {}", e)))?;
        Ok(Self { entries })
    }

    /// Load a catalog from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn entries(&self) -> &[Vec<String>] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
