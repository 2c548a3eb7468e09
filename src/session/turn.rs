//! Turn-order algebra and the cancellable one-shot timers
//!
//! The turn order is an ordered set of seats with a direction, a current
//! index and a one-shot skip flag. All index arithmetic lives here so the
//! controller never computes a seat position by hand.

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::session::SessionMessage;

/// Ordered turn sequence for the active round
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnOrder {
    seats: Vec<Uuid>,
    direction: i8,
    current: usize,
    skip_next: bool,
}

impl TurnOrder {
    pub fn new() -> Self {
        Self {
            seats: Vec::new(),
            direction: 1,
            current: 0,
            skip_next: false,
        }
    }

    /// Install a fresh seat sequence, resetting direction, index and skip flag
    pub fn reset(&mut self, seats: Vec<Uuid>) {
        debug_assert!(no_duplicates(&seats));
        self.seats = seats;
        self.direction = 1;
        self.current = 0;
        self.skip_next = false;
    }

    pub fn clear(&mut self) {
        self.reset(Vec::new());
    }

    pub fn seats(&self) -> &[Uuid] {
        &self.seats
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn contains(&self, uuid: &Uuid) -> bool {
        self.seats.contains(uuid)
    }

    pub fn direction(&self) -> i8 {
        self.direction
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_player(&self) -> Option<Uuid> {
        self.seats.get(self.current).copied()
    }

    pub fn skip_pending(&self) -> bool {
        self.skip_next
    }

    /// Flip the direction of play, returning the new direction
    pub fn flip_direction(&mut self) -> i8 {
        self.direction = -self.direction;
        self.direction
    }

    /// Arm the one-shot skip; consumed by the very next advance, never cascades
    pub fn set_skip(&mut self) {
        self.skip_next = true;
    }

    /// Rotate the sequence so `leader` sits at index 0. No-op if absent.
    pub fn rotate_to(&mut self, leader: &Uuid) {
        if let Some(pos) = self.seats.iter().position(|s| s == leader) {
            self.seats.rotate_left(pos);
        }
    }

    /// Move to the next seat, consuming a pending skip as a second step
    pub fn advance(&mut self) {
        self.step();
        if self.skip_next {
            self.skip_next = false;
            self.step();
        }
    }

    fn step(&mut self) {
        let len = self.seats.len();
        if len == 0 {
            self.current = 0;
            return;
        }
        let next = (self.current as i64 + self.direction as i64).rem_euclid(len as i64);
        self.current = next as usize;
    }

    /// Remove a seat, keeping the current index valid.
    ///
    /// A departing seat at or before the current index shifts the index down
    /// by one (clamped at 0) before the modulo over the new length, so the
    /// turn lands on the expected neighbour.
    pub fn remove(&mut self, uuid: &Uuid) -> bool {
        let Some(idx) = self.seats.iter().position(|s| s == uuid) else {
            return false;
        };

        self.seats.remove(idx);

        if idx <= self.current {
            self.current = self.current.saturating_sub(1);
        }

        if self.seats.is_empty() {
            self.current = 0;
        } else {
            self.current %= self.seats.len();
        }

        true
    }
}

fn no_duplicates(seats: &[Uuid]) -> bool {
    let mut seen = std::collections::HashSet::new();
    seats.iter().all(|s| seen.insert(*s))
}

/// A cancellable one-shot delayed callback.
///
/// Arming always cancels the previous task first and bumps a generation
/// counter; a fired message carrying a stale generation must be ignored by
/// the receiver, which closes the abort race.
#[derive(Debug, Default)]
pub struct OneShotTimer {
    handle: Option<JoinHandle<()>>,
    generation: u64,
}

impl OneShotTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a message to be sent after `duration_ms`, replacing any
    /// outstanding schedule. Returns the generation of the new schedule.
    pub fn arm<F>(&mut self, duration_ms: u64, tx: &UnboundedSender<SessionMessage>, make: F) -> u64
    where
        F: FnOnce(u64) -> SessionMessage + Send + 'static,
    {
        self.cancel();
        self.generation += 1;
        let generation = self.generation;
        let tx = tx.clone();

        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(tokio::time::Duration::from_millis(duration_ms)).await;
            let _ = tx.send(make(generation));
        }));

        generation
    }

    /// Cancel any outstanding schedule and invalidate its generation
    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.generation += 1;
    }

    /// Is the given generation the currently armed one?
    pub fn is_live(&self, generation: u64) -> bool {
        self.handle.is_some() && generation == self.generation
    }

    /// Is any schedule outstanding?
    pub fn is_armed(&self) -> bool {
        self.handle.is_some()
    }

    /// Generation of the most recent arm
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Forget the outstanding schedule once it has fired
    pub fn fired(&mut self) {
        self.handle = None;
    }
}
