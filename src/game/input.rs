use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Movement intent derived from the currently-held keys. This is what goes
/// over the wire: a direction, never a paddle position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    None,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveKey {
    Up,
    Down,
}

/// Held-key tracker for one paddle.
///
/// With keyboard enhancement available, press/release events keep the held
/// set exact. Terminals without release reporting only deliver auto-repeat
/// presses, so each press refreshes a short expiry window and a key counts
/// as released once the window lapses.
#[derive(Debug)]
pub struct HeldKeys {
    up_since: Option<Instant>,
    down_since: Option<Instant>,
    release_reported: bool,
    hold_expiry: Duration,
}

impl HeldKeys {
    const DEFAULT_EXPIRY: Duration = Duration::from_millis(250);

    pub fn new(release_reported: bool) -> Self {
        Self {
            up_since: None,
            down_since: None,
            release_reported,
            hold_expiry: Self::DEFAULT_EXPIRY,
        }
    }

    pub fn press(&mut self, key: MoveKey, now: Instant) {
        match key {
            MoveKey::Up => self.up_since = Some(now),
            MoveKey::Down => self.down_since = Some(now),
        }
    }

    pub fn release(&mut self, key: MoveKey) {
        match key {
            MoveKey::Up => self.up_since = None,
            MoveKey::Down => self.down_since = None,
        }
    }

    pub fn clear(&mut self) {
        self.up_since = None;
        self.down_since = None;
    }

    /// Current intent: up wins over down when both are held.
    pub fn intent(&self, now: Instant) -> Direction {
        if self.is_held(self.up_since, now) {
            Direction::Up
        } else if self.is_held(self.down_since, now) {
            Direction::Down
        } else {
            Direction::None
        }
    }

    fn is_held(&self, since: Option<Instant>, now: Instant) -> bool {
        let Some(at) = since else { return false };
        self.release_reported || now.saturating_duration_since(at) < self.hold_expiry
    }
}

/// Edge-triggered transmission guard: an intent goes out only when it
/// differs from the last one sent, no matter how many ticks observe it.
#[derive(Debug)]
pub struct IntentTracker {
    last_sent: Direction,
}

impl IntentTracker {
    pub fn new() -> Self {
        Self {
            last_sent: Direction::None,
        }
    }

    pub fn update(&mut self, current: Direction) -> Option<Direction> {
        if current == self.last_sent {
            return None;
        }
        self.last_sent = current;
        Some(current)
    }

    pub fn last_sent(&self) -> Direction {
        self.last_sent
    }
}

impl Default for IntentTracker {
    fn default() -> Self {
        Self::new()
    }
}
