// Configuration types with defaults matching the built-in behavior.

use crossterm::event::KeyCode;
use serde::{Deserialize, Serialize};

use crate::net::protocol::Difficulty;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub keys: KeyBindings,
    #[serde(default)]
    pub game: GameConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeyBindings {
    // Online: your paddle, whichever seat you were assigned.
    pub move_up: String,
    pub move_down: String,
    pub pause: String,

    // Offline 1v1: each seat has its own movement and pause keys.
    pub left_up: String,
    pub left_down: String,
    pub left_pause: String,
    pub right_up: String,
    pub right_down: String,
    pub right_pause: String,

    pub quit: String,
    pub rematch: String,

    pub menu_up: String,
    pub menu_down: String,
    pub menu_select: String,
    pub menu_back: String,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_up: "W".to_string(),
            move_down: "S".to_string(),
            pause: "P".to_string(),
            left_up: "W".to_string(),
            left_down: "S".to_string(),
            left_pause: "D".to_string(),
            right_up: "Up".to_string(),
            right_down: "Down".to_string(),
            right_pause: "K".to_string(),
            quit: "Q".to_string(),
            rematch: "R".to_string(),
            menu_up: "Up".to_string(),
            menu_down: "Down".to_string(),
            menu_select: "Enter".to_string(),
            menu_back: "Esc".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GameConfig {
    // Defaults offered when creating a match.
    pub difficulty: Difficulty,
    pub score_limit: u8,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Medium,
            score_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DisplayConfig {
    // Target frames per second
    pub target_fps: u64,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self { target_fps: 60 }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
    // Relay WebSocket URL
    pub relay_url: String,

    // Handshake timeout in seconds
    pub connect_timeout_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            relay_url: "wss://netpong-relay.fly.dev".to_string(),
            connect_timeout_secs: 10,
        }
    }
}

/// Match a config binding ("W", "Up", "Enter", "Space", ...) against a
/// crossterm key code.
pub fn key_matches(binding: &str, code: KeyCode) -> bool {
    match code {
        KeyCode::Up => binding.eq_ignore_ascii_case("up"),
        KeyCode::Down => binding.eq_ignore_ascii_case("down"),
        KeyCode::Left => binding.eq_ignore_ascii_case("left"),
        KeyCode::Right => binding.eq_ignore_ascii_case("right"),
        KeyCode::Enter => binding.eq_ignore_ascii_case("enter"),
        KeyCode::Esc => binding.eq_ignore_ascii_case("esc") || binding.eq_ignore_ascii_case("escape"),
        KeyCode::Backspace => binding.eq_ignore_ascii_case("backspace"),
        KeyCode::Char(' ') => binding.eq_ignore_ascii_case("space"),
        KeyCode::Char(c) => {
            let mut chars = binding.chars();
            matches!((chars.next(), chars.next()), (Some(b), None) if b.eq_ignore_ascii_case(&c))
        }
        _ => false,
    }
}
