// Relay wire contract. Every message is a JSON object tagged "type", with
// kebab-case message names and camelCase fields. The channel is ordered and
// reliable (WebSocket over TCP); snapshots carry no sequence numbers and
// correctness is last-write-wins per field.

use serde::{Deserialize, Serialize};

use crate::game::input::Direction;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn label(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    pub fn cycle(self) -> Difficulty {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }
}

impl std::str::FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("unknown difficulty: {other}")),
        }
    }
}

/// Parameters of a match, chosen by the creator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSettings {
    pub difficulty: Difficulty,
    pub score_limit: u8,
}

impl Default for MatchSettings {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::Medium,
            score_limit: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallWire {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PaddleWire {
    pub y: f32,
    pub dy: f32,
}

/// Full authoritative state snapshot. Overwrites the client mirror
/// wholesale; the client never advances these fields itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePayload {
    pub ball: BallWire,
    pub paddles: [PaddleWire; 2],
    pub scores: [u8; 2],
    pub is_counting_down: bool,
    pub countdown_number: u8,
    pub is_ended: bool,
    pub is_paused: bool,
    pub paused_by_seat: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: String,
    pub name: String,
    pub seat: u8,
}

/// Messages sent by the client. Gameplay intents are fire-and-forget: no
/// per-call acknowledgment, corrections arrive via the snapshot stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    CreateMatch {
        difficulty: Difficulty,
        score_limit: u8,
    },
    #[serde(rename_all = "camelCase")]
    JoinMatch { room_id: String },
    LeaveQueue,
    Input { direction: Direction },
    Pause,
    Resume,
    #[serde(rename_all = "camelCase")]
    Reset { match_id: String },
    #[serde(rename_all = "camelCase")]
    Ping { client_timestamp: u64 },
}

/// Messages sent by the relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Identity handshake; completes `connect()`.
    Welcome { id: String },
    Waiting,
    #[serde(rename_all = "camelCase")]
    Ready {
        room_id: String,
        players: Vec<PlayerInfo>,
    },
    #[serde(rename_all = "camelCase")]
    MatchStart {
        room_id: String,
        start_time: u64,
        config: MatchSettings,
    },
    State(StatePayload),
    Score { scores: [u8; 2] },
    MatchEnd { scores: [u8; 2] },
    #[serde(rename_all = "camelCase")]
    PausedChanged {
        is_paused: bool,
        paused_by_seat: Option<u8>,
    },
    PeerLeft { id: String },
    #[serde(rename_all = "camelCase")]
    Pong {
        client_timestamp: u64,
        server_timestamp: u64,
    },
    JoinError { message: String },
}

impl ClientMessage {
    pub fn to_text(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl ServerMessage {
    pub fn from_text(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_use_wire_names() {
        let msg = ClientMessage::CreateMatch {
            difficulty: Difficulty::Medium,
            score_limit: 3,
        };
        let text = msg.to_text().unwrap();
        assert!(text.contains(r#""type":"create-match""#), "{text}");
        assert!(text.contains(r#""difficulty":"medium""#), "{text}");
        assert!(text.contains(r#""scoreLimit":3"#), "{text}");

        let msg = ClientMessage::Input {
            direction: Direction::Up,
        };
        let text = msg.to_text().unwrap();
        assert_eq!(text, r#"{"type":"input","direction":"up"}"#);
    }

    #[test]
    fn state_snapshot_round_trips() {
        let text = r#"{
            "type": "state",
            "ball": {"x": 600.0, "y": 300.0, "dx": -420.0, "dy": 60.0},
            "paddles": [{"y": 255.0, "dy": 0.0}, {"y": 100.0, "dy": 540.0}],
            "scores": [2, 1],
            "isCountingDown": false,
            "countdownNumber": 0,
            "isEnded": false,
            "isPaused": true,
            "pausedBySeat": 0
        }"#;

        let msg = ServerMessage::from_text(text).unwrap();
        let ServerMessage::State(snap) = msg else {
            panic!("expected state message");
        };
        assert_eq!(snap.scores, [2, 1]);
        assert!(snap.is_paused);
        assert_eq!(snap.paused_by_seat, Some(0));
        assert_eq!(snap.ball.dx, -420.0);
    }

    #[test]
    fn ready_and_error_messages_parse() {
        let text = r#"{"type":"ready","roomId":"K4PQ","players":[
            {"id":"a1","name":"ada","seat":0},
            {"id":"b2","name":"bob","seat":1}
        ]}"#;
        let msg = ServerMessage::from_text(text).unwrap();
        match msg {
            ServerMessage::Ready { room_id, players } => {
                assert_eq!(room_id, "K4PQ");
                assert_eq!(players[1].seat, 1);
            }
            other => panic!("unexpected: {other:?}"),
        }

        let msg = ServerMessage::from_text(r#"{"type":"join-error","message":"room full"}"#).unwrap();
        assert_eq!(
            msg,
            ServerMessage::JoinError {
                message: "room full".into()
            }
        );
    }

    #[test]
    fn pong_carries_both_timestamps() {
        let msg = ServerMessage::from_text(
            r#"{"type":"pong","clientTimestamp":1000,"serverTimestamp":1730}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            ServerMessage::Pong {
                client_timestamp: 1000,
                server_timestamp: 1730,
            }
        );
    }

    #[test]
    fn null_paused_by_seat_is_accepted() {
        let text = r#"{
            "type": "paused-changed",
            "isPaused": false,
            "pausedBySeat": null
        }"#;
        let msg = ServerMessage::from_text(text).unwrap();
        assert_eq!(
            msg,
            ServerMessage::PausedChanged {
                is_paused: false,
                paused_by_seat: None,
            }
        );
    }
}
