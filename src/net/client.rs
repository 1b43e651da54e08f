// Transport handle for the frame loop. The relay runtime lives on its own
// thread; this side is synchronous and non-blocking, bridged by channels
// exactly like the rest of the input pipeline.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;

use crate::game::input::Direction;
use crate::net::protocol::{ClientMessage, MatchSettings, PlayerInfo, StatePayload};

/// Transport-boundary error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetError {
    /// The channel could not be established or the handshake failed.
    /// Surfaced to the user as a retry prompt; never retried automatically.
    Connection(String),
    /// Room not found / full. The connection stays open for another join.
    Room(String),
    /// The runtime thread is gone; every further send would be lost.
    ChannelClosed,
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::Connection(msg) => write!(f, "connection failed: {msg}"),
            NetError::Room(msg) => write!(f, "room error: {msg}"),
            NetError::ChannelClosed => write!(f, "relay channel closed"),
        }
    }
}

impl std::error::Error for NetError {}

/// Commands the frame loop sends to the relay runtime thread.
#[derive(Debug)]
pub enum RelayCommand {
    Send(ClientMessage),
    Disconnect,
}

/// Inbound events, delivered in wire order. One consumer drains these per
/// frame; there is no per-message handler registration.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayEvent {
    Waiting,
    Ready {
        room_id: String,
        players: Vec<PlayerInfo>,
    },
    MatchStart {
        room_id: String,
        config: MatchSettings,
    },
    Snapshot(StatePayload),
    Score {
        scores: [u8; 2],
    },
    MatchEnd {
        scores: [u8; 2],
    },
    PauseChanged {
        is_paused: bool,
        paused_by_seat: Option<u8>,
    },
    PeerLeft {
        id: String,
    },
    /// Periodic ping probe result; monitoring only, never used to correct
    /// the simulation.
    Latency {
        rtt_ms: u64,
        offset_ms: i64,
    },
    JoinError {
        message: String,
    },
    Disconnected,
}

/// The typed contract between a match controller and the relay. The online
/// controller is generic over this, which is also the seam the tests use.
pub trait Transport {
    /// Ephemeral connection identity assigned by the welcome handshake.
    fn session_id(&self) -> &str;

    fn create_match(&self, settings: &MatchSettings) -> Result<(), NetError>;
    fn join_match(&self, room_id: &str) -> Result<(), NetError>;
    fn leave_queue(&self) -> Result<(), NetError>;

    fn send_input(&self, direction: Direction) -> Result<(), NetError>;
    fn send_pause(&self) -> Result<(), NetError>;
    fn send_resume(&self) -> Result<(), NetError>;
    fn send_reset(&self, match_id: &str) -> Result<(), NetError>;

    /// Non-blocking; returns events in delivery order.
    fn poll_event(&self) -> Option<RelayEvent>;

    fn disconnect(&self);
}

/// WebSocket-backed transport handle.
pub struct RelayClient {
    session_id: String,
    tx: mpsc::Sender<RelayCommand>,
    rx: mpsc::Receiver<RelayEvent>,
    connected: Arc<AtomicBool>,
}

impl RelayClient {
    pub fn new(
        session_id: String,
        tx: mpsc::Sender<RelayCommand>,
        rx: mpsc::Receiver<RelayEvent>,
        connected: Arc<AtomicBool>,
    ) -> Self {
        Self {
            session_id,
            tx,
            rx,
            connected,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    fn send(&self, msg: ClientMessage) -> Result<(), NetError> {
        self.tx
            .send(RelayCommand::Send(msg))
            .map_err(|_| NetError::ChannelClosed)
    }
}

impl Transport for RelayClient {
    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn create_match(&self, settings: &MatchSettings) -> Result<(), NetError> {
        self.send(ClientMessage::CreateMatch {
            difficulty: settings.difficulty,
            score_limit: settings.score_limit,
        })
    }

    fn join_match(&self, room_id: &str) -> Result<(), NetError> {
        self.send(ClientMessage::JoinMatch {
            room_id: room_id.to_string(),
        })
    }

    fn leave_queue(&self) -> Result<(), NetError> {
        self.send(ClientMessage::LeaveQueue)
    }

    fn send_input(&self, direction: Direction) -> Result<(), NetError> {
        self.send(ClientMessage::Input { direction })
    }

    fn send_pause(&self) -> Result<(), NetError> {
        self.send(ClientMessage::Pause)
    }

    fn send_resume(&self) -> Result<(), NetError> {
        self.send(ClientMessage::Resume)
    }

    fn send_reset(&self, match_id: &str) -> Result<(), NetError> {
        self.send(ClientMessage::Reset {
            match_id: match_id.to_string(),
        })
    }

    fn poll_event(&self) -> Option<RelayEvent> {
        self.rx.try_recv().ok()
    }

    fn disconnect(&self) {
        let _ = self.tx.send(RelayCommand::Disconnect);
        self.connected.store(false, Ordering::Relaxed);
    }
}
