// Relay networking: typed wire contract, transport handle, and the
// background WebSocket runtime.

pub mod client;
pub mod protocol;
pub mod runtime;

pub use client::{NetError, RelayClient, RelayEvent, Transport};
pub use protocol::{ClientMessage, Difficulty, MatchSettings, ServerMessage, StatePayload};

use std::sync::atomic::AtomicBool;
use std::sync::{mpsc, Arc};
use std::time::Duration;

/// Establish the relay channel. Suspends the caller until the identity
/// handshake completes, or fails with `NetError::Connection`. There is no
/// automatic retry; the caller decides whether to try again.
pub fn connect(url: &str, timeout: Duration) -> Result<RelayClient, NetError> {
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let (event_tx, event_rx) = mpsc::channel();
    let (handshake_tx, handshake_rx) = mpsc::channel();
    let connected = Arc::new(AtomicBool::new(false));

    runtime::spawn_relay_thread(
        url.to_string(),
        event_tx,
        cmd_rx,
        handshake_tx,
        connected.clone(),
    );

    let session_id = handshake_rx
        .recv_timeout(timeout)
        .map_err(|_| NetError::Connection("no response from relay".into()))??;

    Ok(RelayClient::new(session_id, cmd_tx, event_rx, connected))
}
