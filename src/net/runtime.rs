// Relay runtime - owns the WebSocket on a background thread and bridges it
// to the synchronous frame loop via channels.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};
use futures::{SinkExt, StreamExt};
use tokio::runtime::Runtime;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::debug;
use crate::net::client::{NetError, RelayCommand, RelayEvent};
use crate::net::protocol::{ClientMessage, ServerMessage};

// Latency probe cadence; results are monitoring-only.
const PING_INTERVAL: Duration = Duration::from_secs(2);
const COMMAND_POLL: Duration = Duration::from_millis(5);
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Spawn the relay thread. The handshake result (session id or connection
/// error) is reported once through `handshake_tx`; everything after flows
/// through the event channel.
pub fn spawn_relay_thread(
    url: String,
    event_tx: mpsc::Sender<RelayEvent>,
    cmd_rx: mpsc::Receiver<RelayCommand>,
    handshake_tx: mpsc::Sender<Result<String, NetError>>,
    connected: Arc<AtomicBool>,
) {
    thread::spawn(move || {
        let rt = match Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                let _ = handshake_tx.send(Err(NetError::Connection(e.to_string())));
                return;
            }
        };

        rt.block_on(async move {
            if let Err(e) = run_relay(url, &event_tx, cmd_rx, handshake_tx, &connected).await {
                debug::log("RELAY_ERROR", &format!("relay runtime stopped: {e}"));
                connected.store(false, Ordering::Relaxed);
                let _ = event_tx.send(RelayEvent::Disconnected);
            }
        });
    });
}

async fn run_relay(
    url: String,
    event_tx: &mpsc::Sender<RelayEvent>,
    cmd_rx: mpsc::Receiver<RelayCommand>,
    handshake_tx: mpsc::Sender<Result<String, NetError>>,
    connected: &AtomicBool,
) -> Result<()> {
    debug::log("RELAY_CONNECT", &format!("connecting to {url}"));
    let ws = match connect_async(&url).await {
        Ok((ws, _)) => ws,
        Err(e) => {
            let _ = handshake_tx.send(Err(NetError::Connection(e.to_string())));
            return Ok(());
        }
    };
    let (mut sink, mut stream) = ws.split();

    // Identity handshake: the caller stays suspended until welcome arrives.
    let welcome = tokio::time::timeout(HANDSHAKE_TIMEOUT, async {
        while let Some(frame) = stream.next().await {
            if let Message::Text(text) = frame? {
                if let Ok(ServerMessage::Welcome { id }) = ServerMessage::from_text(&text) {
                    return Ok(id);
                }
            }
        }
        Err(anyhow!("channel closed before welcome"))
    })
    .await;

    let session_id = match welcome {
        Ok(Ok(id)) => id,
        Ok(Err(e)) => {
            let _ = handshake_tx.send(Err(NetError::Connection(e.to_string())));
            return Ok(());
        }
        Err(_) => {
            let _ = handshake_tx.send(Err(NetError::Connection(
                "timed out waiting for welcome".into(),
            )));
            return Ok(());
        }
    };

    connected.store(true, Ordering::Relaxed);
    debug::log("RELAY_READY", &format!("session id {session_id}"));
    let _ = handshake_tx.send(Ok(session_id));

    let mut ping_timer = tokio::time::interval(PING_INTERVAL);
    let mut poll_timer = tokio::time::interval(COMMAND_POLL);

    'pump: loop {
        tokio::select! {
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(event) = inbound_event(&text) {
                            let _ = event_tx.send(event);
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug::log("RELAY_CLOSED", "server closed the channel");
                        break 'pump;
                    }
                    Some(Ok(_)) => {} // control frames
                    Some(Err(e)) => {
                        debug::log("RELAY_RECV_ERROR", &e.to_string());
                        break 'pump;
                    }
                }
            }
            _ = ping_timer.tick() => {
                let probe = ClientMessage::Ping { client_timestamp: epoch_ms() };
                if send_text(&mut sink, &probe).await.is_err() {
                    break 'pump;
                }
            }
            _ = poll_timer.tick() => {
                loop {
                    match cmd_rx.try_recv() {
                        Ok(RelayCommand::Send(msg)) => {
                            if send_text(&mut sink, &msg).await.is_err() {
                                break 'pump;
                            }
                        }
                        Ok(RelayCommand::Disconnect) => {
                            debug::log("RELAY_DISCONNECT", "local disconnect requested");
                            let _ = sink.send(Message::Close(None)).await;
                            connected.store(false, Ordering::Relaxed);
                            return Ok(());
                        }
                        Err(mpsc::TryRecvError::Empty) => break,
                        Err(mpsc::TryRecvError::Disconnected) => {
                            // Frame loop is gone; nothing left to serve.
                            let _ = sink.send(Message::Close(None)).await;
                            connected.store(false, Ordering::Relaxed);
                            return Ok(());
                        }
                    }
                }
            }
        }
    }

    connected.store(false, Ordering::Relaxed);
    let _ = event_tx.send(RelayEvent::Disconnected);
    Ok(())
}

async fn send_text<S>(sink: &mut S, msg: &ClientMessage) -> Result<()>
where
    S: futures::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let text = msg.to_text()?;
    sink.send(Message::Text(text))
        .await
        .map_err(|e| anyhow!("send failed: {e}"))
}

/// Map an inbound frame to a relay event. Unknown or malformed frames are
/// logged and dropped rather than killing the pump.
fn inbound_event(text: &str) -> Option<RelayEvent> {
    let msg = match ServerMessage::from_text(text) {
        Ok(msg) => msg,
        Err(e) => {
            debug::log("RELAY_PARSE_ERROR", &format!("{e}: {text}"));
            return None;
        }
    };

    Some(match msg {
        // A second welcome is a server quirk, not an event.
        ServerMessage::Welcome { .. } => return None,
        ServerMessage::Waiting => RelayEvent::Waiting,
        ServerMessage::Ready { room_id, players } => RelayEvent::Ready { room_id, players },
        ServerMessage::MatchStart { room_id, config, .. } => {
            RelayEvent::MatchStart { room_id, config }
        }
        ServerMessage::State(snapshot) => RelayEvent::Snapshot(snapshot),
        ServerMessage::Score { scores } => RelayEvent::Score { scores },
        ServerMessage::MatchEnd { scores } => RelayEvent::MatchEnd { scores },
        ServerMessage::PausedChanged {
            is_paused,
            paused_by_seat,
        } => RelayEvent::PauseChanged {
            is_paused,
            paused_by_seat,
        },
        ServerMessage::PeerLeft { id } => RelayEvent::PeerLeft { id },
        ServerMessage::Pong {
            client_timestamp,
            server_timestamp,
        } => {
            let now = epoch_ms();
            let rtt_ms = now.saturating_sub(client_timestamp);
            let offset_ms =
                server_timestamp as i64 - (client_timestamp as i64 + rtt_ms as i64 / 2);
            RelayEvent::Latency { rtt_ms, offset_ms }
        }
        ServerMessage::JoinError { message } => RelayEvent::JoinError { message },
    })
}

fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pong_becomes_latency_sample() {
        let now = epoch_ms();
        let text = format!(
            r#"{{"type":"pong","clientTimestamp":{},"serverTimestamp":{}}}"#,
            now, now
        );
        match inbound_event(&text) {
            Some(RelayEvent::Latency { rtt_ms, .. }) => assert!(rtt_ms < 1000),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn malformed_frames_are_dropped() {
        assert_eq!(inbound_event("not json"), None);
        assert_eq!(inbound_event(r#"{"type":"mystery"}"#), None);
    }

    #[test]
    fn stray_welcome_is_not_an_event() {
        assert_eq!(inbound_event(r#"{"type":"welcome","id":"x"}"#), None);
    }
}
