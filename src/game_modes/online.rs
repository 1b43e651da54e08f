use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{backend::Backend, Terminal};

use crate::config::{key_matches, Config, KeyBindings};
use crate::debug;
use crate::game::input::{HeldKeys, IntentTracker, MoveKey};
use crate::game::phase::MatchPhase;
use crate::game::state::{MatchState, Seat};
use crate::menu;
use crate::net::client::{NetError, RelayEvent, Transport};
use crate::net::protocol::MatchSettings;
use crate::ui;

use super::common::{limit_frame_rate, FrameClock, LoopGuard, Step, FIXED_TICK};
use super::{MatchEntry, MatchLoop};

/// Optimistic pause bookkeeping. An intent we sent but the relay has not
/// confirmed yet; it gates duplicate sends and is cleared by any
/// authoritative pause word. It never touches the `paused_by` mirror.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LocalPauseIntent {
    Idle,
    PauseSent,
    ResumeSent,
}

/// The networked 1v1 controller: binds the transport, the frame clock and
/// the match mirror. Logical ticks do no physics - they only forward
/// changed input intents; all visible motion comes from relay snapshots.
pub struct OnlineMatch<T: Transport> {
    transport: T,
    seat: Seat,
    room_id: String,
    state: MatchState,
    clock: FrameClock,
    guard: LoopGuard,
    held: HeldKeys,
    intent: IntentTracker,
    pending_pause: LocalPauseIntent,
    rtt_ms: Option<u64>,
    status: Option<String>,
}

impl<T: Transport> OnlineMatch<T> {
    pub fn new(
        transport: T,
        seat: Seat,
        room_id: String,
        settings: &MatchSettings,
        release_reported: bool,
        now: Instant,
    ) -> Self {
        Self {
            transport,
            seat,
            room_id,
            state: MatchState::new(settings, now),
            clock: FrameClock::fixed(FIXED_TICK),
            guard: LoopGuard::new(),
            held: HeldKeys::new(release_reported),
            intent: IntentTracker::new(),
            pending_pause: LocalPauseIntent::Idle,
            rtt_ms: None,
            status: None,
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn set_surface_probe(&mut self, probe: Box<dyn Fn() -> bool>) {
        self.guard.set_surface_probe(probe);
    }

    /// Apply one inbound relay event to the mirror.
    pub fn handle_event(&mut self, event: RelayEvent, now: Instant) {
        match event {
            RelayEvent::Snapshot(snapshot) => {
                self.state.apply_snapshot(&snapshot, now);
                // The snapshot carries the authoritative pause word.
                self.pending_pause = LocalPauseIntent::Idle;
            }
            RelayEvent::Score { scores } => self.state.apply_score(scores),
            RelayEvent::MatchEnd { scores } => self.state.apply_match_end(scores),
            RelayEvent::PauseChanged {
                is_paused,
                paused_by_seat,
            } => {
                self.state.apply_pause_changed(is_paused, paused_by_seat);
                self.pending_pause = LocalPauseIntent::Idle;
            }
            RelayEvent::PeerLeft { id } => {
                debug::log("PEER_LEFT", &id);
                if !self.state.phase.is_ended() {
                    self.state.force_end(self.seat);
                    self.status = Some("Your opponent left the match".to_string());
                }
            }
            RelayEvent::Disconnected => {
                debug::log("MATCH_DISCONNECT", "relay channel dropped mid-match");
                if !self.state.phase.is_ended() {
                    self.state.force_end(self.seat);
                    self.status = Some("Connection lost".to_string());
                }
            }
            RelayEvent::Latency { rtt_ms, .. } => self.rtt_ms = Some(rtt_ms),
            // Matchmaking chatter after start carries no state.
            RelayEvent::Waiting
            | RelayEvent::Ready { .. }
            | RelayEvent::MatchStart { .. }
            | RelayEvent::JoinError { .. } => {}
        }
    }

    pub fn pump_events(&mut self, now: Instant) {
        while let Some(event) = self.transport.poll_event() {
            self.handle_event(event, now);
        }
    }

    /// One logical tick: forward the input intent if it changed since the
    /// last transmission. No physics runs here.
    pub fn tick(&mut self, now: Instant) {
        if self.state.phase.is_ended() {
            return;
        }
        let current = self.held.intent(now);
        if let Some(changed) = self.intent.update(current) {
            let _ = self.transport.send_input(changed);
        }
    }

    pub fn press_move(&mut self, key: MoveKey, now: Instant) {
        self.held.press(key, now);
    }

    pub fn release_move(&mut self, key: MoveKey) {
        self.held.release(key);
    }

    /// Pause-key handling with the authority rules: the pre-match countdown
    /// cannot be paused away by the peer, and resume is only transmitted by
    /// the seat that paused.
    pub fn press_pause(&mut self) {
        match self.state.phase {
            MatchPhase::Ended => {}
            MatchPhase::CountingDown => {
                // Countdown in progress and we do not hold the pause: the
                // key does nothing, so the peer cannot hijack the pre-match
                // countdown either.
                if self.state.paused_by != Some(self.seat) {
                    return;
                }
            }
            MatchPhase::Playing => {
                if self.pending_pause == LocalPauseIntent::Idle {
                    let _ = self.transport.send_pause();
                    self.pending_pause = LocalPauseIntent::PauseSent;
                }
            }
            MatchPhase::Paused => {
                if self.state.paused_by == Some(self.seat)
                    && self.pending_pause == LocalPauseIntent::Idle
                {
                    let _ = self.transport.send_resume();
                    self.pending_pause = LocalPauseIntent::ResumeSent;
                }
            }
        }
    }

    pub fn press_rematch(&mut self) {
        if self.state.phase.is_ended() {
            let _ = self.transport.send_reset(&self.room_id);
        }
    }

    fn apply_key(&mut self, key: KeyEvent, keys: &KeyBindings, now: Instant) {
        let code = key.code;
        let up = key_matches(&keys.move_up, code) || code == KeyCode::Up;
        let down = key_matches(&keys.move_down, code) || code == KeyCode::Down;

        match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                if up {
                    self.press_move(MoveKey::Up, now);
                } else if down {
                    self.press_move(MoveKey::Down, now);
                } else if key.kind == KeyEventKind::Press {
                    if key_matches(&keys.pause, code) {
                        self.press_pause();
                    } else if key_matches(&keys.rematch, code) {
                        self.press_rematch();
                    } else if key_matches(&keys.quit, code) || code == KeyCode::Esc {
                        self.shutdown();
                    }
                }
            }
            KeyEventKind::Release => {
                if up {
                    self.release_move(MoveKey::Up);
                } else if down {
                    self.release_move(MoveKey::Down);
                }
            }
        }
    }

    pub fn render(&self, frame: &mut ratatui::Frame, now: Instant) {
        let view = ui::MatchView {
            your_seat: Some(self.seat),
            rtt_ms: self.rtt_ms,
            status: self.status.as_deref(),
            now,
        };
        ui::render_match(frame, &self.state, &view);
    }

    /// Teardown interception: every exit path funnels through here, and the
    /// guard makes the cleanup single-shot. The transport is disconnected
    /// and the match marked ended before the normal stop path, so no
    /// orphaned room state survives on the relay.
    pub fn shutdown(&mut self) {
        if self.guard.stop() {
            self.state.mark_ended();
            self.transport.disconnect();
            debug::log("MATCH_STOP", "online controller stopped");
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.guard.is_stopped()
    }
}

impl<B: Backend, T: Transport> MatchLoop<B> for OnlineMatch<T> {
    fn run(&mut self, terminal: &mut Terminal<B>, config: &Config) -> io::Result<()> {
        debug::log("GAME_START", &format!("online match, seat {:?}", self.seat));
        self.clock.reset();
        let frame_duration = Duration::from_millis(1000 / config.display.target_fps.max(1));

        while !self.guard.is_stopped() {
            let now = Instant::now();

            if self.guard.surface_lost() {
                self.shutdown();
                break;
            }

            while event::poll(Duration::ZERO)? {
                if let Event::Key(key) = event::read()? {
                    self.apply_key(key, &config.keys, now);
                }
            }
            if self.guard.is_stopped() {
                break;
            }

            self.pump_events(now);

            if let Step::Fixed(ticks) = self.clock.advance(now) {
                for _ in 0..ticks {
                    self.tick(now);
                }
            }

            terminal.draw(|frame| self.render(frame, now))?;
            limit_frame_rate(now, frame_duration);
        }

        self.shutdown();
        Ok(())
    }

    fn shutdown(&mut self) {
        OnlineMatch::shutdown(self);
    }
}

/// Outcome of the matchmaking lobby.
enum LobbyOutcome {
    Start {
        seat: Seat,
        room_id: String,
        settings: MatchSettings,
    },
    Cancelled,
    Failed(String),
}

/// Enter the online flow: connect, create or join, sit in the lobby until
/// match-start, then hand the connection to an `OnlineMatch` in the slot.
pub fn run_online<B: Backend>(
    terminal: &mut Terminal<B>,
    config: &Config,
    entry: MatchEntry,
    slot: &mut super::ControllerSlot<B>,
    release_reported: bool,
) -> io::Result<()> {
    terminal.draw(|frame| menu::render_connecting(frame, &config.network.relay_url))?;

    let timeout = Duration::from_secs(config.network.connect_timeout_secs.max(1));
    let client = match crate::net::connect(&config.network.relay_url, timeout) {
        Ok(client) => client,
        Err(e) => {
            debug::log("CONNECT_FAILED", &e.to_string());
            menu::show_error_screen(terminal, &e.to_string())?;
            return Ok(());
        }
    };

    let request = match &entry {
        MatchEntry::Create(settings) => client.create_match(settings),
        MatchEntry::Join(room_id) => client.join_match(room_id),
    };
    if request.is_err() {
        menu::show_error_screen(terminal, "relay channel closed")?;
        return Ok(());
    }

    match lobby(terminal, &client)? {
        LobbyOutcome::Start {
            seat,
            room_id,
            // match-start echoes the final settings for both seats
            settings,
        } => {
            let mut controller = OnlineMatch::new(
                client,
                seat,
                room_id,
                &settings,
                release_reported,
                Instant::now(),
            );
            controller.set_surface_probe(super::common::terminal_surface_probe());
            slot.install(Box::new(controller)).run(terminal, config)?;
            slot.clear();
        }
        LobbyOutcome::Cancelled => {
            let _ = client.leave_queue();
            client.disconnect();
        }
        LobbyOutcome::Failed(message) => {
            client.disconnect();
            menu::show_error_screen(terminal, &message)?;
        }
    }
    Ok(())
}

/// Wait for the relay to assemble the room. Shows the room code (with
/// clipboard copy) while waiting, surfaces join errors inline and lets the
/// user re-enter a room code on the same connection.
fn lobby<B: Backend, T: Transport>(
    terminal: &mut Terminal<B>,
    client: &T,
) -> io::Result<LobbyOutcome> {
    let mut room_id: Option<String> = None;
    let mut seat: Option<Seat> = None;
    let mut copy_feedback = String::new();
    let mut code_entry: Option<menu::CodeEntry> = None;

    loop {
        while let Some(event) = client.poll_event() {
            match event {
                RelayEvent::Waiting => {
                    debug::log("LOBBY", "queued, waiting for room");
                }
                RelayEvent::Ready { room_id: id, players } => {
                    debug::log("LOBBY", &format!("room {id} ready"));
                    for player in &players {
                        if player.id == client.session_id() {
                            seat = Seat::from_index(player.seat);
                        }
                    }
                    room_id = Some(id);
                }
                RelayEvent::MatchStart {
                    room_id: id,
                    config: settings,
                } => {
                    let seat = seat.unwrap_or(Seat::Left);
                    return Ok(LobbyOutcome::Start {
                        seat,
                        room_id: id,
                        settings,
                    });
                }
                RelayEvent::JoinError { message } => {
                    debug::log("JOIN_ERROR", &message);
                    // Connection stays open; offer another attempt inline.
                    let error = NetError::Room(message);
                    code_entry = Some(menu::CodeEntry::with_error(error.to_string()));
                }
                RelayEvent::Disconnected => {
                    return Ok(LobbyOutcome::Failed("Connection lost".to_string()));
                }
                _ => {}
            }
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let Some(entry) = code_entry.as_mut() {
                        match entry.apply_key(key.code) {
                            menu::CodeEntryAction::Submit(code) => {
                                if client.join_match(&code).is_err() {
                                    return Ok(LobbyOutcome::Failed(
                                        "relay channel closed".to_string(),
                                    ));
                                }
                                code_entry = None;
                            }
                            menu::CodeEntryAction::Cancel => return Ok(LobbyOutcome::Cancelled),
                            menu::CodeEntryAction::Pending => {}
                        }
                    } else {
                        match key.code {
                            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                                return Ok(LobbyOutcome::Cancelled);
                            }
                            KeyCode::Char('c') | KeyCode::Char('C') => {
                                if let Some(code) = &room_id {
                                    copy_feedback = copy_to_clipboard(code);
                                }
                            }
                            _ => {}
                        }
                    }
                }
            }
        }

        terminal.draw(|frame| {
            if let Some(entry) = &code_entry {
                menu::render_code_entry(frame, entry);
            } else {
                menu::render_waiting_room(frame, room_id.as_deref(), &copy_feedback);
            }
        })?;
    }
}

fn copy_to_clipboard(text: &str) -> String {
    match arboard::Clipboard::new() {
        Ok(mut clipboard) => match clipboard.set_text(text) {
            Ok(_) => "Copied to clipboard!".to_string(),
            Err(e) => format!("Copy failed: {e}"),
        },
        Err(e) => format!("Clipboard unavailable: {e}"),
    }
}
