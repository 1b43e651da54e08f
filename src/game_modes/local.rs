// Offline 1v1 on a single keyboard. The client owns physics here, so the
// loop runs in per-frame (variable step) mode instead of fixed ticks.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};
use ratatui::{backend::Backend, Terminal};

use crate::config::{key_matches, Config, KeyBindings};
use crate::debug;
use crate::game::input::{Direction, HeldKeys, MoveKey};
use crate::game::state::Seat;
use crate::game::{physics, MatchState};
use crate::net::protocol::MatchSettings;
use crate::ui;

use super::common::{limit_frame_rate, FrameClock, LoopGuard, Step};
use super::MatchLoop;

pub struct LocalMatch {
    state: MatchState,
    clock: FrameClock,
    guard: LoopGuard,
    held: [HeldKeys; 2],
}

impl LocalMatch {
    pub fn new(settings: &MatchSettings, release_reported: bool, now: Instant) -> Self {
        Self {
            state: MatchState::new(settings, now),
            clock: FrameClock::per_frame(),
            guard: LoopGuard::new(),
            held: [
                HeldKeys::new(release_reported),
                HeldKeys::new(release_reported),
            ],
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn set_surface_probe(&mut self, probe: Box<dyn Fn() -> bool>) {
        self.guard.set_surface_probe(probe);
    }

    fn apply_key(&mut self, key: KeyEvent, keys: &KeyBindings, now: Instant) {
        let code = key.code;
        let seat_keys = [
            (Seat::Left, &keys.left_up, &keys.left_down, &keys.left_pause),
            (
                Seat::Right,
                &keys.right_up,
                &keys.right_down,
                &keys.right_pause,
            ),
        ];

        match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                for (seat, up, down, pause) in seat_keys {
                    if key_matches(up, code) {
                        self.held[seat.index()].press(MoveKey::Up, now);
                    } else if key_matches(down, code) {
                        self.held[seat.index()].press(MoveKey::Down, now);
                    } else if key.kind == KeyEventKind::Press && key_matches(pause, code) {
                        self.toggle_pause(seat);
                    }
                }
                if key.kind == KeyEventKind::Press {
                    if key_matches(&keys.rematch, code) && self.state.phase.is_ended() {
                        self.state.reset(now);
                    } else if key_matches(&keys.quit, code)
                        || code == crossterm::event::KeyCode::Esc
                    {
                        self.shutdown();
                    }
                }
            }
            KeyEventKind::Release => {
                for (seat, up, down, _) in seat_keys {
                    if key_matches(up, code) {
                        self.held[seat.index()].release(MoveKey::Up);
                    } else if key_matches(down, code) {
                        self.held[seat.index()].release(MoveKey::Down);
                    }
                }
            }
        }
    }

    /// Same authority rule as online: only the seat that paused resumes.
    fn toggle_pause(&mut self, seat: Seat) {
        if !self.state.request_pause(seat) {
            self.state.request_resume(seat);
        }
    }

    fn directions(&self, now: Instant) -> [Direction; 2] {
        [self.held[0].intent(now), self.held[1].intent(now)]
    }

    fn render(&self, frame: &mut ratatui::Frame, now: Instant) {
        let view = ui::MatchView {
            your_seat: None,
            rtt_ms: None,
            status: None,
            now,
        };
        ui::render_match(frame, &self.state, &view);
    }

    pub fn shutdown(&mut self) {
        if self.guard.stop() {
            self.state.mark_ended();
            debug::log("MATCH_STOP", "local controller stopped");
        }
    }
}

impl<B: Backend> MatchLoop<B> for LocalMatch {
    fn run(&mut self, terminal: &mut Terminal<B>, config: &Config) -> io::Result<()> {
        debug::log("GAME_START", "local 1v1 mode");
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

            if let Step::Variable(delta) = self.clock.advance(now) {
                let directions = self.directions(now);
                physics::step(&mut self.state, directions, delta.as_secs_f32(), now);
            }

            terminal.draw(|frame| self.render(frame, now))?;
            limit_frame_rate(now, frame_duration);
        }

        self.shutdown();
        Ok(())
    }

    fn shutdown(&mut self) {
        LocalMatch::shutdown(self);
    }
}
