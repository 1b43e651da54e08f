use std::time::Instant;

use crate::game::phase::{Countdown, MatchPhase};
use crate::net::protocol::{Difficulty, MatchSettings, StatePayload};

// Virtual coordinate system - the "true" field the relay simulates in.
// Both seats see the same virtual field and map it to their own terminal.
pub const FIELD_WIDTH: f32 = 1200.0;
pub const FIELD_HEIGHT: f32 = 600.0;

pub const PADDLE_HEIGHT: f32 = 90.0;
pub const BALL_RADIUS: f32 = 10.0;

/// A participant's side within a match room. Seat 0 is left, seat 1 right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seat {
    Left,
    Right,
}

impl Seat {
    pub fn index(self) -> usize {
        match self {
            Seat::Left => 0,
            Seat::Right => 1,
        }
    }

    pub fn from_index(index: u8) -> Option<Seat> {
        match index {
            0 => Some(Seat::Left),
            1 => Some(Seat::Right),
            _ => None,
        }
    }

    pub fn opponent(self) -> Seat {
        match self {
            Seat::Left => Seat::Right,
            Seat::Right => Seat::Left,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Ball {
    pub x: f32,
    pub y: f32,
    pub dx: f32,
    pub dy: f32,
    pub radius: f32,
    pub base_speed: f32,
    pub speed_increment: f32,
}

impl Ball {
    fn centered(base_speed: f32, speed_increment: f32) -> Self {
        Self {
            x: FIELD_WIDTH / 2.0,
            y: FIELD_HEIGHT / 2.0,
            dx: 0.0,
            dy: 0.0,
            radius: BALL_RADIUS,
            base_speed,
            speed_increment,
        }
    }

    pub fn place(&mut self, x: f32, y: f32, angle: f32, speed: f32) {
        self.x = x;
        self.y = y;
        self.dx = angle.cos() * speed;
        self.dy = angle.sin() * speed;
    }

    pub fn speed(&self) -> f32 {
        (self.dx * self.dx + self.dy * self.dy).sqrt()
    }
}

#[derive(Debug, Clone)]
pub struct Paddle {
    pub y: f32,
    pub height: f32,
    pub dy: f32,
}

impl Paddle {
    fn centered(height: f32) -> Self {
        Self {
            y: FIELD_HEIGHT / 2.0 - height / 2.0,
            height,
            dy: 0.0,
        }
    }
}

/// The match model. Online it is a mirror of the last authoritative
/// snapshot; offline the step function in `physics` mutates it directly.
#[derive(Debug, Clone)]
pub struct MatchState {
    pub ball: Ball,
    pub paddles: [Paddle; 2],
    pub scores: [u8; 2],
    pub score_limit: u8,
    pub phase: MatchPhase,
    pub countdown: Option<Countdown>,
    pub paused_by: Option<Seat>,
    pub winner: Option<Seat>,
}

impl MatchState {
    pub fn new(settings: &MatchSettings, now: Instant) -> Self {
        let base_speed = ball_speed_for(settings.difficulty);
        Self {
            ball: Ball::centered(base_speed, base_speed * 0.08),
            paddles: [Paddle::centered(PADDLE_HEIGHT), Paddle::centered(PADDLE_HEIGHT)],
            scores: [0, 0],
            score_limit: settings.score_limit,
            phase: MatchPhase::CountingDown,
            countdown: Some(Countdown::anchored_at(now)),
            paused_by: None,
            winner: None,
        }
    }

    /// Full rematch reset: scores, winner, ball, paddles, fresh countdown.
    pub fn reset(&mut self, now: Instant) {
        self.scores = [0, 0];
        self.winner = None;
        self.paused_by = None;
        self.ball = Ball::centered(self.ball.base_speed, self.ball.speed_increment);
        for paddle in &mut self.paddles {
            *paddle = Paddle::centered(paddle.height);
        }
        self.begin_countdown(now);
    }

    pub fn begin_countdown(&mut self, now: Instant) {
        self.phase = MatchPhase::CountingDown;
        self.countdown = Some(Countdown::anchored_at(now));
        self.paused_by = None;
    }

    /// Overwrite the mirror from an authoritative snapshot.
    ///
    /// Once `Ended`, snapshots are dropped so the final frame stays frozen.
    /// The one exception is a countdown-active snapshot: the relay issued a
    /// rematch, which must not leave a stale terminal render on screen.
    pub fn apply_snapshot(&mut self, snap: &StatePayload, now: Instant) {
        if self.phase.is_ended() && !snap.is_counting_down {
            return;
        }

        self.ball.x = snap.ball.x;
        self.ball.y = snap.ball.y;
        self.ball.dx = snap.ball.dx;
        self.ball.dy = snap.ball.dy;
        for (paddle, wire) in self.paddles.iter_mut().zip(snap.paddles.iter()) {
            paddle.y = wire.y;
            paddle.dy = wire.dy;
        }
        self.scores = snap.scores;

        if snap.is_ended {
            self.phase = MatchPhase::Ended;
            self.countdown = None;
            self.paused_by = None;
            self.winner = leader(self.scores);
        } else if snap.is_counting_down {
            if self.phase != MatchPhase::CountingDown {
                // Re-anchor so the displayed digit runs off our own clock,
                // and drop any terminal state from a previous round.
                self.countdown = Some(Countdown::anchored_at(now));
                self.winner = None;
            }
            self.phase = MatchPhase::CountingDown;
            self.paused_by = None;
        } else if snap.is_paused {
            match snap.paused_by_seat.and_then(Seat::from_index) {
                Some(seat) => {
                    self.phase = MatchPhase::Paused;
                    self.paused_by = Some(seat);
                }
                // A pause without an owner would break the resume-authority
                // rule; treat the payload as not paused.
                None => {
                    self.phase = MatchPhase::Playing;
                    self.paused_by = None;
                }
            }
            self.countdown = None;
        } else {
            self.phase = MatchPhase::Playing;
            self.countdown = None;
            self.paused_by = None;
            self.winner = None;
        }
    }

    /// Low-latency score path, independent of full snapshots.
    pub fn apply_score(&mut self, scores: [u8; 2]) {
        if self.phase.is_ended() {
            return;
        }
        self.scores = scores;
    }

    pub fn apply_match_end(&mut self, scores: [u8; 2]) {
        if self.phase.is_ended() {
            return;
        }
        self.scores = scores;
        self.phase = MatchPhase::Ended;
        self.countdown = None;
        self.paused_by = None;
        self.winner = leader(scores);
    }

    pub fn apply_pause_changed(&mut self, is_paused: bool, paused_by_seat: Option<u8>) {
        if self.phase.is_ended() {
            return;
        }
        if is_paused {
            if let Some(seat) = paused_by_seat.and_then(Seat::from_index) {
                self.phase = MatchPhase::Paused;
                self.paused_by = Some(seat);
                self.countdown = None;
            }
        } else if self.phase == MatchPhase::Paused {
            self.phase = MatchPhase::Playing;
            self.paused_by = None;
        }
    }

    /// Offline pause request. Records who paused; only that seat resumes.
    pub fn request_pause(&mut self, seat: Seat) -> bool {
        if self.phase != MatchPhase::Playing {
            return false;
        }
        self.phase = MatchPhase::Paused;
        self.paused_by = Some(seat);
        true
    }

    pub fn request_resume(&mut self, seat: Seat) -> bool {
        if self.phase != MatchPhase::Paused || self.paused_by != Some(seat) {
            return false;
        }
        self.phase = MatchPhase::Playing;
        self.paused_by = None;
        true
    }

    /// Fail-safe termination (peer left, connection lost): the given seat
    /// wins without a scored point.
    pub fn force_end(&mut self, winner: Seat) {
        if self.phase.is_ended() {
            return;
        }
        self.phase = MatchPhase::Ended;
        self.countdown = None;
        self.paused_by = None;
        self.winner = Some(winner);
    }

    /// Terminal teardown without declaring a winner (local navigation away).
    pub fn mark_ended(&mut self) {
        if self.phase.is_ended() {
            return;
        }
        self.phase = MatchPhase::Ended;
        self.countdown = None;
        self.paused_by = None;
    }

    /// Offline scoring. Returns true when the match just ended.
    pub fn record_point(&mut self, scorer: Seat, now: Instant) -> bool {
        self.scores[scorer.index()] = self.scores[scorer.index()].saturating_add(1);
        if self.scores[scorer.index()] >= self.score_limit {
            self.phase = MatchPhase::Ended;
            self.countdown = None;
            self.paused_by = None;
            self.winner = Some(scorer);
            true
        } else {
            self.begin_countdown(now);
            false
        }
    }
}

fn leader(scores: [u8; 2]) -> Option<Seat> {
    match scores[0].cmp(&scores[1]) {
        std::cmp::Ordering::Greater => Some(Seat::Left),
        std::cmp::Ordering::Less => Some(Seat::Right),
        std::cmp::Ordering::Equal => None,
    }
}

fn ball_speed_for(difficulty: Difficulty) -> f32 {
    match difficulty {
        Difficulty::Easy => 420.0,
        Difficulty::Medium => 600.0,
        Difficulty::Hard => 780.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::{BallWire, PaddleWire};

    fn settings() -> MatchSettings {
        MatchSettings {
            difficulty: Difficulty::Medium,
            score_limit: 3,
        }
    }

    fn snapshot() -> StatePayload {
        StatePayload {
            ball: BallWire {
                x: 300.0,
                y: 200.0,
                dx: 600.0,
                dy: -120.0,
            },
            paddles: [
                PaddleWire { y: 100.0, dy: 0.0 },
                PaddleWire { y: 400.0, dy: -540.0 },
            ],
            scores: [1, 0],
            is_counting_down: false,
            countdown_number: 0,
            is_ended: false,
            is_paused: false,
            paused_by_seat: None,
        }
    }

    #[test]
    fn snapshot_overwrites_mirror_fields() {
        let now = Instant::now();
        let mut state = MatchState::new(&settings(), now);
        state.apply_snapshot(&snapshot(), now);

        assert_eq!(state.ball.x, 300.0);
        assert_eq!(state.paddles[1].y, 400.0);
        assert_eq!(state.scores, [1, 0]);
        assert_eq!(state.phase, MatchPhase::Playing);
    }

    #[test]
    fn ended_state_is_frozen_against_later_snapshots() {
        let now = Instant::now();
        let mut state = MatchState::new(&settings(), now);

        let mut terminal = snapshot();
        terminal.scores = [3, 1];
        terminal.is_ended = true;
        state.apply_snapshot(&terminal, now);
        assert_eq!(state.phase, MatchPhase::Ended);
        assert_eq!(state.winner, Some(Seat::Left));

        let mut stale = snapshot();
        stale.scores = [3, 2];
        state.apply_snapshot(&stale, now);
        assert_eq!(state.scores, [3, 1]);
        assert_eq!(state.winner, Some(Seat::Left));

        state.apply_score([3, 2]);
        assert_eq!(state.scores, [3, 1]);
    }

    #[test]
    fn rematch_countdown_clears_stale_terminal_state() {
        let now = Instant::now();
        let mut state = MatchState::new(&settings(), now);

        let mut terminal = snapshot();
        terminal.scores = [3, 0];
        terminal.is_ended = true;
        state.apply_snapshot(&terminal, now);
        assert!(state.phase.is_ended());

        let mut rematch = snapshot();
        rematch.scores = [0, 0];
        rematch.is_counting_down = true;
        rematch.countdown_number = 3;
        state.apply_snapshot(&rematch, now);

        assert_eq!(state.phase, MatchPhase::CountingDown);
        assert_eq!(state.winner, None);
        assert!(state.countdown.is_some());
    }

    #[test]
    fn countdown_reentry_reanchors_once() {
        let now = Instant::now();
        let mut state = MatchState::new(&settings(), now);
        state.apply_snapshot(&snapshot(), now);
        assert!(state.countdown.is_none());

        let mut counting = snapshot();
        counting.is_counting_down = true;
        let later = now + std::time::Duration::from_secs(5);
        state.apply_snapshot(&counting, later);
        let anchor = state.countdown.unwrap().started_at();
        assert_eq!(anchor, later);

        // While already counting, further snapshots keep the local anchor.
        let much_later = later + std::time::Duration::from_millis(500);
        state.apply_snapshot(&counting, much_later);
        assert_eq!(state.countdown.unwrap().started_at(), anchor);
    }

    #[test]
    fn paused_by_is_set_iff_paused() {
        let now = Instant::now();
        let mut state = MatchState::new(&settings(), now);

        let mut paused = snapshot();
        paused.is_paused = true;
        paused.paused_by_seat = Some(1);
        state.apply_snapshot(&paused, now);
        assert_eq!(state.phase, MatchPhase::Paused);
        assert_eq!(state.paused_by, Some(Seat::Right));

        state.apply_snapshot(&snapshot(), now);
        assert_eq!(state.phase, MatchPhase::Playing);
        assert_eq!(state.paused_by, None);
    }

    #[test]
    fn ownerless_pause_payload_is_not_a_pause() {
        let now = Instant::now();
        let mut state = MatchState::new(&settings(), now);

        let mut malformed = snapshot();
        malformed.is_paused = true;
        malformed.paused_by_seat = None;
        state.apply_snapshot(&malformed, now);
        assert_eq!(state.phase, MatchPhase::Playing);
        assert_eq!(state.paused_by, None);
    }

    #[test]
    fn resume_authority_is_enforced_offline() {
        let now = Instant::now();
        let mut state = MatchState::new(&settings(), now);
        state.phase = MatchPhase::Playing;
        state.countdown = None;

        assert!(state.request_pause(Seat::Left));
        assert!(!state.request_resume(Seat::Right));
        assert_eq!(state.phase, MatchPhase::Paused);
        assert!(state.request_resume(Seat::Left));
        assert_eq!(state.phase, MatchPhase::Playing);
        assert_eq!(state.paused_by, None);
    }

    #[test]
    fn offline_scoring_reenters_countdown_until_limit() {
        let now = Instant::now();
        let mut state = MatchState::new(&settings(), now);
        state.phase = MatchPhase::Playing;
        state.countdown = None;

        assert!(!state.record_point(Seat::Right, now));
        assert_eq!(state.phase, MatchPhase::CountingDown);
        state.phase = MatchPhase::Playing;
        assert!(!state.record_point(Seat::Right, now));
        state.phase = MatchPhase::Playing;
        assert!(state.record_point(Seat::Right, now));
        assert_eq!(state.phase, MatchPhase::Ended);
        assert_eq!(state.winner, Some(Seat::Right));
        assert_eq!(state.scores, [0, 3]);
    }

    #[test]
    fn forced_end_does_not_touch_scores() {
        let now = Instant::now();
        let mut state = MatchState::new(&settings(), now);
        state.scores = [1, 2];
        state.force_end(Seat::Left);
        assert_eq!(state.winner, Some(Seat::Left));
        assert_eq!(state.scores, [1, 2]);
        // Idempotent: a second trigger cannot flip the winner.
        state.force_end(Seat::Right);
        assert_eq!(state.winner, Some(Seat::Left));
    }
}
