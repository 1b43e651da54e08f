use std::f32::consts::PI;
use std::time::Instant;

use rand::Rng;

use crate::game::input::Direction;
use crate::game::phase::MatchPhase;
use crate::game::state::{MatchState, Seat, FIELD_HEIGHT, FIELD_WIDTH};

// All constants in virtual coordinates (1200x600 field).
pub const PADDLE_MARGIN: f32 = 18.0;
pub const PADDLE_WIDTH: f32 = 20.0;
pub const PADDLE_SPEED: f32 = 540.0;

// Edge hits deflect up to 60 degrees; center hits go straight.
const MAX_BOUNCE_ANGLE: f32 = PI / 3.0;
// Vertical spread applied to a fresh serve.
const SERVE_JITTER: f32 = PI / 6.0;

/// Advance the client-owned simulation by `dt` seconds. Only the offline
/// variant calls this; online, every field it would touch is mirrored from
/// relay snapshots instead.
pub fn step(state: &mut MatchState, directions: [Direction; 2], dt: f32, now: Instant) {
    match state.phase {
        MatchPhase::Paused | MatchPhase::Ended => return,
        MatchPhase::CountingDown => {
            // Paddles may reposition during the countdown; the ball is held
            // until the countdown elapses.
            move_paddles(state, directions, dt);
            if state
                .countdown
                .map(|countdown| countdown.is_finished(now))
                .unwrap_or(true)
            {
                state.phase = MatchPhase::Playing;
                state.countdown = None;
                if state.ball.dx == 0.0 && state.ball.dy == 0.0 {
                    serve(state, Seat::Right);
                }
            }
        }
        MatchPhase::Playing => {
            move_paddles(state, directions, dt);
            move_ball(state, dt, now);
        }
    }
}

fn move_paddles(state: &mut MatchState, directions: [Direction; 2], dt: f32) {
    for (paddle, direction) in state.paddles.iter_mut().zip(directions) {
        paddle.dy = match direction {
            Direction::Up => -PADDLE_SPEED,
            Direction::Down => PADDLE_SPEED,
            Direction::None => 0.0,
        };
        paddle.y = (paddle.y + paddle.dy * dt).clamp(0.0, FIELD_HEIGHT - paddle.height);
    }
}

fn move_ball(state: &mut MatchState, dt: f32, now: Instant) {
    state.ball.x += state.ball.dx * dt;
    state.ball.y += state.ball.dy * dt;

    // Wall reflections (top and bottom).
    let radius = state.ball.radius;
    if state.ball.y - radius <= 0.0 {
        state.ball.y = radius;
        state.ball.dy = state.ball.dy.abs();
    } else if state.ball.y + radius >= FIELD_HEIGHT {
        state.ball.y = FIELD_HEIGHT - radius;
        state.ball.dy = -state.ball.dy.abs();
    }

    check_paddle_bounce(state);

    // Goals: the ball is out once its edge crosses the boundary.
    if state.ball.x - radius <= 0.0 {
        score_for(state, Seat::Right, now);
    } else if state.ball.x + radius >= FIELD_WIDTH {
        score_for(state, Seat::Left, now);
    }
}

fn score_for(state: &mut MatchState, scorer: Seat, now: Instant) {
    let ended = state.record_point(scorer, now);
    if ended {
        state.ball.dx = 0.0;
        state.ball.dy = 0.0;
    } else {
        // Next serve goes toward the seat that conceded the point.
        serve(state, scorer.opponent());
    }
}

fn serve(state: &mut MatchState, toward: Seat) {
    let base = match toward {
        Seat::Left => PI,
        Seat::Right => 0.0,
    };
    let jitter = rand::thread_rng().gen_range(-SERVE_JITTER..=SERVE_JITTER);
    let speed = state.ball.base_speed;
    state
        .ball
        .place(FIELD_WIDTH / 2.0, FIELD_HEIGHT / 2.0, base + jitter, speed);
}

fn check_paddle_bounce(state: &mut MatchState) {
    let radius = state.ball.radius;

    let left_face = PADDLE_MARGIN + PADDLE_WIDTH;
    let left = &state.paddles[Seat::Left.index()];
    if state.ball.dx < 0.0
        && state.ball.x - radius <= left_face
        && state.ball.x + radius >= PADDLE_MARGIN
        && state.ball.y + radius >= left.y
        && state.ball.y - radius <= left.y + left.height
    {
        let (paddle_y, paddle_height) = (left.y, left.height);
        bounce(state, paddle_y, paddle_height, Seat::Left);
        state.ball.x = left_face + radius;
    }

    let right_face = FIELD_WIDTH - PADDLE_MARGIN - PADDLE_WIDTH;
    let right = &state.paddles[Seat::Right.index()];
    if state.ball.dx > 0.0
        && state.ball.x + radius >= right_face
        && state.ball.x - radius <= FIELD_WIDTH - PADDLE_MARGIN
        && state.ball.y + radius >= right.y
        && state.ball.y - radius <= right.y + right.height
    {
        let (paddle_y, paddle_height) = (right.y, right.height);
        bounce(state, paddle_y, paddle_height, Seat::Right);
        state.ball.x = right_face - radius;
    }
}

fn bounce(state: &mut MatchState, paddle_y: f32, paddle_height: f32, side: Seat) {
    // Where on the paddle the ball hit: 0.0 = top edge, 1.0 = bottom edge.
    let hit = ((state.ball.y - paddle_y) / paddle_height).clamp(0.0, 1.0);
    let angle = (hit - 0.5) * 2.0 * MAX_BOUNCE_ANGLE;

    // Each paddle contact ramps the rally speed by the configured increment.
    let speed = state.ball.speed() + state.ball.speed_increment;

    match side {
        Seat::Left => {
            state.ball.dx = angle.cos() * speed;
            state.ball.dy = angle.sin() * speed;
        }
        Seat::Right => {
            state.ball.dx = -angle.cos() * speed;
            state.ball.dy = angle.sin() * speed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::net::protocol::{Difficulty, MatchSettings};

    const DT: f32 = 1.0 / 60.0;

    fn playing_state() -> MatchState {
        let mut state = MatchState::new(
            &MatchSettings {
                difficulty: Difficulty::Medium,
                score_limit: 3,
            },
            Instant::now(),
        );
        state.phase = MatchPhase::Playing;
        state.countdown = None;
        state.ball.place(FIELD_WIDTH / 2.0, FIELD_HEIGHT / 2.0, 0.0, state.ball.base_speed);
        state
    }

    fn idle() -> [Direction; 2] {
        [Direction::None, Direction::None]
    }

    #[test]
    fn ball_reflects_off_top_wall() {
        let mut state = playing_state();
        state.ball.y = state.ball.radius + 1.0;
        state.ball.dx = 0.0;
        state.ball.dy = -300.0;

        step(&mut state, idle(), DT, Instant::now());
        assert!(state.ball.dy > 0.0);
        assert!(state.ball.y >= state.ball.radius);
    }

    #[test]
    fn paddle_bounce_adds_speed_increment() {
        let mut state = playing_state();
        let face = FIELD_WIDTH - PADDLE_MARGIN - PADDLE_WIDTH;
        state.paddles[1].y = FIELD_HEIGHT / 2.0 - state.paddles[1].height / 2.0;
        state.ball.x = face - state.ball.radius - 1.0;
        state.ball.y = FIELD_HEIGHT / 2.0;
        state.ball.dx = state.ball.base_speed;
        state.ball.dy = 0.0;
        let before = state.ball.speed();

        step(&mut state, idle(), DT, Instant::now());

        assert!(state.ball.dx < 0.0, "bounce reverses horizontal direction");
        let after = state.ball.speed();
        assert!((after - (before + state.ball.speed_increment)).abs() < 0.5);
    }

    #[test]
    fn missed_ball_scores_and_reenters_countdown() {
        let mut state = playing_state();
        state.ball.x = FIELD_WIDTH - state.ball.radius - 1.0;
        state.ball.y = 50.0; // far from the right paddle
        state.paddles[1].y = FIELD_HEIGHT - state.paddles[1].height;
        state.ball.dx = 900.0;
        state.ball.dy = 0.0;

        step(&mut state, idle(), DT, Instant::now());

        assert_eq!(state.scores, [1, 0]);
        assert_eq!(state.phase, MatchPhase::CountingDown);
        // Serve was re-centered toward the conceding side.
        assert!((state.ball.x - FIELD_WIDTH / 2.0).abs() < 1.0);
        assert!(state.ball.dx > 0.0);
    }

    #[test]
    fn reaching_score_limit_ends_the_match() {
        let mut state = playing_state();
        state.scores = [0, 2];
        state.ball.x = state.ball.radius + 1.0;
        state.ball.y = 50.0;
        state.paddles[0].y = FIELD_HEIGHT - state.paddles[0].height;
        state.ball.dx = -900.0;
        state.ball.dy = 0.0;

        step(&mut state, idle(), DT, Instant::now());

        assert_eq!(state.phase, MatchPhase::Ended);
        assert_eq!(state.winner, Some(Seat::Right));
        assert_eq!(state.ball.speed(), 0.0);
    }

    #[test]
    fn paddles_move_and_clamp_during_countdown() {
        let now = Instant::now();
        let mut state = MatchState::new(
            &MatchSettings {
                difficulty: Difficulty::Medium,
                score_limit: 3,
            },
            now,
        );
        let ball_before = (state.ball.x, state.ball.y);

        for _ in 0..600 {
            step(&mut state, [Direction::Up, Direction::Down], DT, now);
        }

        assert_eq!(state.phase, MatchPhase::CountingDown);
        assert_eq!((state.ball.x, state.ball.y), ball_before);
        assert_eq!(state.paddles[0].y, 0.0);
        assert_eq!(
            state.paddles[1].y,
            FIELD_HEIGHT - state.paddles[1].height
        );
    }

    #[test]
    fn countdown_elapse_starts_play_with_a_serve() {
        let now = Instant::now();
        let mut state = MatchState::new(
            &MatchSettings {
                difficulty: Difficulty::Medium,
                score_limit: 3,
            },
            now,
        );

        step(&mut state, idle(), DT, now + std::time::Duration::from_millis(3100));
        assert_eq!(state.phase, MatchPhase::Playing);
        assert!(state.ball.speed() > 0.0);
    }

    #[test]
    fn paused_state_freezes_everything() {
        let mut state = playing_state();
        state.request_pause(Seat::Left);
        let ball_before = (state.ball.x, state.ball.y);
        let paddle_before = state.paddles[0].y;

        step(&mut state, [Direction::Up, Direction::Up], DT, Instant::now());

        assert_eq!((state.ball.x, state.ball.y), ball_before);
        assert_eq!(state.paddles[0].y, paddle_before);
    }
}
