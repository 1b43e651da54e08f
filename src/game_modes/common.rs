//! Shared frame-loop machinery for the match controllers: the
//! fixed-timestep accumulator, the idempotent stop guard, and frame pacing.

use std::time::{Duration, Instant};

/// Hard ceiling on a single frame delta. A backgrounded or stalled process
/// resumes with one clamped step instead of a catch-up burst.
pub const MAX_FRAME_DELTA: Duration = Duration::from_millis(100);

/// Logical tick length for fixed-step loops (60 Hz).
pub const FIXED_TICK: Duration = Duration::from_micros(16_667);

/// What a frame owes the logic side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Run the logical update this many times, one fixed tick each.
    Fixed(u32),
    /// Run once with the actual (clamped) frame delta; used by the offline
    /// variant where the client owns physics.
    Variable(Duration),
}

/// Decouples the render cadence from the logical tick rate. Each frame the
/// clamped delta is added to an accumulator which is drained in whole
/// ticks; rendering happens once per frame regardless of ticks drained.
#[derive(Debug)]
pub struct FrameClock {
    last: Option<Instant>,
    accumulator: Duration,
    tick: Option<Duration>,
}

impl FrameClock {
    pub fn fixed(tick: Duration) -> Self {
        Self {
            last: None,
            accumulator: Duration::ZERO,
            tick: Some(tick),
        }
    }

    pub fn per_frame() -> Self {
        Self {
            last: None,
            accumulator: Duration::ZERO,
            tick: None,
        }
    }

    /// Re-arm timing state; call when the loop (re)starts so time spent
    /// outside the loop is not billed to the first frame.
    pub fn reset(&mut self) {
        self.last = None;
        self.accumulator = Duration::ZERO;
    }

    pub fn advance(&mut self, now: Instant) -> Step {
        let delta = match self.last {
            Some(last) => now.saturating_duration_since(last).min(MAX_FRAME_DELTA),
            None => Duration::ZERO,
        };
        self.last = Some(now);

        match self.tick {
            Some(tick) => {
                self.accumulator += delta;
                let mut ticks = 0;
                while self.accumulator >= tick {
                    self.accumulator -= tick;
                    ticks += 1;
                }
                Step::Fixed(ticks)
            }
            None => Step::Variable(delta),
        }
    }
}

/// Stop bookkeeping for a match loop. `stop()` may fire from any number of
/// triggers (quit key, peer left, render surface gone, app teardown) and
/// runs the caller's cleanup exactly once.
pub struct LoopGuard {
    stopped: bool,
    surface_probe: Option<Box<dyn Fn() -> bool>>,
}

impl LoopGuard {
    pub fn new() -> Self {
        Self {
            stopped: false,
            surface_probe: None,
        }
    }

    /// The host registers how to tell whether the render target is still
    /// valid; the loop auto-stops once it is not. This replaces any
    /// framework-specific watcher on the render surface.
    pub fn set_surface_probe(&mut self, probe: Box<dyn Fn() -> bool>) {
        self.surface_probe = Some(probe);
    }

    pub fn surface_lost(&self) -> bool {
        match &self.surface_probe {
            Some(probe) => !probe(),
            None => false,
        }
    }

    /// Returns true only on the first call; cleanup belongs behind it.
    pub fn stop(&mut self) -> bool {
        if self.stopped {
            return false;
        }
        self.stopped = true;
        true
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

impl Default for LoopGuard {
    fn default() -> Self {
        Self::new()
    }
}

/// Probe for "is the terminal still a usable render target". The app layer
/// registers this on each controller; losing the surface (closed stdout,
/// zero-sized terminal) then stops the loop without an explicit call.
pub fn terminal_surface_probe() -> Box<dyn Fn() -> bool> {
    Box::new(|| {
        crossterm::terminal::size()
            .map(|(width, height)| width > 0 && height > 0)
            .unwrap_or(false)
    })
}

/// Sleep out the remainder of the frame to hold the target frame rate.
pub fn limit_frame_rate(frame_start: Instant, frame_duration: Duration) {
    let elapsed = frame_start.elapsed();
    if elapsed < frame_duration {
        std::thread::sleep(frame_duration - elapsed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_runs_zero_ticks() {
        let mut clock = FrameClock::fixed(FIXED_TICK);
        assert_eq!(clock.advance(Instant::now()), Step::Fixed(0));
    }

    #[test]
    fn steady_frames_drain_one_tick_each() {
        let mut clock = FrameClock::fixed(FIXED_TICK);
        let start = Instant::now();
        clock.advance(start);
        let mut total = 0;
        for i in 1..=10u32 {
            if let Step::Fixed(n) = clock.advance(start + FIXED_TICK * i) {
                total += n;
            }
        }
        assert_eq!(total, 10);
    }

    #[test]
    fn huge_frame_delta_is_clamped() {
        // A 500 ms stall must not trigger a 30-tick catch-up burst: the
        // clamp caps it at 100 ms worth of ticks.
        let mut clock = FrameClock::fixed(FIXED_TICK);
        let start = Instant::now();
        clock.advance(start);
        match clock.advance(start + Duration::from_millis(500)) {
            Step::Fixed(n) => {
                assert!(n <= 6, "expected at most 6 ticks, got {n}");
                assert!(n >= 5, "clamp should still allow ~100ms of ticks, got {n}");
            }
            step => panic!("unexpected step: {step:?}"),
        }
    }

    #[test]
    fn leftover_time_carries_to_the_next_frame() {
        let mut clock = FrameClock::fixed(Duration::from_millis(10));
        let start = Instant::now();
        clock.advance(start);
        assert_eq!(
            clock.advance(start + Duration::from_millis(15)),
            Step::Fixed(1)
        );
        // 5 ms carried over + 5 ms new = exactly one more tick.
        assert_eq!(
            clock.advance(start + Duration::from_millis(20)),
            Step::Fixed(1)
        );
    }

    #[test]
    fn variable_mode_reports_clamped_delta() {
        let mut clock = FrameClock::per_frame();
        let start = Instant::now();
        clock.advance(start);
        assert_eq!(
            clock.advance(start + Duration::from_millis(16)),
            Step::Variable(Duration::from_millis(16))
        );
        assert_eq!(
            clock.advance(start + Duration::from_millis(600)),
            Step::Variable(MAX_FRAME_DELTA)
        );
    }

    #[test]
    fn reset_forgets_elapsed_time() {
        let mut clock = FrameClock::fixed(FIXED_TICK);
        let start = Instant::now();
        clock.advance(start);
        clock.reset();
        // First advance after reset behaves like a fresh first frame.
        assert_eq!(
            clock.advance(start + Duration::from_secs(5)),
            Step::Fixed(0)
        );
    }

    #[test]
    fn stop_fires_cleanup_exactly_once() {
        let mut guard = LoopGuard::new();
        assert!(!guard.is_stopped());
        assert!(guard.stop());
        assert!(!guard.stop());
        assert!(!guard.stop());
        assert!(guard.is_stopped());
    }

    #[test]
    fn surface_probe_controls_auto_stop() {
        use std::cell::Cell;
        use std::rc::Rc;

        let alive = Rc::new(Cell::new(true));
        let mut guard = LoopGuard::new();
        let probe = alive.clone();
        guard.set_surface_probe(Box::new(move || probe.get()));

        assert!(!guard.surface_lost());
        alive.set(false);
        assert!(guard.surface_lost());
    }
}
