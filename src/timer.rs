use std::time::{Duration, Instant};

/// Solve lifecycle phase. Exactly one is live per session; mutated only
/// through the transition methods below.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerPhase {
    Idle,
    /// Armed after a long-enough manual hold, waiting for release. Only
    /// reachable via the manual input path.
    Ready,
    Running,
    /// Holds the final duration until the explicit next-round advance.
    Stopped,
}

pub const DEFAULT_HOLD_DELAY_MS: u64 = 350;

/// The solve timer. All transitions take an explicit `now` from the caller's
/// monotonic clock, so ordering between a pending hold, an incoming release
/// and a motion event is resolved by call order, never by wall time.
///
/// The recorded duration is always computed from `Instant` arithmetic at the
/// stop instant; the display tick cadence never affects it.
#[derive(Debug)]
pub struct Timer {
    phase: TimerPhase,
    hold_delay: Duration,
    press_started: Option<Instant>,
    run_started: Option<Instant>,
    final_ms: Option<u64>,
}

impl Timer {
    pub fn new(hold_delay_ms: u64) -> Self {
        Self {
            phase: TimerPhase::Idle,
            hold_delay: Duration::from_millis(hold_delay_ms),
            press_started: None,
            run_started: None,
            final_ms: None,
        }
    }

    pub fn phase(&self) -> TimerPhase {
        self.phase
    }

    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }

    pub fn final_ms(&self) -> Option<u64> {
        self.final_ms
    }

    /// Manual press. In idle this arms the hold-delay; during a run it is
    /// the stopping tap and returns the authoritative duration. In ready
    /// and stopped it is a no-op: a press must never re-arm ready.
    pub fn press(&mut self, now: Instant) -> Option<u64> {
        match self.phase {
            TimerPhase::Idle => {
                if self.press_started.is_none() {
                    self.press_started = Some(now);
                }
                None
            }
            TimerPhase::Running => self.stop(now),
            TimerPhase::Ready | TimerPhase::Stopped => None,
        }
    }

    /// Manual release. From ready this starts the clock with the release
    /// instant as reference. A release while still idle cancels the pending
    /// hold timer so a stale press cannot arm ready after the finger is
    /// gone. Returns true when the clock started.
    pub fn release(&mut self, now: Instant) -> bool {
        match self.phase {
            TimerPhase::Ready => {
                self.phase = TimerPhase::Running;
                self.run_started = Some(now);
                self.press_started = None;
                true
            }
            _ => {
                self.press_started = None;
                false
            }
        }
    }

    /// Tick-driven hold check: a press held at least the hold-delay arms
    /// ready. Returns true on the idle → ready edge.
    pub fn on_tick(&mut self, now: Instant) -> bool {
        if self.phase != TimerPhase::Idle {
            return false;
        }
        match self.press_started {
            Some(pressed) if now.duration_since(pressed) >= self.hold_delay => {
                self.phase = TimerPhase::Ready;
                true
            }
            _ => false,
        }
    }

    /// Sensor-path start: idle → running with no ready stage.
    pub fn start(&mut self, now: Instant) -> bool {
        if self.phase != TimerPhase::Idle {
            return false;
        }
        self.phase = TimerPhase::Running;
        self.run_started = Some(now);
        self.press_started = None;
        true
    }

    /// Recording stop: running → stopped, yielding the final duration.
    pub fn stop(&mut self, now: Instant) -> Option<u64> {
        if self.phase != TimerPhase::Running {
            return None;
        }
        let started = self.run_started.take()?;
        let elapsed = now.duration_since(started).as_millis() as u64;
        self.phase = TimerPhase::Stopped;
        self.final_ms = Some(elapsed);
        Some(elapsed)
    }

    /// Cancelling stop: running → idle, duration discarded, no record.
    pub fn cancel(&mut self) -> bool {
        if self.phase != TimerPhase::Running {
            return false;
        }
        self.phase = TimerPhase::Idle;
        self.run_started = None;
        self.press_started = None;
        true
    }

    /// Explicit next-round advance: stopped → idle, duration cleared.
    pub fn advance(&mut self) -> bool {
        if self.phase != TimerPhase::Stopped {
            return false;
        }
        self.phase = TimerPhase::Idle;
        self.final_ms = None;
        true
    }

    /// Forced reset from any phase (mode switch, clear-all). Drops the
    /// pending hold timer and any in-flight duration.
    pub fn reset(&mut self) {
        self.phase = TimerPhase::Idle;
        self.press_started = None;
        self.run_started = None;
        self.final_ms = None;
    }

    /// Value for the display loop: live elapsed while running, the frozen
    /// final in stopped, the last final (or zero) otherwise.
    pub fn display_ms(&self, now: Instant) -> u64 {
        match self.phase {
            TimerPhase::Running => self
                .run_started
                .map(|s| now.duration_since(s).as_millis() as u64)
                .unwrap_or(0),
            _ => self.final_ms.unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, ms: u64) -> Instant {
        base + Duration::from_millis(ms)
    }

    #[test]
    fn full_manual_cycle() {
        let base = Instant::now();
        let mut timer = Timer::new(350);

        assert_eq!(timer.press(at(base, 0)), None);
        assert_eq!(timer.phase(), TimerPhase::Idle);

        // Hold past the delay arms ready.
        assert!(!timer.on_tick(at(base, 200)));
        assert!(timer.on_tick(at(base, 400)));
        assert_eq!(timer.phase(), TimerPhase::Ready);

        assert!(timer.release(at(base, 450)));
        assert_eq!(timer.phase(), TimerPhase::Running);

        let recorded = timer.press(at(base, 12795));
        assert_eq!(recorded, Some(12345));
        assert_eq!(timer.phase(), TimerPhase::Stopped);
        assert_eq!(timer.final_ms(), Some(12345));

        assert!(timer.advance());
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(timer.final_ms(), None);
    }

    #[test]
    fn early_release_never_arms_ready() {
        let base = Instant::now();
        let mut timer = Timer::new(400);

        timer.press(at(base, 0));
        // Released after only 100ms: pending hold must be dropped.
        assert!(!timer.release(at(base, 100)));
        assert_eq!(timer.phase(), TimerPhase::Idle);

        // A later tick past the original deadline must not fire.
        assert!(!timer.on_tick(at(base, 500)));
        assert_eq!(timer.phase(), TimerPhase::Idle);
    }

    #[test]
    fn press_during_ready_is_ignored() {
        let base = Instant::now();
        let mut timer = Timer::new(300);
        timer.press(at(base, 0));
        timer.on_tick(at(base, 300));
        assert_eq!(timer.phase(), TimerPhase::Ready);

        assert_eq!(timer.press(at(base, 350)), None);
        assert_eq!(timer.phase(), TimerPhase::Ready);
    }

    #[test]
    fn press_during_stopped_is_a_noop() {
        let base = Instant::now();
        let mut timer = Timer::new(300);
        timer.start(at(base, 0));
        timer.stop(at(base, 5000));
        assert_eq!(timer.phase(), TimerPhase::Stopped);

        // Quick taps on the stopped screen never re-arm anything.
        assert_eq!(timer.press(at(base, 5100)), None);
        assert!(!timer.release(at(base, 5150)));
        assert_eq!(timer.phase(), TimerPhase::Stopped);
        assert_eq!(timer.final_ms(), Some(5000));
    }

    #[test]
    fn sensor_start_skips_ready() {
        let base = Instant::now();
        let mut timer = Timer::new(300);
        assert!(timer.start(at(base, 0)));
        assert_eq!(timer.phase(), TimerPhase::Running);
        // A second start while running is rejected.
        assert!(!timer.start(at(base, 100)));
    }

    #[test]
    fn cancel_discards_duration() {
        let base = Instant::now();
        let mut timer = Timer::new(300);
        timer.start(at(base, 0));
        assert!(timer.cancel());
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(timer.final_ms(), None);
        assert_eq!(timer.stop(at(base, 1000)), None);
    }

    #[test]
    fn reset_from_any_phase() {
        let base = Instant::now();
        let mut timer = Timer::new(300);
        timer.press(at(base, 0));
        timer.on_tick(at(base, 300));
        timer.release(at(base, 350));
        assert_eq!(timer.phase(), TimerPhase::Running);

        timer.reset();
        assert_eq!(timer.phase(), TimerPhase::Idle);
        assert_eq!(timer.display_ms(at(base, 1000)), 0);
    }

    #[test]
    fn display_follows_running_clock() {
        let base = Instant::now();
        let mut timer = Timer::new(300);
        timer.start(at(base, 0));
        assert_eq!(timer.display_ms(at(base, 1500)), 1500);
        timer.stop(at(base, 2000));
        // Frozen after stop regardless of the queried instant.
        assert_eq!(timer.display_ms(at(base, 9000)), 2000);
    }

    #[test]
    fn stop_value_is_independent_of_tick_cadence() {
        let base = Instant::now();
        let mut timer = Timer::new(300);
        timer.start(at(base, 0));
        // Display sampled coarsely...
        assert_eq!(timer.display_ms(at(base, 1900)), 1900);
        // ...but the stop instant is authoritative to the millisecond.
        assert_eq!(timer.stop(at(base, 1967)), Some(1967));
    }
}
