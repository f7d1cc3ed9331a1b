use std::time::Instant;

use chrono::Local;

use crate::motion::{MotionEvent, MotionFilter, MotionFilterConfig, SENSITIVITY_MAX, SENSITIVITY_MIN};
use crate::records::{RecordBook, RecordStore, SolveRecord};
use crate::scramble::ScrambleGenerator;
use crate::sensor::{PermissionProbe, SensorState, TriState};
use crate::stats;
use crate::timer::{Timer, TimerPhase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum InputMode {
    Manual,
    Motion,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub scramble_length: usize,
    pub hold_delay_ms: u64,
    pub auto_advance: bool,
    pub filter: MotionFilterConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            scramble_length: crate::scramble::DEFAULT_SCRAMBLE_LENGTH,
            hold_delay_ms: crate::timer::DEFAULT_HOLD_DELAY_MS,
            auto_advance: false,
            filter: MotionFilterConfig::default(),
        }
    }
}

/// Bridges manual input and the motion filter into one input-agnostic solve
/// workflow: owns the timer, the filter, the scramble rotation and the
/// persisted history. All state that used to be ambient (the post-stop lock,
/// the permission probe) lives on this struct so concurrent sessions in
/// tests stay isolated.
pub struct Session {
    config: SessionConfig,
    timer: Timer,
    filter: MotionFilter,
    records: RecordBook,
    generator: ScrambleGenerator,
    mode: InputMode,
    scramble: String,
    /// Scramble snapshotted at the instant the solve started; this, not the
    /// currently displayed one, goes into the record.
    active_scramble: Option<String>,
    /// After a filter-driven recorded stop, filter events are ignored until
    /// the explicit next-round advance so a lingering vibration cannot
    /// re-arm a new solve.
    post_stop_lock: bool,
    sensor: SensorState,
    probe: Option<PermissionProbe>,
    epoch: Instant,
    status: Option<String>,
}

impl Session {
    pub fn new(config: SessionConfig, store: Box<dyn RecordStore>, epoch: Instant) -> Self {
        let generator = ScrambleGenerator::new(config.scramble_length);
        let scramble = generator.generate();
        Self {
            timer: Timer::new(config.hold_delay_ms),
            filter: MotionFilter::new(config.filter),
            records: RecordBook::new(store),
            generator,
            mode: InputMode::Manual,
            scramble,
            active_scramble: None,
            post_stop_lock: false,
            sensor: SensorState::unknown(),
            probe: None,
            epoch,
            status: None,
            config,
        }
    }

    // --- accessors -------------------------------------------------------

    pub fn phase(&self) -> TimerPhase {
        self.timer.phase()
    }

    pub fn mode(&self) -> InputMode {
        self.mode
    }

    pub fn scramble(&self) -> &str {
        &self.scramble
    }

    pub fn records(&self) -> &[SolveRecord] {
        self.records.records()
    }

    pub fn sensor_state(&self) -> SensorState {
        self.sensor
    }

    pub fn last_event_strength(&self) -> f64 {
        self.filter.last_event_strength()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn display_ms(&self, now: Instant) -> u64 {
        self.timer.display_ms(now)
    }

    pub fn average_of(&self, n: usize) -> Option<f64> {
        stats::average_of_n(&self.records.countable_durations(), n)
    }

    pub fn session_mean(&self) -> Option<f64> {
        stats::mean(&self.records.countable_durations())
    }

    pub fn best_ms(&self) -> Option<u64> {
        self.records.countable_durations().into_iter().min()
    }

    pub fn worst_ms(&self) -> Option<u64> {
        self.records.countable_durations().into_iter().max()
    }

    // --- manual input path ----------------------------------------------

    pub fn on_press(&mut self, now: Instant) {
        if self.mode != InputMode::Manual {
            return;
        }
        if let Some(duration) = self.timer.press(now) {
            self.record_stop(duration);
        }
    }

    pub fn on_release(&mut self, now: Instant) {
        if self.mode != InputMode::Manual {
            return;
        }
        if self.timer.release(now) {
            self.active_scramble = Some(self.scramble.clone());
        }
    }

    /// Degraded manual path for terminals that cannot report key releases:
    /// a tap starts from idle (no ready stage, like the sensor path) and the
    /// next tap stops. Presses on the stopped screen stay no-ops.
    pub fn on_tap(&mut self, now: Instant) {
        if self.mode != InputMode::Manual {
            return;
        }
        match self.timer.phase() {
            TimerPhase::Idle => {
                if self.timer.start(now) {
                    self.active_scramble = Some(self.scramble.clone());
                }
            }
            TimerPhase::Running => {
                if let Some(duration) = self.timer.stop(now) {
                    self.record_stop(duration);
                }
            }
            _ => {}
        }
    }

    // --- shared tick -----------------------------------------------------

    pub fn on_tick(&mut self, now: Instant) {
        self.timer.on_tick(now);

        if self.mode == InputMode::Motion {
            let now_ms = self.now_ms(now);
            self.check_permission_probe(now_ms);
            if let Some(event) = self.filter.poll(now_ms) {
                self.dispatch_motion(event, now);
            }
        }
    }

    // --- sensor input path -----------------------------------------------

    pub fn on_sample(&mut self, sample: crate::sensor::SensorSample, now: Instant) {
        if self.mode != InputMode::Motion {
            return;
        }
        if let Some(probe) = self.probe.take() {
            // First arrival inside the probe window implies the grant.
            self.sensor.permission = probe.on_sample();
        }
        if let Some(event) = self.filter.process_sample(&sample) {
            self.dispatch_motion(event, now);
        }
    }

    fn dispatch_motion(&mut self, event: MotionEvent, now: Instant) {
        if self.post_stop_lock {
            return;
        }
        match (event, self.timer.phase()) {
            (MotionEvent::Pickup, TimerPhase::Idle)
            | (MotionEvent::Impact { .. }, TimerPhase::Idle) => {
                if self.timer.start(now) {
                    self.active_scramble = Some(self.scramble.clone());
                }
            }
            (MotionEvent::Putdown, TimerPhase::Running)
            | (MotionEvent::Impact { .. }, TimerPhase::Running) => {
                if let Some(duration) = self.timer.stop(now) {
                    self.record_stop(duration);
                    self.post_stop_lock = true;
                }
            }
            _ => {}
        }
    }

    // --- lifecycle actions ----------------------------------------------

    /// Explicit next-round advance: clears the stopped result and the
    /// post-stop lock, rotating the scramble unless auto-advance already
    /// did so at the stop instant.
    pub fn next_round(&mut self) {
        let advanced = self.timer.advance();
        self.post_stop_lock = false;
        if advanced && !self.config.auto_advance {
            self.rotate_scramble();
        }
    }

    /// Discards the in-flight solve, no record.
    pub fn cancel(&mut self) {
        self.timer.cancel();
        self.active_scramble = None;
    }

    /// Switching input modality mid-cycle forces idle so a stale ready or
    /// running state cannot survive the change.
    pub fn set_mode(&mut self, mode: InputMode, now: Instant) {
        if self.mode == mode {
            return;
        }
        self.timer.reset();
        self.filter.reset();
        self.post_stop_lock = false;
        self.active_scramble = None;
        self.probe = None;
        self.mode = mode;

        if mode == InputMode::Motion && self.sensor.permission == TriState::Unknown {
            self.probe = Some(PermissionProbe::start(self.now_ms(now)));
        }
    }

    /// Records sensor availability from the startup capability probe.
    pub fn set_sensor_available(&mut self, available: TriState) {
        self.sensor.available = available;
    }

    /// Sensor acquisition failed: degrade to manual timing and tell the
    /// user, never crash the session.
    pub fn sensor_fallback(&mut self, reason: &str, now: Instant) {
        if self.mode == InputMode::Motion {
            self.set_mode(InputMode::Manual, now);
        }
        self.sensor.permission = TriState::No;
        self.status = Some(format!("{} - falling back to manual timing", reason));
    }

    pub fn sensitivity(&self) -> u16 {
        self.filter.config().sensitivity
    }

    pub fn adjust_sensitivity(&mut self, delta: i32) -> u16 {
        let next = (self.filter.config().sensitivity as i32 + delta)
            .clamp(SENSITIVITY_MIN as i32, SENSITIVITY_MAX as i32) as u16;
        self.filter.set_sensitivity(next);
        next
    }

    pub fn delete_latest(&mut self) {
        self.records.delete_latest();
    }

    pub fn toggle_latest_dnf(&mut self) {
        self.records.toggle_latest_dnf();
    }

    /// Clear-all is an explicit reset: history gone, phase forced idle.
    pub fn clear_history(&mut self) {
        self.records.clear();
        self.timer.reset();
        self.post_stop_lock = false;
        self.active_scramble = None;
    }

    // --- internals -------------------------------------------------------

    fn record_stop(&mut self, duration_ms: u64) {
        let scramble = self
            .active_scramble
            .take()
            .unwrap_or_else(|| self.scramble.clone());
        self.records.push(duration_ms, scramble, Local::now());
        if self.config.auto_advance {
            self.rotate_scramble();
        }
    }

    fn rotate_scramble(&mut self) {
        self.scramble = self.generator.generate();
    }

    fn check_permission_probe(&mut self, now_ms: u64) {
        let Some(probe) = self.probe else { return };
        if probe.check(now_ms) == Some(TriState::No) {
            self.probe = None;
            self.sensor_fallback(
                "no motion samples arrived",
                self.epoch + std::time::Duration::from_millis(now_ms),
            );
        }
    }

    fn now_ms(&self, now: Instant) -> u64 {
        now.duration_since(self.epoch).as_millis() as u64
    }
}
