use crate::sensor::SensorSample;

/// Standing gravity used as the rest reference for deviation (m/s²).
pub const GRAVITY_MS2: f64 = 9.8;

pub const SENSITIVITY_MIN: u16 = 1;
pub const SENSITIVITY_MAX: u16 = 190;

const THRESHOLD_G_AT_MIN: f64 = 4.0;
const THRESHOLD_G_AT_MAX: f64 = 0.25;

/// Maps the user-facing sensitivity scalar to a g-threshold.
/// Linear, monotonically decreasing, endpoints exact: 1 → 4.0g, 190 → 0.25g.
pub fn sensitivity_to_threshold_g(sensitivity: u16) -> f64 {
    let s = sensitivity.clamp(SENSITIVITY_MIN, SENSITIVITY_MAX);
    let span = (SENSITIVITY_MAX - SENSITIVITY_MIN) as f64;
    let t = (s - SENSITIVITY_MIN) as f64 / span;
    THRESHOLD_G_AT_MIN + t * (THRESHOLD_G_AT_MAX - THRESHOLD_G_AT_MIN)
}

/// Discrete semantic event distilled from the raw acceleration stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MotionEvent {
    /// Single sharp acceleration spike; strength is the deviation in m/s²
    /// rounded to one decimal.
    Impact { strength: f64 },
    /// Cube left the surface (pickup/putdown policy).
    Pickup,
    /// Cube has been still for the configured window.
    Putdown,
}

/// Which event vocabulary the filter emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotionPolicy {
    Impact,
    PickupPutdown,
}

/// Configuration for motion event detection.
#[derive(Debug, Clone, Copy)]
pub struct MotionFilterConfig {
    pub policy: MotionPolicy,
    /// User-facing sensitivity scalar, 1..=190.
    pub sensitivity: u16,
    /// Minimum time between two accepted impact events (debounce).
    pub cooldown_ms: u64,
    /// Quiet time below threshold before a putdown fires.
    pub still_duration_ms: u64,
}

impl Default for MotionFilterConfig {
    fn default() -> Self {
        Self {
            policy: MotionPolicy::Impact,
            sensitivity: 100,
            cooldown_ms: 600,
            still_duration_ms: 300,
        }
    }
}

/// Turns the continuous sample stream into debounced discrete events.
///
/// Samples arrive at an uncontrolled device-driven rate; all debouncing is
/// keyed off sample timestamps plus the `poll` entry point, which the tick
/// loop drives so a putdown still fires when the stream goes quiet.
pub struct MotionFilter {
    config: MotionFilterConfig,
    threshold_ms2: f64,

    // Impact debounce
    last_accepted_ms: Option<u64>,

    // Pickup/putdown state
    moving: bool,
    still_since_ms: Option<u64>,

    last_event_strength: f64,
}

impl MotionFilter {
    pub fn new(config: MotionFilterConfig) -> Self {
        let threshold_ms2 = sensitivity_to_threshold_g(config.sensitivity) * GRAVITY_MS2;
        Self {
            config,
            threshold_ms2,
            last_accepted_ms: None,
            moving: false,
            still_since_ms: None,
            last_event_strength: 0.0,
        }
    }

    pub fn config(&self) -> &MotionFilterConfig {
        &self.config
    }

    /// Deviation threshold in m/s² derived from the sensitivity scalar.
    pub fn threshold_ms2(&self) -> f64 {
        self.threshold_ms2
    }

    /// Strength of the most recent accepted event; debounced samples never
    /// update this.
    pub fn last_event_strength(&self) -> f64 {
        self.last_event_strength
    }

    pub fn set_sensitivity(&mut self, sensitivity: u16) {
        self.config.sensitivity = sensitivity.clamp(SENSITIVITY_MIN, SENSITIVITY_MAX);
        self.threshold_ms2 = sensitivity_to_threshold_g(self.config.sensitivity) * GRAVITY_MS2;
    }

    pub fn set_policy(&mut self, policy: MotionPolicy) {
        self.config.policy = policy;
        self.reset();
    }

    /// Clears debounce and movement state (call on mode switch or disable).
    pub fn reset(&mut self) {
        self.last_accepted_ms = None;
        self.moving = false;
        self.still_since_ms = None;
    }

    /// Process one raw sample. Samples with a missing axis are skipped
    /// silently. Returns at most one event.
    pub fn process_sample(&mut self, sample: &SensorSample) -> Option<MotionEvent> {
        let magnitude = sample.magnitude()?;
        let deviation = (magnitude - GRAVITY_MS2).abs();

        match self.config.policy {
            MotionPolicy::Impact => self.process_impact(deviation, sample.timestamp_ms),
            MotionPolicy::PickupPutdown => self.process_pickup(deviation, sample.timestamp_ms),
        }
    }

    /// Timer-driven check for the stillness window. The pickup/putdown
    /// policy needs this because putdown is defined by the *absence* of
    /// further samples above threshold.
    pub fn poll(&mut self, now_ms: u64) -> Option<MotionEvent> {
        if self.config.policy != MotionPolicy::PickupPutdown || !self.moving {
            return None;
        }
        let armed_at = self.still_since_ms?;
        if now_ms.saturating_sub(armed_at) >= self.config.still_duration_ms {
            self.moving = false;
            self.still_since_ms = None;
            self.accept(0.0);
            return Some(MotionEvent::Putdown);
        }
        None
    }

    fn process_impact(&mut self, deviation: f64, timestamp_ms: u64) -> Option<MotionEvent> {
        if deviation <= self.threshold_ms2 {
            return None;
        }
        if let Some(last) = self.last_accepted_ms {
            if timestamp_ms.saturating_sub(last) < self.config.cooldown_ms {
                // Inside the cooldown window: one physical tap must not
                // register as several events.
                return None;
            }
        }
        self.last_accepted_ms = Some(timestamp_ms);
        let strength = round_one_decimal(deviation);
        self.accept(strength);
        Some(MotionEvent::Impact { strength })
    }

    fn process_pickup(&mut self, deviation: f64, timestamp_ms: u64) -> Option<MotionEvent> {
        if deviation > self.threshold_ms2 {
            // Motion cancels any armed stillness timer (re-arm, not queue).
            self.still_since_ms = None;
            if !self.moving {
                self.moving = true;
                self.accept(round_one_decimal(deviation));
                return Some(MotionEvent::Pickup);
            }
            return None;
        }

        if self.moving {
            if self.still_since_ms.is_none() {
                self.still_since_ms = Some(timestamp_ms);
            }
            return self.poll(timestamp_ms);
        }
        None
    }

    fn accept(&mut self, strength: f64) {
        self.last_event_strength = strength;
    }
}

fn round_one_decimal(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
