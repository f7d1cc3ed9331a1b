use std::sync::mpsc;
use std::time::{Duration, Instant};

use kubik::records::MemoryRecordStore;
use kubik::runtime::{FixedTicker, Runner, TestEventSource, TimerEvent};
use kubik::sensor::SensorSample;
use kubik::session::{InputMode, Session, SessionConfig};
use kubik::timer::TimerPhase;

fn at(base: Instant, ms: u64) -> Instant {
    base + Duration::from_millis(ms)
}

// Headless integration using the internal runtime + Session without a TTY.
// A motion-mode solve is driven end to end through Runner/TestEventSource.
#[test]
fn headless_motion_solve_records_once() {
    let epoch = Instant::now();
    let config = SessionConfig {
        filter: kubik::motion::MotionFilterConfig {
            policy: kubik::motion::MotionPolicy::Impact,
            sensitivity: kubik::motion::SENSITIVITY_MAX,
            cooldown_ms: 600,
            still_duration_ms: 300,
        },
        ..SessionConfig::default()
    };
    let mut session = Session::new(config, Box::<MemoryRecordStore>::default(), epoch);
    session.set_sensor_available(kubik::sensor::TriState::Yes);
    session.set_mode(InputMode::Motion, epoch);

    let (tx, rx) = mpsc::channel();
    let es = TestEventSource::new(rx);
    let ticker = FixedTicker::new(Duration::from_millis(5));
    let runner = Runner::new(es, ticker);

    let spike = |ms: u64| {
        TimerEvent::Sample(SensorSample {
            x: Some(0.0),
            y: Some(0.0),
            z: Some(40.0),
            timestamp_ms: ms,
        })
    };

    // Start spike, a debounced echo 50ms later, then the stop spike.
    tx.send(spike(1000)).unwrap();
    tx.send(spike(1050)).unwrap();
    tx.send(spike(9000)).unwrap();

    // Event timestamps double as the session clock here: sample timestamps
    // drive the filter, and we hand the session a matching Instant.
    for _ in 0..100u32 {
        match runner.step() {
            TimerEvent::Sample(sample) => {
                let now = at(epoch, sample.timestamp_ms);
                session.on_sample(sample, now);
            }
            TimerEvent::Tick => {
                if session.phase() == TimerPhase::Stopped {
                    break;
                }
            }
            _ => {}
        }
    }

    assert_eq!(session.phase(), TimerPhase::Stopped);
    assert_eq!(session.records().len(), 1);
    assert_eq!(session.records()[0].duration_ms, 8000);
}

#[test]
fn headless_manual_solve_via_key_events() {
    let epoch = Instant::now();
    let mut session = Session::new(
        SessionConfig::default(),
        Box::<MemoryRecordStore>::default(),
        epoch,
    );

    // Press, hold long enough, release, then the stopping tap.
    session.on_press(at(epoch, 0));
    session.on_tick(at(epoch, 400));
    assert_eq!(session.phase(), TimerPhase::Ready);
    session.on_release(at(epoch, 500));
    assert_eq!(session.phase(), TimerPhase::Running);
    session.on_press(at(epoch, 13_000));
    assert_eq!(session.phase(), TimerPhase::Stopped);

    assert_eq!(session.records().len(), 1);
    assert_eq!(session.records()[0].duration_ms, 12_500);
    assert!(!session.records()[0].scramble.is_empty());
}

#[test]
fn headless_pickup_putdown_round() {
    let epoch = Instant::now();
    let config = SessionConfig {
        filter: kubik::motion::MotionFilterConfig {
            policy: kubik::motion::MotionPolicy::PickupPutdown,
            sensitivity: kubik::motion::SENSITIVITY_MAX,
            cooldown_ms: 600,
            still_duration_ms: 300,
        },
        ..SessionConfig::default()
    };
    let mut session = Session::new(config, Box::<MemoryRecordStore>::default(), epoch);
    session.set_sensor_available(kubik::sensor::TriState::Yes);
    session.set_mode(InputMode::Motion, epoch);

    let sample = |ms: u64, z: f64| SensorSample {
        x: Some(0.0),
        y: Some(0.0),
        z: Some(z),
        timestamp_ms: ms,
    };

    // Pickup starts the clock.
    session.on_sample(sample(1000, 40.0), at(epoch, 1000));
    assert_eq!(session.phase(), TimerPhase::Running);

    // Cube set down: quiet samples, then the stillness window expires on a
    // tick with no samples at all.
    session.on_sample(sample(8000, 9.8), at(epoch, 8000));
    session.on_tick(at(epoch, 8100));
    assert_eq!(session.phase(), TimerPhase::Running);
    session.on_tick(at(epoch, 8300));
    assert_eq!(session.phase(), TimerPhase::Stopped);

    // Putdown fires at the stillness-timer expiry seen by the tick loop.
    assert_eq!(session.records().len(), 1);
    assert_eq!(session.records()[0].duration_ms, 7300);
}
