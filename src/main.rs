use clap::{Parser, ValueEnum};
use crossterm::{
    event::{
        KeyCode, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{
        disable_raw_mode, enable_raw_mode, supports_keyboard_enhancement, EnterAlternateScreen,
        LeaveAlternateScreen,
    },
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io,
    path::PathBuf,
    time::{Duration, Instant},
};

use kubik::{
    config::{Config, ConfigStore, FileConfigStore},
    motion::{MotionFilterConfig, MotionPolicy},
    records::FileRecordStore,
    runtime::{CrosstermEventSource, FixedTicker, Runner, TimerEvent},
    sensor::{probe_capability, FeedReader},
    session::{InputMode, Session, SessionConfig},
    ui::TimerView,
};

const TICK_RATE_MS: u64 = 50;

/// sleek speedcubing timer tui with motion-triggered solves
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A speedcubing timer for the terminal: hold-and-release manual timing or accelerometer-triggered solves, legal 3x3 scrambles, and a rolling solve history with trimmed averages."
)]
pub struct Cli {
    /// number of moves per scramble
    #[clap(short = 'l', long)]
    scramble_length: Option<usize>,

    /// how long space must be held before the timer arms (ms)
    #[clap(long)]
    hold_delay_ms: Option<u64>,

    /// motion sensitivity, 1 (4.0g) to 190 (0.25g)
    #[clap(short = 's', long)]
    sensitivity: Option<u16>,

    /// minimum gap between two accepted impacts (ms)
    #[clap(long)]
    cooldown_ms: Option<u64>,

    /// stillness window before a putdown fires (ms)
    #[clap(long)]
    still_ms: Option<u64>,

    /// rotate the scramble immediately on stop instead of on "next"
    #[clap(long)]
    auto_advance: bool,

    /// input modality to start in
    #[clap(short = 'm', long, value_enum)]
    mode: Option<CliMode>,

    /// motion event vocabulary
    #[clap(long, value_enum)]
    policy: Option<CliPolicy>,

    /// line-oriented acceleration feed ("x y z" per line, "-" for a missing axis)
    #[clap(long)]
    feed: Option<PathBuf>,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
pub enum CliMode {
    Manual,
    Motion,
}

#[derive(Debug, Copy, Clone, ValueEnum, strum_macros::Display)]
pub enum CliPolicy {
    Impact,
    Pickup,
}

impl Cli {
    /// CLI flags override the persisted config where given.
    fn apply_to(&self, mut cfg: Config) -> Config {
        if let Some(n) = self.scramble_length {
            cfg.scramble_length = n;
        }
        if let Some(ms) = self.hold_delay_ms {
            cfg.hold_delay_ms = ms;
        }
        if let Some(s) = self.sensitivity {
            cfg.sensitivity = s;
        }
        if let Some(ms) = self.cooldown_ms {
            cfg.cooldown_ms = ms;
        }
        if let Some(ms) = self.still_ms {
            cfg.still_duration_ms = ms;
        }
        if self.auto_advance {
            cfg.auto_advance = true;
        }
        if let Some(mode) = self.mode {
            cfg.input_mode = mode.to_string().to_lowercase();
        }
        if let Some(policy) = self.policy {
            cfg.motion_policy = policy.to_string().to_lowercase();
        }
        cfg.sanitized()
    }
}

fn session_config(cfg: &Config) -> SessionConfig {
    SessionConfig {
        scramble_length: cfg.scramble_length,
        hold_delay_ms: cfg.hold_delay_ms,
        auto_advance: cfg.auto_advance,
        filter: MotionFilterConfig {
            policy: if cfg.motion_policy == "pickup" {
                MotionPolicy::PickupPutdown
            } else {
                MotionPolicy::Impact
            },
            sensitivity: cfg.sensitivity,
            cooldown_ms: cfg.cooldown_ms,
            still_duration_ms: cfg.still_duration_ms,
        },
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let config_store = FileConfigStore::new();
    let mut cfg = cli.apply_to(config_store.load());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    // Key releases drive the hold-and-release gesture; without enhancement
    // support the session degrades to tap-to-start.
    let release_events = supports_keyboard_enhancement().unwrap_or(false);
    if release_events {
        execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )?;
    }

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &cli, &mut cfg, release_events);

    if release_events {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    let _ = config_store.save(&cfg);
    result
}

fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    cli: &Cli,
    cfg: &mut Config,
    release_events: bool,
) -> Result<(), Box<dyn Error>> {
    let epoch = Instant::now();
    let mut session = Session::new(session_config(cfg), Box::new(FileRecordStore::new()), epoch);
    session.set_sensor_available(probe_capability(cli.feed.as_deref()));

    let source = CrosstermEventSource::new();
    if let Some(feed) = &cli.feed {
        // Spawning the reader is the permission request; it happens as a
        // direct result of the user launching with --feed.
        match FeedReader::spawn(feed, epoch) {
            Ok(samples) => source.attach_sensor(samples),
            Err(e) => session.sensor_fallback(&e.to_string(), Instant::now()),
        }
    }
    if cfg.input_mode == "motion" {
        session.set_mode(InputMode::Motion, Instant::now());
    }

    let runner = Runner::new(source, FixedTicker::new(Duration::from_millis(TICK_RATE_MS)));

    loop {
        let view = TimerView {
            session: &session,
            now: Instant::now(),
            release_events,
        };
        terminal.draw(|f| f.render_widget(&view, f.area()))?;

        let event = runner.step();
        let now = Instant::now();
        match event {
            TimerEvent::Tick => session.on_tick(now),
            TimerEvent::Resize => {}
            TimerEvent::Sample(sample) => session.on_sample(sample, now),
            TimerEvent::Key(key) => {
                if key.kind == KeyEventKind::Repeat {
                    continue;
                }
                match key.code {
                    KeyCode::Char(' ') => match (release_events, key.kind) {
                        (true, KeyEventKind::Press) => session.on_press(now),
                        (true, KeyEventKind::Release) => session.on_release(now),
                        (false, KeyEventKind::Press) => session.on_tap(now),
                        _ => {}
                    },
                    _ if key.kind != KeyEventKind::Press => {}
                    KeyCode::Esc => break,
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break,
                    KeyCode::Enter | KeyCode::Char('n') => session.next_round(),
                    KeyCode::Char('x') => session.cancel(),
                    KeyCode::Char('m') => {
                        let next = match session.mode() {
                            InputMode::Manual => InputMode::Motion,
                            InputMode::Motion => InputMode::Manual,
                        };
                        session.set_mode(next, now);
                    }
                    KeyCode::Char('d') => session.toggle_latest_dnf(),
                    KeyCode::Char('u') => session.delete_latest(),
                    KeyCode::Char('C') => session.clear_history(),
                    KeyCode::Char('+') | KeyCode::Char('=') => {
                        session.adjust_sensitivity(5);
                    }
                    KeyCode::Char('-') => {
                        session.adjust_sensitivity(-5);
                    }
                    _ => {}
                }
            }
        }
    }

    // Runtime +/- tweaks are worth keeping for next launch.
    cfg.sensitivity = session.sensitivity();

    Ok(())
}
