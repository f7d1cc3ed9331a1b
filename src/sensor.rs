use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

/// One raw 3-axis acceleration sample in m/s². A `None` axis means the
/// device could not report that component; such samples carry no usable
/// magnitude and are skipped by the filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SensorSample {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub timestamp_ms: u64,
}

impl SensorSample {
    pub fn magnitude(&self) -> Option<f64> {
        let (x, y, z) = (self.x?, self.y?, self.z?);
        Some((x * x + y * y + z * z).sqrt())
    }

    /// Parses one feed line: three whitespace-separated fields, each a float
    /// or `-` for a missing axis. Returns None for malformed lines.
    pub fn parse_line(line: &str, timestamp_ms: u64) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let x = parse_axis(fields.next()?)?;
        let y = parse_axis(fields.next()?)?;
        let z = parse_axis(fields.next()?)?;
        if fields.next().is_some() {
            return None;
        }
        Some(Self {
            x,
            y,
            z,
            timestamp_ms,
        })
    }
}

fn parse_axis(field: &str) -> Option<Option<f64>> {
    if field == "-" {
        return Some(None);
    }
    field.parse::<f64>().ok().map(Some)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriState {
    Unknown,
    Yes,
    No,
}

/// Availability and permission, each set at most once per session except
/// when re-probed after a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorState {
    pub available: TriState,
    pub permission: TriState,
}

impl SensorState {
    pub fn unknown() -> Self {
        Self {
            available: TriState::Unknown,
            permission: TriState::Unknown,
        }
    }

    pub fn usable(&self) -> bool {
        self.available == TriState::Yes && self.permission == TriState::Yes
    }
}

#[derive(Debug)]
pub enum SensorError {
    /// No motion capability on this platform (no feed configured, or the
    /// feed path does not exist).
    Unavailable,
    /// Explicit platform denial, or inferred denial from a silent probe
    /// window.
    PermissionDenied,
    Feed(io::Error),
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SensorError::Unavailable => write!(f, "motion sensor unavailable"),
            SensorError::PermissionDenied => write!(f, "motion sensor permission denied"),
            SensorError::Feed(e) => write!(f, "sensor feed error: {}", e),
        }
    }
}

impl std::error::Error for SensorError {}

/// Capability probe, called once at initialization.
pub fn probe_capability(feed: Option<&Path>) -> TriState {
    match feed {
        Some(path) if path.exists() => TriState::Yes,
        _ => TriState::No,
    }
}

/// How long to wait for a first sample before inferring a denial.
pub const PERMISSION_PROBE_MS: u64 = 500;

/// Permission inference for platforms without an explicit grant API: if any
/// sample arrives within the probe window the grant is implied, silence
/// implies denial. Inherently racy; treat the result as approximate, not
/// authoritative.
#[derive(Debug, Clone, Copy)]
pub struct PermissionProbe {
    started_ms: u64,
}

impl PermissionProbe {
    pub fn start(now_ms: u64) -> Self {
        Self { started_ms: now_ms }
    }

    /// A sample arrived: permission is granted.
    pub fn on_sample(&self) -> TriState {
        TriState::Yes
    }

    /// Silence past the window reads as denied; inside the window the
    /// outcome is still open.
    pub fn check(&self, now_ms: u64) -> Option<TriState> {
        if now_ms.saturating_sub(self.started_ms) >= PERMISSION_PROBE_MS {
            Some(TriState::No)
        } else {
            None
        }
    }
}

/// Reader-thread adapter for a line-oriented acceleration feed (typically a
/// FIFO written by a device bridge). Opening the feed is the permission
/// request and must happen as a direct result of a user interaction.
///
/// The thread exits when the feed closes or the receiver is dropped, so the
/// subscription never outlives the session that enabled it.
pub struct FeedReader;

impl FeedReader {
    pub fn spawn(path: &Path, epoch: Instant) -> Result<Receiver<SensorSample>, SensorError> {
        if !path.exists() {
            return Err(SensorError::Unavailable);
        }
        let file = File::open(path).map_err(|e| match e.kind() {
            io::ErrorKind::PermissionDenied => SensorError::PermissionDenied,
            _ => SensorError::Feed(e),
        })?;

        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let reader = BufReader::new(file);
            for line in reader.lines() {
                let Ok(line) = line else { break };
                let timestamp_ms = epoch.elapsed().as_millis() as u64;
                if let Some(sample) = SensorSample::parse_line(&line, timestamp_ms) {
                    if tx.send(sample).is_err() {
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }
}
