//! Time sources and time-related value types used during playback.

use std::{
    fmt,
    str::FromStr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

use crate::{PlaybackError, Result};

/// Resolution of the playback slider.
pub const SLIDER_MAX: u32 = 1000;

/// Monotonic time source. Readings never go backwards.
pub trait ClockSource {
    /// Time since an arbitrary, fixed origin.
    fn now(&self) -> Duration;
}

/// Wall-clock source backed by [`Instant`], unaffected by system clock changes.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSource for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced clock. Clones share the same reading, so a simulation
/// can hold one handle while the controller owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, delta: Duration) {
        let nanos = u64::try_from(delta.as_nanos()).unwrap_or(u64::MAX);
        // Saturate instead of wrapping so readings never go backwards.
        let _ = self
            .nanos
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                Some(current.saturating_add(nanos))
            });
    }

    pub fn advance_secs(&self, seconds: f64) {
        if seconds > 0.0 {
            self.advance(Duration::from_secs_f64(seconds));
        }
    }
}

impl ClockSource for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

/// Elapsed time since the last [`PlaybackClock::reset`].
#[derive(Debug, Clone)]
pub struct PlaybackClock<C = MonotonicClock> {
    source: C,
    baseline: Duration,
}

impl PlaybackClock<MonotonicClock> {
    pub fn start() -> Self {
        Self::with_source(MonotonicClock::new())
    }
}

impl<C: ClockSource> PlaybackClock<C> {
    pub fn with_source(source: C) -> Self {
        let baseline = source.now();
        Self { source, baseline }
    }

    pub fn reset(&mut self) {
        self.baseline = self.source.now();
    }

    pub fn elapsed(&self) -> Duration {
        self.source.now().saturating_sub(self.baseline)
    }

    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed().as_secs_f64()
    }
}

/// Positive rational playback speed, e.g. `1/2x` or `2x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlaybackSpeed {
    numerator: u32,
    denominator: u32,
}

impl PlaybackSpeed {
    pub const NORMAL: Self = Self {
        numerator: 1,
        denominator: 1,
    };

    pub fn new(numerator: u32, denominator: u32) -> Result<Self> {
        if numerator == 0 || denominator == 0 {
            return Err(PlaybackError::unknown(
                "playback speed",
                &format!("{numerator}/{denominator}"),
            ));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn factor(self) -> f64 {
        f64::from(self.numerator) / f64::from(self.denominator)
    }

    /// Converts elapsed wall time into playback time.
    pub fn scale(self, seconds: f64) -> f64 {
        seconds * f64::from(self.numerator) / f64::from(self.denominator)
    }
}

impl Default for PlaybackSpeed {
    fn default() -> Self {
        Self::NORMAL
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator == 1 {
            write!(f, "{}x", self.numerator)
        } else {
            write!(f, "{}/{}x", self.numerator, self.denominator)
        }
    }
}

impl FromStr for PlaybackSpeed {
    type Err = PlaybackError;

    fn from_str(value: &str) -> Result<Self> {
        let trimmed = value.trim();
        let body = trimmed.strip_suffix(&['x', 'X'][..]).unwrap_or(trimmed).trim();
        let parse = |part: &str| {
            part.trim()
                .parse::<u32>()
                .map_err(|_| PlaybackError::unknown("playback speed", value))
        };
        let speed = match body.split_once('/') {
            Some((numerator, denominator)) => Self::new(parse(numerator)?, parse(denominator)?),
            None => Self::new(parse(body)?, 1),
        };
        speed.map_err(|_| PlaybackError::unknown("playback speed", value))
    }
}

impl TryFrom<String> for PlaybackSpeed {
    type Error = PlaybackError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<PlaybackSpeed> for String {
    fn from(speed: PlaybackSpeed) -> Self {
        speed.to_string()
    }
}

/// Position of the time slider, `0..=SLIDER_MAX`.
///
/// Conversion from time rounds to the nearest step, so a playback time equal
/// to the plan end always lands on [`SLIDER_MAX`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SliderPosition(u32);

impl SliderPosition {
    pub const START: Self = Self(0);
    pub const END: Self = Self(SLIDER_MAX);

    pub fn new(value: i64) -> Self {
        Self(value.clamp(0, i64::from(SLIDER_MAX)) as u32)
    }

    pub fn from_time(time: f64, end_time: f64) -> Self {
        if end_time <= 0.0 || time.is_nan() {
            return Self::START;
        }
        let steps = (f64::from(SLIDER_MAX) * time / end_time).round();
        Self::new(steps as i64)
    }

    pub fn value(self) -> u32 {
        self.0
    }

    pub fn time(self, end_time: f64) -> f64 {
        if self == Self::END {
            return end_time;
        }
        f64::from(self.0) / f64::from(SLIDER_MAX) * end_time
    }
}

/// Text of the playback time label.
pub fn time_label(seconds: f64) -> String {
    format!("Time: {seconds:.2} s")
}

/// Pacing for the cooperative animation loop. Missed ticks are skipped
/// rather than queued; playback time is derived from the clock, not from
/// the number of ticks.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationTimer {
    target_fps: u32,
}

impl AnimationTimer {
    pub fn new(target_fps: u32) -> Self {
        Self {
            target_fps: target_fps.max(1),
        }
    }

    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(1) / self.target_fps
    }

    /// Deadline for the tick following one that was scheduled at `previous`.
    pub fn next_deadline(&self, previous: Duration, now: Duration) -> Duration {
        let next = previous + self.interval();
        if next < now {
            now
        } else {
            next
        }
    }
}

impl Default for AnimationTimer {
    fn default() -> Self {
        Self::new(60)
    }
}
