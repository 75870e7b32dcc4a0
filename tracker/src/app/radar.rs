use chrono::{DateTime, TimeZone, Utc};
use rainviewer::{RadarFrame, WeatherMaps};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

use crate::app::error::TrackerError;
use crate::app::timer::{FrameTimer, IntervalTimer};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FrameKind {
    /// Observed precipitation
    Past,
    /// Nowcast projection
    Forecast,
}

/// One radar image reference
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Frame {
    pub path: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    pub kind: FrameKind,
}

impl Frame {
    /// `None` for frames whose time cannot be represented
    fn from_provider(frame: &RadarFrame, kind: FrameKind) -> Option<Self> {
        let Some(timestamp) = frame.time_ms() else {
            warn!("radar: skipping frame {} with out-of-range time {}", frame.path, frame.time);
            return None;
        };
        Some(Self {
            path: frame.path.clone(),
            timestamp,
            kind,
        })
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }
}

/// Relative time of a frame against the wall clock
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TimeLabel {
    Now,
    MinutesAgo(i64),
    MinutesAhead(i64),
}

impl TimeLabel {
    pub fn between(timestamp_ms: i64, now: DateTime<Utc>) -> Self {
        let diff_ms = timestamp_ms.saturating_sub(now.timestamp_millis());
        // Half-minutes round towards +inf.
        let minutes = (diff_ms as f64 / 60_000.0 + 0.5).floor() as i64;

        if minutes.abs() < 2 {
            TimeLabel::Now
        } else if minutes < 0 {
            TimeLabel::MinutesAgo(-minutes)
        } else {
            TimeLabel::MinutesAhead(minutes)
        }
    }
}

impl fmt::Display for TimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeLabel::Now => write!(f, "now"),
            TimeLabel::MinutesAgo(m) => write!(f, "{} minutes ago", m),
            TimeLabel::MinutesAhead(m) => write!(f, "in {} minutes (forecast)", m),
        }
    }
}

/// Anything a frame slider may hand over as a position
///
/// Text is read the way a range input reports it: leading integer, the rest
/// ignored. Values that carry no integer yield `None`.
pub trait IntoFrameIndex {
    fn into_frame_index(self) -> Option<i64>;
}

impl IntoFrameIndex for i64 {
    fn into_frame_index(self) -> Option<i64> {
        Some(self)
    }
}

impl IntoFrameIndex for i32 {
    fn into_frame_index(self) -> Option<i64> {
        Some(self as i64)
    }
}

impl IntoFrameIndex for u32 {
    fn into_frame_index(self) -> Option<i64> {
        Some(self as i64)
    }
}

impl IntoFrameIndex for usize {
    fn into_frame_index(self) -> Option<i64> {
        Some(i64::try_from(self).unwrap_or(i64::MAX))
    }
}

impl IntoFrameIndex for f64 {
    fn into_frame_index(self) -> Option<i64> {
        self.is_finite().then(|| self.trunc() as i64)
    }
}

impl IntoFrameIndex for &str {
    fn into_frame_index(self) -> Option<i64> {
        let s = self.trim_start();
        let (sign, digits) = match s.as_bytes().first() {
            Some(b'-') => (-1, &s[1..]),
            Some(b'+') => (1, &s[1..]),
            _ => (1, s),
        };
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        if end == 0 {
            return None;
        }
        // Overlong input still means "very far right"; clamping handles it.
        let magnitude = digits[..end].parse::<i64>().unwrap_or(i64::MAX);
        Some(sign * magnitude)
    }
}

impl IntoFrameIndex for String {
    fn into_frame_index(self) -> Option<i64> {
        self.as_str().into_frame_index()
    }
}

impl IntoFrameIndex for &String {
    fn into_frame_index(self) -> Option<i64> {
        self.as_str().into_frame_index()
    }
}

/// Lifecycle position of a controller; visibility is tracked separately
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub enum PlaybackState {
    Idle,
    Paused,
    Playing,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RadarStatus {
    pub visible: bool,
    pub animating: bool,
    pub state: PlaybackState,
    pub frame_count: usize,
    pub active_index: usize,
    pub label: Option<String>,
    pub last_update: Option<DateTime<Utc>>,
}

/// Frames of one successful load; replaced as a whole, never patched
#[derive(Clone, Debug, Default)]
struct LayerSet {
    frames: Vec<Frame>,
    active_index: usize,
    generated: Option<DateTime<Utc>>,
}

impl LayerSet {
    fn from_maps(maps: &WeatherMaps) -> Self {
        let past = maps
            .radar
            .past
            .iter()
            .filter_map(|f| Frame::from_provider(f, FrameKind::Past));
        let nowcast = maps
            .radar
            .nowcast
            .iter()
            .filter_map(|f| Frame::from_provider(f, FrameKind::Forecast));

        let mut set = Self {
            frames: past.chain(nowcast).collect(),
            active_index: 0,
            generated: maps.generated.and_then(|g| Utc.timestamp_opt(g, 0).single()),
        };
        set.active_index = set.current_index();
        set
    }

    /// Index of the most recent past frame, or 0 without any
    fn current_index(&self) -> usize {
        self.frames
            .iter()
            .rposition(|f| f.kind == FrameKind::Past)
            .unwrap_or(0)
    }
}

/// Scrubbable, animatable sequence of radar frames
pub struct RadarController<T: FrameTimer = IntervalTimer> {
    layers: LayerSet,
    loaded: bool,
    visible: bool,
    animating: bool,
    label: Option<TimeLabel>,
    timer: T,
    period: Duration,
    clock: fn() -> DateTime<Utc>,
}

impl RadarController<IntervalTimer> {
    pub fn new(period: Duration) -> Self {
        Self::with_timer(IntervalTimer::new(), period)
    }
}

impl<T: FrameTimer> RadarController<T> {
    pub fn with_timer(timer: T, period: Duration) -> Self {
        Self {
            layers: LayerSet::default(),
            loaded: false,
            visible: true,
            animating: false,
            label: None,
            timer,
            period,
            clock: Utc::now,
        }
    }

    /// Replace the wall clock used for relative-time labels
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Install a freshly fetched listing.
    pub fn load(&mut self, maps: &WeatherMaps) {
        let layers = LayerSet::from_maps(maps);
        info!(
            "radar: loaded {} frames ({} past), current index {}",
            layers.frames.len(),
            layers.frames.iter().filter(|f| f.kind == FrameKind::Past).count(),
            layers.active_index
        );
        self.layers = layers;
        self.loaded = true;
        self.update_label();
    }

    /// Install the outcome of a fetch; a failed fetch keeps the last good frames.
    pub fn load_result(&mut self, fetched: anyhow::Result<WeatherMaps>) -> Result<(), TrackerError> {
        match fetched {
            Ok(maps) => {
                self.load(&maps);
                Ok(())
            }
            Err(e) => {
                warn!("radar: fetch failed, keeping {} previous frames: {:#}", self.layers.frames.len(), e);
                Err(TrackerError::unavailable(&e))
            }
        }
    }

    /// Like [`load_result`](Self::load_result), with playback paused around the swap.
    pub fn refresh(&mut self, fetched: anyhow::Result<WeatherMaps>) -> Result<(), TrackerError> {
        let was_animating = self.animating;
        if was_animating {
            self.pause();
        }

        let result = self.load_result(fetched);

        if was_animating {
            self.play();
        }
        result
    }

    /// Move to a frame; out-of-range positions are clamped. Returns the new index.
    pub fn select_frame<I: IntoFrameIndex>(&mut self, index: I) -> usize {
        let Some(requested) = index.into_frame_index() else {
            debug!("radar: ignoring non-numeric frame position");
            return self.layers.active_index;
        };
        if self.layers.frames.is_empty() {
            return self.layers.active_index;
        }

        let last = self.layers.frames.len() as i64 - 1;
        self.layers.active_index = requested.clamp(0, last) as usize;
        self.update_label();
        debug!(
            "radar: frame {} of {} ({})",
            self.layers.active_index,
            self.layers.frames.len(),
            self.label.map(|l| l.to_string()).unwrap_or_default()
        );
        self.layers.active_index
    }

    pub fn play(&mut self) {
        if self.animating || self.layers.frames.is_empty() {
            return;
        }
        self.animating = true;
        self.timer.schedule(self.period);
        info!("radar: animation started ({} ms per frame)", self.period.as_millis());
    }

    pub fn pause(&mut self) {
        if !self.animating {
            return;
        }
        self.timer.cancel();
        self.animating = false;
        let current = self.layers.current_index();
        self.select_frame(current);
        info!("radar: animation stopped, back on frame {}", current);
    }

    pub fn toggle_animation(&mut self) -> bool {
        if self.animating {
            self.pause();
        } else {
            self.play();
        }
        self.animating
    }

    /// Advance one frame, wrapping at the end. Returns the new index while playing.
    pub fn tick(&mut self) -> Option<usize> {
        if !self.animating || self.layers.frames.is_empty() {
            return None;
        }
        let next = (self.layers.active_index + 1) % self.layers.frames.len();
        Some(self.select_frame(next))
    }

    pub fn toggle_visibility(&mut self) -> bool {
        self.visible = !self.visible;
        if self.visible {
            self.update_label();
        }
        info!("radar: layer {}", if self.visible { "shown" } else { "hidden" });
        self.visible
    }

    pub fn frames(&self) -> &[Frame] {
        &self.layers.frames
    }

    pub fn active_index(&self) -> usize {
        self.layers.active_index
    }

    /// Home position of playback
    pub fn current_index(&self) -> usize {
        self.layers.current_index()
    }

    pub fn active_frame(&self) -> Option<&Frame> {
        self.layers.frames.get(self.layers.active_index)
    }

    /// The frame a renderer should have on the map, if any
    pub fn displayed_frame(&self) -> Option<&Frame> {
        if self.visible {
            self.active_frame()
        } else {
            None
        }
    }

    pub fn label(&self) -> Option<TimeLabel> {
        self.label
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn state(&self) -> PlaybackState {
        match (self.loaded, self.animating) {
            (false, _) => PlaybackState::Idle,
            (true, false) => PlaybackState::Paused,
            (true, true) => PlaybackState::Playing,
        }
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.layers.generated
    }

    pub fn status(&self) -> RadarStatus {
        RadarStatus {
            visible: self.visible,
            animating: self.animating,
            state: self.state(),
            frame_count: self.layers.frames.len(),
            active_index: self.layers.active_index,
            label: self.label.map(|l| l.to_string()),
            last_update: self.layers.generated,
        }
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    fn update_label(&mut self) {
        let now = (self.clock)();
        self.label = self.active_frame().map(|f| TimeLabel::between(f.timestamp, now));
    }
}
