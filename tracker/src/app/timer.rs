use std::time::Duration;
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Schedule/cancel pair behind radar playback
///
/// Only [`RadarController::play`](crate::RadarController::play) and
/// [`RadarController::pause`](crate::RadarController::pause) call into it.
pub trait FrameTimer {
    fn schedule(&mut self, period: Duration);
    fn cancel(&mut self);
    fn is_scheduled(&self) -> bool;
}

/// Tokio interval owned by the controller; the event loop awaits [`IntervalTimer::tick`]
#[derive(Default)]
pub struct IntervalTimer {
    interval: Option<Interval>,
}

impl IntervalTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves on the next scheduled tick, or never while nothing is scheduled.
    pub async fn tick(&mut self) {
        match self.interval.as_mut() {
            Some(interval) => {
                interval.tick().await;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

impl FrameTimer for IntervalTimer {
    fn schedule(&mut self, period: Duration) {
        // First tick one period from now, not immediately.
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.interval = Some(interval);
    }

    fn cancel(&mut self) {
        self.interval = None;
    }

    fn is_scheduled(&self) -> bool {
        self.interval.is_some()
    }
}

/// Timer for hosts that deliver ticks themselves
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ManualTimer {
    period: Option<Duration>,
    pub schedules: usize,
    pub cancels: usize,
}

impl ManualTimer {
    pub fn period(&self) -> Option<Duration> {
        self.period
    }
}

impl FrameTimer for ManualTimer {
    fn schedule(&mut self, period: Duration) {
        self.period = Some(period);
        self.schedules += 1;
    }

    fn cancel(&mut self) {
        self.period = None;
        self.cancels += 1;
    }

    fn is_scheduled(&self) -> bool {
        self.period.is_some()
    }
}
