//! Clock source: wall-clock time and the 1 Hz tick that drives the countdown.
//!
//! The engine never sleeps or spawns anything. It arms a [`TickSource`] when
//! it starts running and disarms it on every transition out of RUNNING; the
//! owner of the engine waits on the source and calls `tick()`.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::{Instant, Interval, MissedTickBehavior};

/// Source of "now" for event timestamps and calendar navigation.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, at: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = at;
    }

    pub fn advance(&self, by: chrono::Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Arm/disarm handle for a periodic tick.
///
/// Arming an already armed source must not create a second schedule.
pub trait TickSource {
    fn arm(&mut self);
    fn disarm(&mut self);
    fn is_armed(&self) -> bool;
}

/// Tick source driven by hand. Records how often it was armed and disarmed.
#[derive(Debug, Clone, Default)]
pub struct ManualTicker {
    armed: bool,
    arm_count: u32,
    disarm_count: u32,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm_count(&self) -> u32 {
        self.arm_count
    }

    pub fn disarm_count(&self) -> u32 {
        self.disarm_count
    }
}

impl TickSource for ManualTicker {
    fn arm(&mut self) {
        if !self.armed {
            self.armed = true;
            self.arm_count += 1;
        }
    }

    fn disarm(&mut self) {
        if self.armed {
            self.armed = false;
            self.disarm_count += 1;
        }
    }

    fn is_armed(&self) -> bool {
        self.armed
    }
}

/// Tokio-backed tick source.
///
/// The interval is created lazily on the first `next_tick()` after arming,
/// so arming outside a runtime is fine. The first tick fires one full period
/// after that.
#[derive(Debug)]
pub struct IntervalTicker {
    period: Duration,
    armed: bool,
    interval: Option<Interval>,
}

impl IntervalTicker {
    pub fn new() -> Self {
        Self::with_period(Duration::from_secs(1))
    }

    pub fn with_period(period: Duration) -> Self {
        Self {
            period,
            armed: false,
            interval: None,
        }
    }

    /// Resolves on the next tick while armed; never resolves while disarmed.
    ///
    /// Cancel safe, so it can sit in a `tokio::select!` next to user input.
    pub async fn next_tick(&mut self) {
        if !self.armed {
            std::future::pending::<()>().await;
        }
        let period = self.period;
        let interval = self.interval.get_or_insert_with(|| {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            interval
        });
        interval.tick().await;
    }
}

impl Default for IntervalTicker {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for IntervalTicker {
    fn arm(&mut self) {
        self.armed = true;
    }

    fn disarm(&mut self) {
        self.armed = false;
        self.interval = None;
    }

    fn is_armed(&self) -> bool {
        self.armed
    }
}
