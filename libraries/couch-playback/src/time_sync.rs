//! Throttled time synchronization
//!
//! Backends report the playhead many times a second. [`TimeSync`] turns that
//! into at most one store dispatch per window while making sure the last
//! value reported before the source goes quiet still reaches the store.

use crate::timer::TimerSlot;
use couch_core::TimeRange;
use std::time::{Duration, Instant};

/// Default throttle window
pub const DEFAULT_TIME_UPDATE_WINDOW: Duration = Duration::from_millis(100);

/// Rate limiter between raw time updates and store dispatches
///
/// Accepted updates are delivered on the next [`TimeSync::poll`] rather than
/// synchronously. Updates inside the window are dropped, except that the
/// newest dropped value is remembered and delivered once the window closes
/// (or immediately on [`TimeSync::flush`]).
#[derive(Debug)]
pub struct TimeSync {
    window: Duration,
    last_dispatch: Option<Instant>,
    scheduled: Option<f64>,
    trailing: Option<f64>,
    slot: TimerSlot,
}

impl TimeSync {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_dispatch: None,
            scheduled: None,
            trailing: None,
            slot: TimerSlot::new("time-sync"),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Feed one raw playhead update
    pub fn on_time_update(&mut self, time: f64, now: Instant) {
        let window_open = self
            .last_dispatch
            .map_or(true, |last| now.saturating_duration_since(last) >= self.window);

        if window_open {
            self.scheduled = Some(time);
            self.trailing = None;
            self.last_dispatch = Some(now);
            self.slot.arm_once(now, Duration::ZERO);
        } else {
            self.trailing = Some(time);
            if !self.slot.is_armed() {
                self.arm_trailing(now);
            }
        }
    }

    /// Deliver the value that is due at `now`, if any
    pub fn poll(&mut self, now: Instant) -> Option<f64> {
        self.slot.fire_due(now)?;

        let value = match self.scheduled.take() {
            Some(value) => value,
            None => self.trailing.take()?,
        };
        self.last_dispatch = Some(now);
        if self.trailing.is_some() {
            self.arm_trailing(now);
        }
        Some(value)
    }

    /// Deliver the newest pending value right away
    ///
    /// Called when the source stops (pause, seek, end) so the final position
    /// is never lost to throttling.
    pub fn flush(&mut self, now: Instant) -> Option<f64> {
        self.slot.cancel();
        let value = self.trailing.take().or_else(|| self.scheduled.take());
        self.scheduled = None;
        if value.is_some() {
            self.last_dispatch = Some(now);
        }
        value
    }

    /// Drop pending values and disarm (owning scope is being torn down)
    pub fn cancel(&mut self) {
        self.slot.cancel();
        self.scheduled = None;
        self.trailing = None;
    }

    /// Restart throttling from scratch, e.g. on a new item
    pub fn reset(&mut self) {
        self.cancel();
        self.last_dispatch = None;
    }

    pub fn has_pending(&self) -> bool {
        self.scheduled.is_some() || self.trailing.is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.slot.deadline()
    }

    fn arm_trailing(&mut self, now: Instant) {
        let opens_at = self.last_dispatch.map_or(now, |last| last + self.window);
        self.slot
            .arm_once(now, opens_at.saturating_duration_since(now));
    }
}

impl Default for TimeSync {
    fn default() -> Self {
        Self::new(DEFAULT_TIME_UPDATE_WINDOW)
    }
}

/// Percentage of the media buffered ahead, for progress bars
///
/// Uses the range containing `current_time`, or the last range when the
/// playhead is outside every range. Returns 0 without ranges or without a
/// usable duration.
pub fn buffered_percentage(ranges: &[TimeRange], current_time: f64, duration: f64) -> f64 {
    if !duration.is_finite() || duration <= 0.0 {
        return 0.0;
    }
    let Some(last) = ranges.last() else {
        return 0.0;
    };
    let range = ranges
        .iter()
        .find(|range| range.contains(current_time))
        .unwrap_or(last);
    (range.end / duration * 100.0).clamp(0.0, 100.0)
}
