//! Autoplay countdown engine
//!
//! ```text
//!            item end (enabled, next found)
//!   Idle ─────────────────────────────────▶ CountingDown ──tick──┐
//!    ▲                                       │    │   ▲          │
//!    │ next item end                 confirm │    │   └──────────┘
//!    │                             or expiry ▼    ▼ cancel
//!    └──────────────────────────── Confirmed    Cancelled
//! ```
//!
//! The engine owns two timer slots: a one second tick interval for the
//! visible countdown, and a single deferred timeout used when no countdown
//! is shown. At most one of them is armed at a time and any new item end
//! clears both before arming.

use crate::timer::{earliest, TimerSlot};
use couch_core::{ItemId, PlaylistItem};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::debug;

/// Default countdown length in seconds
pub const DEFAULT_AUTOPLAY_DELAY_SECS: u32 = 5;

const TICK: Duration = Duration::from_secs(1);

/// Countdown lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoPlayPhase {
    #[default]
    Idle,
    CountingDown,
    Confirmed,
    Cancelled,
}

impl AutoPlayPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CountingDown => "counting_down",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for AutoPlayPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Autoplay behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoPlaySettings {
    pub enabled: bool,

    /// Seconds between item end and the next item starting
    pub delay_secs: u32,

    /// Tick every second; when false the delay elapses silently
    pub show_countdown: bool,
}

impl Default for AutoPlaySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_secs: DEFAULT_AUTOPLAY_DELAY_SECS,
            show_countdown: true,
        }
    }
}

/// What the engine asks its owner to do
#[derive(Debug, Clone, PartialEq)]
pub enum AutoPlaySignal {
    Started { next: PlaylistItem, countdown_secs: u32 },
    Tick { remaining: u32 },
    Cancelled { next: PlaylistItem },
    /// Start `item`; emitted at most once per item end
    Play { item: PlaylistItem },
}

/// Countdown state machine
#[derive(Debug)]
pub struct AutoPlayEngine {
    settings: AutoPlaySettings,
    phase: AutoPlayPhase,
    target: Option<PlaylistItem>,
    remaining: u32,
    tick: TimerSlot,
    delay: TimerSlot,
}

impl AutoPlayEngine {
    pub fn new(settings: AutoPlaySettings) -> Self {
        Self {
            settings,
            phase: AutoPlayPhase::Idle,
            target: None,
            remaining: 0,
            tick: TimerSlot::new("autoplay_tick"),
            delay: TimerSlot::new("autoplay_delay"),
        }
    }

    pub fn settings(&self) -> AutoPlaySettings {
        self.settings
    }

    pub fn phase(&self) -> AutoPlayPhase {
        self.phase
    }

    /// Seconds left on the visible countdown
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Item the armed countdown will play
    pub fn target(&self) -> Option<&PlaylistItem> {
        self.target.as_ref()
    }

    pub fn is_counting_down(&self) -> bool {
        self.phase == AutoPlayPhase::CountingDown
    }

    /// Enable or disable autoplay
    ///
    /// Disabling mid countdown cancels it.
    pub fn set_enabled(&mut self, enabled: bool) -> Option<AutoPlaySignal> {
        self.settings.enabled = enabled;
        if enabled {
            None
        } else {
            self.cancel()
        }
    }

    /// Applies from the next item end
    pub fn set_delay_secs(&mut self, delay_secs: u32) {
        self.settings.delay_secs = delay_secs;
    }

    /// Applies from the next item end
    pub fn set_show_countdown(&mut self, show_countdown: bool) {
        self.settings.show_countdown = show_countdown;
    }

    /// React to the current item ending
    ///
    /// Any armed timer is cleared first. `next` is the resolved successor,
    /// `None` when traversal is exhausted.
    pub fn on_item_end(&mut self, now: Instant, next: Option<PlaylistItem>) -> Vec<AutoPlaySignal> {
        self.clear_timers();
        self.phase = AutoPlayPhase::Idle;
        self.target = None;
        self.remaining = 0;

        let Some(next) = next.filter(|_| self.settings.enabled) else {
            return Vec::new();
        };

        let delay = self.settings.delay_secs;
        debug!(next = %next.id, delay, "autoplay countdown armed");
        let mut signals = vec![AutoPlaySignal::Started {
            next: next.clone(),
            countdown_secs: delay,
        }];

        self.phase = AutoPlayPhase::CountingDown;
        self.target = Some(next);
        self.remaining = delay;

        if delay == 0 {
            signals.extend(self.confirm());
        } else if self.settings.show_countdown {
            self.tick.arm_interval(now, TICK);
        } else {
            self.delay.arm_once(now, TICK * delay);
        }
        signals
    }

    /// Play the pending item now
    ///
    /// Returns `None` unless a countdown is running, so confirming after
    /// expiry (or twice) never plays twice.
    pub fn confirm(&mut self) -> Option<AutoPlaySignal> {
        if self.phase != AutoPlayPhase::CountingDown {
            return None;
        }
        self.clear_timers();
        self.phase = AutoPlayPhase::Confirmed;
        self.remaining = 0;
        let item = self.target.take()?;
        debug!(item = %item.id, "autoplay confirmed");
        Some(AutoPlaySignal::Play { item })
    }

    /// Abandon the running countdown
    pub fn cancel(&mut self) -> Option<AutoPlaySignal> {
        if self.phase != AutoPlayPhase::CountingDown {
            return None;
        }
        self.clear_timers();
        self.phase = AutoPlayPhase::Cancelled;
        self.remaining = 0;
        let next = self.target.take()?;
        debug!(next = %next.id, "autoplay cancelled");
        Some(AutoPlaySignal::Cancelled { next })
    }

    /// Fire due timers
    ///
    /// `expected` is the next-item reference currently held by the playlist.
    /// When it no longer names the armed target the firing is stale: the
    /// countdown is dropped without playing or notifying.
    pub fn poll(&mut self, now: Instant, expected: Option<&ItemId>) -> Vec<AutoPlaySignal> {
        let mut signals = Vec::new();

        while self.tick.fire_due(now).is_some() {
            if self.is_stale(expected) {
                break;
            }
            self.remaining = self.remaining.saturating_sub(1);
            signals.push(AutoPlaySignal::Tick {
                remaining: self.remaining,
            });
            if self.remaining == 0 {
                signals.extend(self.confirm());
                break;
            }
        }

        if self.delay.fire_due(now).is_some() && !self.is_stale(expected) {
            signals.extend(self.confirm());
        }

        signals
    }

    fn is_stale(&mut self, expected: Option<&ItemId>) -> bool {
        let armed_for = self.target.as_ref().map(|item| &item.id);
        if self.phase == AutoPlayPhase::CountingDown && armed_for == expected {
            return false;
        }
        debug!(
            armed_for = ?armed_for.map(ItemId::as_str),
            expected = ?expected.map(ItemId::as_str),
            "dropping stale autoplay timer"
        );
        self.clear_timers();
        self.phase = AutoPlayPhase::Idle;
        self.target = None;
        self.remaining = 0;
        true
    }

    /// Earliest armed deadline
    pub fn next_deadline(&self) -> Option<Instant> {
        earliest([self.tick.deadline(), self.delay.deadline()])
    }

    pub fn has_armed_timers(&self) -> bool {
        self.tick.is_armed() || self.delay.is_armed()
    }

    /// Drop a running countdown because the owner switched items itself
    ///
    /// A finished cycle keeps its `Confirmed` or `Cancelled` phase until the
    /// next item end.
    pub fn supersede(&mut self) {
        if self.is_counting_down() {
            self.teardown();
        } else {
            self.clear_timers();
        }
    }

    /// Clear every timer and return to idle without notifying
    pub fn teardown(&mut self) {
        self.clear_timers();
        self.phase = AutoPlayPhase::Idle;
        self.target = None;
        self.remaining = 0;
    }

    fn clear_timers(&mut self) {
        self.tick.cancel();
        self.delay.cancel();
    }
}

impl Default for AutoPlayEngine {
    fn default() -> Self {
        Self::new(AutoPlaySettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn next() -> PlaylistItem {
        PlaylistItem::new("ep-2", "Episode 2", "https://cdn.example.com/ep-2.mpd")
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    fn plays(signals: &[AutoPlaySignal]) -> usize {
        signals
            .iter()
            .filter(|s| matches!(s, AutoPlaySignal::Play { .. }))
            .count()
    }

    #[test]
    fn countdown_ticks_to_zero_then_plays_once() {
        let start = Instant::now();
        let mut engine = AutoPlayEngine::default();
        let expected = next().id;

        let started = engine.on_item_end(start, Some(next()));
        assert_eq!(
            started,
            vec![AutoPlaySignal::Started {
                next: next(),
                countdown_secs: 5
            }]
        );
        assert_eq!(engine.remaining(), 5);

        let mut all = Vec::new();
        for n in 1..=5 {
            all.extend(engine.poll(start + secs(n), Some(&expected)));
        }
        let ticks: Vec<u32> = all
            .iter()
            .filter_map(|s| match s {
                AutoPlaySignal::Tick { remaining } => Some(*remaining),
                _ => None,
            })
            .collect();
        assert_eq!(ticks, vec![4, 3, 2, 1, 0]);
        assert_eq!(plays(&all), 1);
        assert_eq!(engine.phase(), AutoPlayPhase::Confirmed);
        assert!(!engine.has_armed_timers());

        assert!(engine.poll(start + secs(10), Some(&expected)).is_empty());
        assert!(engine.confirm().is_none());
    }

    #[test]
    fn late_poll_drains_missed_ticks() {
        let start = Instant::now();
        let mut engine = AutoPlayEngine::default();
        engine.on_item_end(start, Some(next()));

        let signals = engine.poll(start + secs(30), Some(&next().id));
        assert_eq!(signals.len(), 6);
        assert_eq!(plays(&signals), 1);
    }

    #[test]
    fn confirm_then_expiry_plays_once() {
        let start = Instant::now();
        let mut engine = AutoPlayEngine::default();
        engine.on_item_end(start, Some(next()));
        engine.poll(start + secs(2), Some(&next().id));

        assert!(matches!(engine.confirm(), Some(AutoPlaySignal::Play { .. })));
        assert!(engine.confirm().is_none());
        assert!(engine.poll(start + secs(10), Some(&next().id)).is_empty());
    }

    #[test]
    fn cancel_mid_countdown() {
        let start = Instant::now();
        let mut engine = AutoPlayEngine::default();
        engine.on_item_end(start, Some(next()));
        engine.poll(start + secs(2), Some(&next().id));
        assert_eq!(engine.remaining(), 3);

        assert_eq!(
            engine.cancel(),
            Some(AutoPlaySignal::Cancelled { next: next() })
        );
        assert!(engine.cancel().is_none());
        assert!(engine.confirm().is_none());
        assert!(!engine.has_armed_timers());
        assert!(engine.poll(start + secs(10), Some(&next().id)).is_empty());
        assert_eq!(engine.phase(), AutoPlayPhase::Cancelled);
    }

    #[test]
    fn silent_delay_waits_then_plays() {
        let start = Instant::now();
        let mut engine = AutoPlayEngine::new(AutoPlaySettings {
            show_countdown: false,
            ..Default::default()
        });
        engine.on_item_end(start, Some(next()));

        assert!(engine.poll(start + secs(4), Some(&next().id)).is_empty());
        let signals = engine.poll(start + secs(5), Some(&next().id));
        assert_eq!(signals, vec![AutoPlaySignal::Play { item: next() }]);
    }

    #[test]
    fn silent_delay_can_be_cancelled() {
        let start = Instant::now();
        let mut engine = AutoPlayEngine::new(AutoPlaySettings {
            show_countdown: false,
            ..Default::default()
        });
        engine.on_item_end(start, Some(next()));
        assert!(engine.cancel().is_some());
        assert!(engine.poll(start + secs(6), Some(&next().id)).is_empty());
    }

    #[test]
    fn stale_reference_drops_countdown() {
        let start = Instant::now();
        let mut engine = AutoPlayEngine::default();
        engine.on_item_end(start, Some(next()));

        let other = ItemId::new("someone-else");
        assert!(engine.poll(start + secs(1), Some(&other)).is_empty());
        assert_eq!(engine.phase(), AutoPlayPhase::Idle);
        assert!(!engine.has_armed_timers());
    }

    #[test]
    fn new_item_end_replaces_armed_timer() {
        let start = Instant::now();
        let mut engine = AutoPlayEngine::default();
        engine.on_item_end(start, Some(next()));
        engine.poll(start + secs(3), Some(&next().id));

        let third = PlaylistItem::new("ep-3", "Episode 3", "https://cdn.example.com/ep-3.mpd");
        engine.on_item_end(start + secs(3), Some(third.clone()));
        assert_eq!(engine.remaining(), 5);
        assert_eq!(engine.next_deadline(), Some(start + secs(4)));

        let signals = engine.poll(start + secs(8), Some(&third.id));
        assert_eq!(plays(&signals), 1);
        assert_eq!(signals.last(), Some(&AutoPlaySignal::Play { item: third }));
    }

    #[test]
    fn disabled_or_exhausted_stays_idle() {
        let start = Instant::now();
        let mut engine = AutoPlayEngine::default();
        assert!(engine.on_item_end(start, None).is_empty());

        engine.set_enabled(false);
        assert!(engine.on_item_end(start, Some(next())).is_empty());
        assert_eq!(engine.phase(), AutoPlayPhase::Idle);
    }

    #[test]
    fn disabling_mid_countdown_cancels() {
        let start = Instant::now();
        let mut engine = AutoPlayEngine::default();
        engine.on_item_end(start, Some(next()));
        assert!(matches!(
            engine.set_enabled(false),
            Some(AutoPlaySignal::Cancelled { .. })
        ));
    }

    #[test]
    fn zero_delay_plays_immediately() {
        let mut engine = AutoPlayEngine::new(AutoPlaySettings {
            delay_secs: 0,
            ..Default::default()
        });
        let signals = engine.on_item_end(Instant::now(), Some(next()));
        assert_eq!(signals.len(), 2);
        assert_eq!(plays(&signals), 1);
    }
}
