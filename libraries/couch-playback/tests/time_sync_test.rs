//! Throttled time sync properties

use couch_core::TimeRange;
use couch_playback::{buffered_percentage, TimeSync};
use proptest::prelude::*;
use std::time::{Duration, Instant};

const WINDOW: Duration = Duration::from_millis(100);

proptest! {
    /// Property: at most one delivery per window, and the last raw value is
    /// delivered once the source goes quiet
    #[test]
    fn bounded_rate_and_final_value_delivered(
        gaps in prop::collection::vec(1u64..60, 1..200),
        poll_every in 1u64..30,
    ) {
        let start = Instant::now();
        let mut sync = TimeSync::new(WINDOW);

        // Raw updates at increasing offsets, value = offset in seconds
        let mut offsets = Vec::with_capacity(gaps.len());
        let mut offset = 0;
        for gap in gaps {
            offset += gap;
            offsets.push(offset);
        }
        let end = offsets.last().copied().unwrap_or(0) + 1000;

        let mut deliveries: Vec<(u64, f64)> = Vec::new();
        let mut next_update = 0;
        let mut now_ms = 0;
        while now_ms <= end {
            while next_update < offsets.len() && offsets[next_update] <= now_ms {
                let at = offsets[next_update];
                sync.on_time_update(at as f64 / 1000.0, start + Duration::from_millis(at));
                next_update += 1;
            }
            if let Some(value) = sync.poll(start + Duration::from_millis(now_ms)) {
                deliveries.push((now_ms, value));
            }
            now_ms += poll_every;
        }

        for pair in deliveries.windows(2) {
            prop_assert!(pair[1].0 - pair[0].0 >= 100, "two deliveries inside one window: {:?}", pair);
        }
        let last_raw = *offsets.last().unwrap() as f64 / 1000.0;
        prop_assert_eq!(deliveries.last().map(|d| d.1), Some(last_raw));
    }

    /// Property: flush always surfaces the newest pending value
    #[test]
    fn flush_returns_newest_value(times in prop::collection::vec(0.0f64..10_000.0, 1..20)) {
        let start = Instant::now();
        let mut sync = TimeSync::new(WINDOW);
        for (i, time) in times.iter().enumerate() {
            sync.on_time_update(*time, start + Duration::from_millis(i as u64));
        }
        prop_assert_eq!(sync.flush(start + Duration::from_millis(50)), times.last().copied());
        prop_assert!(!sync.has_pending());
    }

    /// Property: coverage is always within 0-100
    #[test]
    fn coverage_bounded(
        bounds in prop::collection::vec((0.0f64..500.0, 0.0f64..100.0), 0..6),
        current in -10.0f64..700.0,
        duration in -10.0f64..700.0,
    ) {
        let ranges: Vec<TimeRange> = bounds
            .into_iter()
            .map(|(start, len)| TimeRange::new(start, start + len).unwrap())
            .collect();
        let pct = buffered_percentage(&ranges, current, duration);
        prop_assert!((0.0..=100.0).contains(&pct));
    }
}

#[test]
fn coverage_uses_containing_range() {
    let ranges = vec![
        TimeRange::new(0.0, 10.0).unwrap(),
        TimeRange::new(30.0, 50.0).unwrap(),
        TimeRange::new(70.0, 80.0).unwrap(),
    ];
    assert_eq!(buffered_percentage(&ranges, 35.0, 100.0), 50.0);
    assert_eq!(buffered_percentage(&ranges, 5.0, 100.0), 10.0);
    // Between ranges falls back to the last range
    assert_eq!(buffered_percentage(&ranges, 20.0, 100.0), 80.0);
    assert_eq!(buffered_percentage(&[], 20.0, 100.0), 0.0);
}
