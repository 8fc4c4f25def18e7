//! Compute free intervals from occupied intervals.
//!
//! Sorts intervals by start time, merges runs that overlap or sit within
//! the merge tolerance of each other, then sweeps the window once to emit
//! the gaps between merged runs.

use chrono::{Duration, NaiveDateTime};

use super::{merge_tolerance, FreeInterval, OccupiedInterval, TimeWindow};

/// Merge overlapping or near-adjacent intervals.
///
/// Two intervals are contiguous when the second starts no later than
/// `tolerance` after the first one ends. Returns a sorted, non-overlapping list.
pub fn merge_occupied(occupied: &[OccupiedInterval], tolerance: Duration) -> Vec<OccupiedInterval> {
    let mut sorted = occupied.to_vec();
    sorted.sort();

    let mut merged: Vec<OccupiedInterval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        if let Some(last) = merged.last_mut() {
            if interval.start <= last.end + tolerance {
                last.end = last.end.max(interval.end);
                continue;
            }
        }
        merged.push(interval);
    }

    merged
}

/// Free intervals of one court within `window`, each at least `min_duration` long.
///
/// `occupied` may be unsorted and overlapping; it is expected to be clamped
/// to `window` already (see [`super::normalize`]).
pub fn compute_gaps(
    resource_name: &str,
    occupied: &[OccupiedInterval],
    window: &TimeWindow,
    min_duration: Duration,
) -> Vec<FreeInterval> {
    let merged = merge_occupied(occupied, merge_tolerance());

    let mut gaps = Vec::new();
    let mut cursor = window.start;

    let mut emit = |start: NaiveDateTime, end: NaiveDateTime| {
        if end > start && end - start >= min_duration {
            gaps.push(FreeInterval {
                resource_name: resource_name.to_string(),
                start,
                end,
            });
        }
    };

    for busy in &merged {
        emit(cursor, busy.start);
        cursor = cursor.max(busy.end);
    }

    // Trailing gap after the last occupied run.
    emit(cursor, window.end);

    gaps
}


#[cfg(test)]
mod proptests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn base() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 20)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    /// Intervals as (start second, length seconds) pairs inside 08:00-22:00
    fn intervals() -> impl Strategy<Value = Vec<OccupiedInterval>> {
        prop::collection::vec((8 * 3600i64..22 * 3600, 1i64..4 * 3600), 0..12).prop_map(|pairs| {
            pairs
                .into_iter()
                .map(|(start, len)| OccupiedInterval {
                    start: base() + Duration::seconds(start),
                    end: base() + Duration::seconds((start + len).min(22 * 3600)),
                })
                .filter(|i| i.start < i.end)
                .collect()
        })
    }

    fn full_window() -> TimeWindow {
        TimeWindow::new(base() + Duration::hours(8), base() + Duration::hours(22)).unwrap()
    }

    proptest! {
        /// Merging is idempotent
        #[test]
        fn merge_idempotent(occupied in intervals()) {
            let once = merge_occupied(&occupied, merge_tolerance());
            let twice = merge_occupied(&once, merge_tolerance());
            prop_assert_eq!(once, twice);
        }

        /// Merged runs are sorted and separated by more than the tolerance
        #[test]
        fn merged_runs_are_separated(occupied in intervals()) {
            let merged = merge_occupied(&occupied, merge_tolerance());
            for pair in merged.windows(2) {
                prop_assert!(pair[1].start > pair[0].end + merge_tolerance());
            }
        }

        /// No gap is shorter than the minimum and no two gaps overlap
        #[test]
        fn gaps_respect_min_and_do_not_overlap(occupied in intervals(), min_minutes in 0i64..180) {
            let min = Duration::minutes(min_minutes);
            let gaps = compute_gaps("Pista 1", &occupied, &full_window(), min);
            for gap in &gaps {
                prop_assert!(gap.duration() >= min);
                prop_assert!(gap.start < gap.end);
            }
            for pair in gaps.windows(2) {
                prop_assert!(pair[0].end <= pair[1].start);
            }
        }

        /// Gaps never intersect an occupied interval
        #[test]
        fn gaps_avoid_occupied(occupied in intervals()) {
            let gaps = compute_gaps("Pista 1", &occupied, &full_window(), Duration::zero());
            for gap in &gaps {
                for busy in &occupied {
                    prop_assert!(gap.end <= busy.start || gap.start >= busy.end);
                }
            }
        }

        /// Without a minimum, occupied runs plus gaps cover the window exactly
        #[test]
        fn gaps_and_runs_partition_window(occupied in intervals()) {
            let window = full_window();
            let merged = merge_occupied(&occupied, merge_tolerance());
            let gaps = compute_gaps("Pista 1", &occupied, &window, Duration::zero());
            let busy_total = merged.iter().fold(Duration::zero(), |acc, i| acc + (i.end - i.start));
            let free_total = gaps.iter().fold(Duration::zero(), |acc, g| acc + g.duration());
            prop_assert_eq!(busy_total + free_total, window.duration());
        }

        /// Shrinking the window never produces a slot outside the larger window's slots
        #[test]
        fn shrinking_window_is_monotonic(
            occupied in intervals(),
            trim_start in 0i64..6 * 3600,
            trim_end in 0i64..6 * 3600,
            min_minutes in 1i64..120,
        ) {
            let large = full_window();
            let Some(small) = TimeWindow::new(
                large.start + Duration::seconds(trim_start),
                large.end - Duration::seconds(trim_end),
            ) else {
                return Ok(());
            };
            let clamp = |w: &TimeWindow| -> Vec<OccupiedInterval> {
                occupied
                    .iter()
                    .filter_map(|i| crate::slots::normalize::clamp_to_window(i.start, i.end, w).ok())
                    .collect()
            };

            let min = Duration::minutes(min_minutes);
            let large_gaps = compute_gaps("Pista 1", &clamp(&large), &large, min);
            let small_gaps = compute_gaps("Pista 1", &clamp(&small), &small, min);

            for gap in &small_gaps {
                prop_assert!(
                    large_gaps.iter().any(|g| g.start <= gap.start && gap.end <= g.end),
                    "slot {} not implied by the larger window", gap
                );
            }
        }
    }
}
