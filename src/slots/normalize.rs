//! Turn raw occupancy records into clamped, validated intervals.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use tracing::debug;

use super::{OccupiedInterval, RawOccupation, TimeWindow};

/// Why a record did not produce an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Start or end could not be resolved from either representation
    Unresolved,
    /// The interval lies entirely before or after the window
    OutsideWindow,
    /// Zero or negative length after clamping
    Degenerate,
}

/// Where an instant comes from, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstantSource {
    /// Milliseconds since the Unix epoch
    EpochMillis(i64),
    /// Wall-clock time on the day's base date
    Clock(NaiveTime),
}

impl InstantSource {
    /// Pick the timestamp when it parses, otherwise fall back to the clock string.
    pub fn select(stamp: Option<&str>, clock: Option<&str>) -> Option<Self> {
        stamp
            .and_then(parse_epoch_millis)
            .map(InstantSource::EpochMillis)
            .or_else(|| clock.and_then(parse_clock).map(InstantSource::Clock))
    }

    /// Resolve to venue-local wall-clock time.
    pub fn resolve(self, base_date: NaiveDate, tz: Tz) -> Option<NaiveDateTime> {
        match self {
            InstantSource::EpochMillis(ms) => {
                DateTime::from_timestamp_millis(ms).map(|utc| utc.with_timezone(&tz).naive_local())
            }
            InstantSource::Clock(time) => Some(base_date.and_time(time)),
        }
    }
}

/// Extract the first signed integer embedded in `text`.
///
/// `"/Date(1760977800000)/"` and `"/Date(1760977800000+0200)/"` both yield
/// `1760977800000`. A `-` directly before the first digit makes it negative.
pub fn parse_epoch_millis(text: &str) -> Option<i64> {
    let first_digit = text.find(|c: char| c.is_ascii_digit())?;
    let digits_end = text[first_digit..]
        .find(|c: char| !c.is_ascii_digit())
        .map_or(text.len(), |len| first_digit + len);

    let start = if text[..first_digit].ends_with('-') {
        first_digit - 1
    } else {
        first_digit
    };

    text[start..digits_end].parse().ok()
}

/// Parse `HH:MM` into a time of day. Seconds are always zero.
pub fn parse_clock(text: &str) -> Option<NaiveTime> {
    let (hour, minute) = text.split_once(':')?;
    let hour: u32 = hour.trim().parse().ok()?;
    let minute: u32 = minute.trim().parse().ok()?;
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Clamp `(start, end)` to the window, rejecting non-overlapping or empty results.
pub fn clamp_to_window(
    start: NaiveDateTime,
    end: NaiveDateTime,
    window: &TimeWindow,
) -> Result<OccupiedInterval, SkipReason> {
    if end <= window.start || start >= window.end {
        return Err(SkipReason::OutsideWindow);
    }

    let start = start.max(window.start);
    let end = end.min(window.end);
    if start >= end {
        return Err(SkipReason::Degenerate);
    }

    Ok(OccupiedInterval { start, end })
}

/// Normalize one record against the window.
pub fn normalize_record(
    record: &RawOccupation,
    window: &TimeWindow,
    base_date: NaiveDate,
    tz: Tz,
) -> Result<OccupiedInterval, SkipReason> {
    let resolve = |stamp: &Option<String>, clock: &Option<String>| {
        InstantSource::select(stamp.as_deref(), clock.as_deref())
            .and_then(|source| source.resolve(base_date, tz))
    };

    let start = resolve(&record.start_stamp, &record.start_clock).ok_or(SkipReason::Unresolved)?;
    let end = resolve(&record.end_stamp, &record.end_clock).ok_or(SkipReason::Unresolved)?;

    clamp_to_window(start, end, window)
}

/// Normalize all of a court's records, silently dropping the ones that
/// cannot be resolved or do not intersect the window.
///
/// Overlapping records are kept as-is; merging happens in [`super::gaps`].
pub fn normalize(
    records: &[RawOccupation],
    window: &TimeWindow,
    base_date: NaiveDate,
    tz: Tz,
) -> Vec<OccupiedInterval> {
    records
        .iter()
        .filter_map(|record| match normalize_record(record, window, base_date, tz) {
            Ok(interval) => Some(interval),
            Err(reason) => {
                debug!("Dropping occupancy record ({:?}): {:?}", reason, record);
                None
            }
        })
        .collect()
}
