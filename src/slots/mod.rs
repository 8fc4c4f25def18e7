//! Free-slot computation for a single court on a single day.
//!
//! Raw occupancy records are first normalized into clamped intervals
//! ([`normalize`]), then merged and complemented against the window
//! ([`gaps`]). Both stages are pure and hold no state between calls.

pub mod gaps;
pub mod normalize;

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

pub use gaps::{compute_gaps, merge_occupied};
pub use normalize::{normalize, normalize_record, parse_clock, parse_epoch_millis, SkipReason};

/// Occupied spans separated by at most this many seconds are treated as contiguous.
///
/// Upstream bookings are sometimes reported as ending at `:59` seconds while
/// the next one starts on the minute.
pub const MERGE_TOLERANCE_SECS: i64 = 1;

/// Default minimum length of a reportable free interval.
pub const DEFAULT_MIN_DURATION_MINUTES: i64 = 90;

pub fn merge_tolerance() -> Duration {
    Duration::seconds(MERGE_TOLERANCE_SECS)
}

/// The period of one calendar day within which availability is computed.
///
/// Invariant: `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeWindow {
    /// Returns `None` unless `start < end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// A booked period of one court, already clamped to a [`TimeWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct OccupiedInterval {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// A gap long enough to be booked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeInterval {
    #[serde(rename = "court")]
    pub resource_name: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl FreeInterval {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

impl fmt::Display for FreeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} - {}",
            self.resource_name,
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )
    }
}

/// One occupancy record as reported by the booking grid.
///
/// A record may carry an epoch-millisecond timestamp (`HoraInicio`/`HoraFin`,
/// usually wrapped as `/Date(…)/`), a wall-clock `HH:MM` string
/// (`StrHoraInicio`/`StrHoraFin`), or both.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawOccupation {
    #[serde(rename = "HoraInicio", default, deserialize_with = "lenient_text")]
    pub start_stamp: Option<String>,
    #[serde(rename = "HoraFin", default, deserialize_with = "lenient_text")]
    pub end_stamp: Option<String>,
    #[serde(rename = "StrHoraInicio", default, deserialize_with = "lenient_text")]
    pub start_clock: Option<String>,
    #[serde(rename = "StrHoraFin", default, deserialize_with = "lenient_text")]
    pub end_clock: Option<String>,
}

impl RawOccupation {
    pub fn from_stamps(start: &str, end: &str) -> Self {
        Self {
            start_stamp: Some(start.to_string()),
            end_stamp: Some(end.to_string()),
            ..Self::default()
        }
    }

    pub fn from_clock(start: &str, end: &str) -> Self {
        Self {
            start_clock: Some(start.to_string()),
            end_clock: Some(end.to_string()),
            ..Self::default()
        }
    }
}

/// Accept strings and numbers as text; anything else becomes `None`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) if !s.is_empty() => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 20)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_window_rejects_empty_and_inverted() {
        assert!(TimeWindow::new(at(18, 30), at(18, 30)).is_none());
        assert!(TimeWindow::new(at(21, 30), at(18, 30)).is_none());
        let window = TimeWindow::new(at(18, 30), at(21, 30)).unwrap();
        assert_eq!(window.duration(), Duration::minutes(180));
    }

    #[test]
    fn test_free_interval_display() {
        let slot = FreeInterval {
            resource_name: "Pista 3".to_string(),
            start: at(20, 0),
            end: at(21, 30),
        };
        assert_eq!(slot.to_string(), "Pista 3: 20:00 - 21:30");
        assert_eq!(slot.duration(), Duration::minutes(90));
    }

    #[test]
    fn test_raw_occupation_accepts_strings_and_numbers() {
        let json = r#"{
            "HoraInicio": "/Date(1760977800000)/",
            "HoraFin": 1760983200000,
            "StrHoraInicio": "18:30",
            "StrHoraFin": null
        }"#;
        let raw: RawOccupation = serde_json::from_str(json).unwrap();
        assert_eq!(raw.start_stamp.as_deref(), Some("/Date(1760977800000)/"));
        assert_eq!(raw.end_stamp.as_deref(), Some("1760983200000"));
        assert_eq!(raw.start_clock.as_deref(), Some("18:30"));
        assert_eq!(raw.end_clock, None);
    }

    #[test]
    fn test_raw_occupation_missing_and_odd_fields() {
        let raw: RawOccupation = serde_json::from_str(r#"{"HoraInicio": {"x": 1}, "StrHoraFin": ""}"#).unwrap();
        assert_eq!(raw, RawOccupation::default());
    }

    #[test]
    fn test_free_interval_serializes_court_key() {
        let slot = FreeInterval {
            resource_name: "Pista 1".to_string(),
            start: at(15, 30),
            end: at(18, 0),
        };
        let json = serde_json::to_value(&slot).unwrap();
        assert_eq!(json["court"], "Pista 1");
        assert_eq!(json["start"], "2026-10-20T15:30:00");
    }
}
