//! Adversarial Property-Based Tests for Occupancy Record Handling
//!
//! # Attack Plan
//!
//! 1. **Timestamp Wrappers**: `/Date(..)/` with offsets, negative values,
//!    overflowing digit runs, no digits at all.
//!
//! 2. **Clock Strings**: Out-of-range hours and minutes, missing colon,
//!    unicode digits, extra components.
//!
//! 3. **Shape Attacks**: Fields of the wrong JSON type, nulls, missing keys.
//!
//! # Invariants
//!
//! - Parsers never panic
//! - Normalized intervals always lie inside the window with start < end
//! - Computed slots never overlap a normalized occupied interval

use chrono::{Duration, NaiveDate};
use chrono_tz::Europe::Madrid;
use proptest::prelude::*;

use courtwatch::policy::ClockWindow;
use courtwatch::slots::{compute_gaps, normalize, parse_clock, parse_epoch_millis, RawOccupation};

fn tuesday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
}

// ============================================================================
// ADVERSARIAL GENERATORS
// ============================================================================

fn hostile_stamp() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("/Date(1760977800000)/".to_string()),
        Just("/Date(1760977800000+0200)/".to_string()),
        Just("/Date(-1)/".to_string()),
        Just("/Date(99999999999999999999999)/".to_string()),
        Just("/Date()/".to_string()),
        Just("".to_string()),
        Just("١٧٦٠٩٧٧٨٠٠٠٠٠".to_string()),
        "/Date\\(-?[0-9]{0,16}\\)/",
        ".{0,32}",
    ]
}

fn hostile_clock() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("18:30".to_string()),
        Just("25:99".to_string()),
        Just("24:00".to_string()),
        Just("-1:30".to_string()),
        Just("1830".to_string()),
        Just("18:30:15".to_string()),
        Just("１８:３０".to_string()),
        Just(":".to_string()),
        "[0-9]{0,3}:[0-9]{0,3}",
    ]
}

fn hostile_record() -> impl Strategy<Value = RawOccupation> {
    (
        proptest::option::of(hostile_stamp()),
        proptest::option::of(hostile_stamp()),
        proptest::option::of(hostile_clock()),
        proptest::option::of(hostile_clock()),
    )
        .prop_map(|(start_stamp, end_stamp, start_clock, end_clock)| RawOccupation {
            start_stamp,
            end_stamp,
            start_clock,
            end_clock,
        })
}

// ============================================================================
// INVARIANT: PARSERS NEVER PANIC
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(1000))]

    #[test]
    fn prop_parse_epoch_millis_never_panics(text in hostile_stamp()) {
        let _ = parse_epoch_millis(&text);
    }

    #[test]
    fn prop_parse_clock_never_panics(text in hostile_clock()) {
        if let Some(time) = parse_clock(&text) {
            prop_assert_eq!(chrono::Timelike::second(&time), 0);
        }
    }

    #[test]
    fn prop_normalized_intervals_inside_window(records in proptest::collection::vec(hostile_record(), 0..12)) {
        let window = ClockWindow::parse("18:30-21:30").unwrap().on(tuesday());
        for interval in normalize(&records, &window, tuesday(), Madrid) {
            prop_assert!(interval.start < interval.end);
            prop_assert!(interval.start >= window.start);
            prop_assert!(interval.end <= window.end);
        }
    }

    #[test]
    fn prop_slots_avoid_occupied(records in proptest::collection::vec(hostile_record(), 0..12)) {
        let window = ClockWindow::parse("15:30-21:30").unwrap().on(tuesday());
        let occupied = normalize(&records, &window, tuesday(), Madrid);
        let slots = compute_gaps("Pista 1", &occupied, &window, Duration::minutes(30));
        for slot in &slots {
            prop_assert!(slot.duration() >= Duration::minutes(30));
            for busy in &occupied {
                prop_assert!(slot.end <= busy.start || slot.start >= busy.end);
            }
        }
    }
}

// ============================================================================
// SHAPE ATTACKS: JSON FIELD TYPES
// ============================================================================

#[test]
fn test_wrong_field_types_are_treated_as_missing() {
    let json = r#"{"HoraInicio": true, "HoraFin": [1, 2], "StrHoraInicio": {"h": 18}, "StrHoraFin": null}"#;
    let record: RawOccupation = serde_json::from_str(json).unwrap();
    assert_eq!(record, RawOccupation::default());
}

#[test]
fn test_numeric_stamps_are_accepted() {
    let json = r#"{"HoraInicio": 1760977800000, "HoraFin": 1760981400000}"#;
    let record: RawOccupation = serde_json::from_str(json).unwrap();
    assert_eq!(record.start_stamp.as_deref(), Some("1760977800000"));
    assert_eq!(record.end_stamp.as_deref(), Some("1760981400000"));
}

#[test]
fn test_unknown_fields_ignored() {
    let json = r#"{"StrHoraInicio": "18:30", "StrHoraFin": "20:00", "Estado": "Reservada", "Id": 991}"#;
    let record: RawOccupation = serde_json::from_str(json).unwrap();
    assert_eq!(record, RawOccupation::from_clock("18:30", "20:00"));
}

#[test]
fn test_overflowing_stamp_falls_back_to_clock() {
    let record = RawOccupation {
        start_stamp: Some("/Date(99999999999999999999999)/".to_string()),
        end_stamp: None,
        start_clock: Some("19:00".to_string()),
        end_clock: Some("20:00".to_string()),
    };
    let window = ClockWindow::parse("18:30-21:30").unwrap().on(tuesday());
    let occupied = normalize(&[record], &window, tuesday(), Madrid);
    assert_eq!(occupied.len(), 1);
    assert_eq!(occupied[0].start, tuesday().and_hms_opt(19, 0, 0).unwrap());
}
