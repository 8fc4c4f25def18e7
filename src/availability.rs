//! Evaluate one day of the booking grid into free slots per court.

use chrono::{Datelike, Duration, NaiveDate};
use chrono_tz::Tz;
use tracing::debug;

use crate::booking::DaySchedule;
use crate::policy::ClockWindow;
use crate::slots::{compute_gaps, normalize, FreeInterval};

const WEEKDAY_NAMES: [&str; 7] = [
    "Lunes",
    "Martes",
    "Miércoles",
    "Jueves",
    "Viernes",
    "Sábado",
    "Domingo",
];

/// Result of evaluating a single day.
#[derive(Debug, Clone, PartialEq)]
pub enum DayOutcome {
    Evaluated(Vec<FreeInterval>),
    /// The response had no usable base date; nothing could be computed.
    MissingDate,
}

impl DayOutcome {
    pub fn into_slots(self) -> Vec<FreeInterval> {
        match self {
            DayOutcome::Evaluated(slots) => slots,
            DayOutcome::MissingDate => Vec::new(),
        }
    }
}

/// Free slots found on one scanned day.
#[derive(Debug, Clone, PartialEq)]
pub struct DayReport {
    pub date: NaiveDate,
    pub window: ClockWindow,
    pub slots: Vec<FreeInterval>,
}

impl DayReport {
    pub fn label(&self) -> String {
        day_label(self.date)
    }
}

/// `"Martes 20/10/2026"`
pub fn day_label(date: NaiveDate) -> String {
    let weekday = WEEKDAY_NAMES[date.weekday().num_days_from_monday() as usize];
    format!("{} {}", weekday, date.format("%d/%m/%Y"))
}

/// Free slots of every court in `schedule` within `window`.
///
/// The window is anchored to the schedule's own base date, and clock-string
/// occupancy times are read on that date. Courts are reported in response order.
pub fn evaluate_day(schedule: &DaySchedule, window: &ClockWindow, min_duration: Duration, tz: Tz) -> DayOutcome {
    let Some(base_date) = schedule.base_date() else {
        return DayOutcome::MissingDate;
    };
    let time_window = window.on(base_date);

    let mut slots = Vec::new();
    for court in &schedule.courts {
        let occupied = normalize(&court.occupations, &time_window, base_date, tz);
        let gaps = compute_gaps(court.display_name(), &occupied, &time_window, min_duration);
        debug!(
            "{}: {} of {} records in window, {} free slots",
            court.display_name(),
            occupied.len(),
            court.occupations.len(),
            gaps.len()
        );
        slots.extend(gaps);
    }

    DayOutcome::Evaluated(slots)
}
