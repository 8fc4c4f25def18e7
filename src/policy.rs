//! Which clock window to scan on each weekday.
//!
//! Default: Monday to Thursday 18:30-21:30, Friday 15:30-18:00, weekends skipped.

use chrono::{Datelike, NaiveDate, NaiveTime};
use std::fmt;

use crate::slots::{parse_clock, TimeWindow};

/// Environment keys for each weekday, Monday first
pub const WEEKDAY_KEYS: [&str; 7] = [
    "WINDOW_MON",
    "WINDOW_TUE",
    "WINDOW_WED",
    "WINDOW_THU",
    "WINDOW_FRI",
    "WINDOW_SAT",
    "WINDOW_SUN",
];

/// A daily `start-end` clock range. Invariant: `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl ClockWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    /// Parse `"HH:MM-HH:MM"`.
    pub fn parse(text: &str) -> Option<Self> {
        let (start, end) = text.split_once('-')?;
        Self::new(parse_clock(start)?, parse_clock(end)?)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    /// Anchor the window to a calendar day.
    pub fn on(&self, date: NaiveDate) -> TimeWindow {
        TimeWindow {
            start: date.and_time(self.start),
            end: date.and_time(self.end),
        }
    }

    fn hm(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
    }
}

impl fmt::Display for ClockWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

/// Per-weekday scan windows (index 0 = Monday).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowPolicy {
    windows: [Option<ClockWindow>; 7],
}

impl Default for WindowPolicy {
    fn default() -> Self {
        let weekday = ClockWindow {
            start: ClockWindow::hm(18, 30),
            end: ClockWindow::hm(21, 30),
        };
        let friday = ClockWindow {
            start: ClockWindow::hm(15, 30),
            end: ClockWindow::hm(18, 0),
        };
        Self {
            windows: [Some(weekday), Some(weekday), Some(weekday), Some(weekday), Some(friday), None, None],
        }
    }
}

impl WindowPolicy {
    /// Window for a weekday index (0 = Monday .. 6 = Sunday). `None` means skip the day.
    pub fn window_for(&self, weekday_index: usize) -> Option<ClockWindow> {
        self.windows.get(weekday_index).copied().flatten()
    }

    pub fn window_for_date(&self, date: NaiveDate) -> Option<ClockWindow> {
        self.window_for(date.weekday().num_days_from_monday() as usize)
    }

    pub fn set(&mut self, weekday_index: usize, window: Option<ClockWindow>) {
        if let Some(slot) = self.windows.get_mut(weekday_index) {
            *slot = window;
        }
    }
}
