/// Polling scheduler
/// Runs checks every `interval_minutes` between the active start and end hour,
/// in the venue's timezone, 7 days a week

use chrono::Timelike;
use chrono_tz::Tz;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

const SECS_PER_DAY: u64 = 24 * 3600;

/// A check that starts within this many seconds of its slot runs immediately
pub const GRACE_SECS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSchedule {
    pub start_hour: u32,
    pub end_hour: u32,
    pub interval_minutes: u32,
}

impl PollSchedule {
    pub fn validate(&self) -> Result<(), String> {
        if self.interval_minutes == 0 {
            return Err("POLL_INTERVAL_MINUTES must be greater than 0.".to_string());
        }
        if self.start_hour >= self.end_hour || self.end_hour > 24 {
            return Err(format!(
                "ACTIVE_START_HOUR={} / ACTIVE_END_HOUR={} must satisfy start < end <= 24.",
                self.start_hour, self.end_hour
            ));
        }
        let active_minutes = (self.end_hour - self.start_hour) * 60;
        if self.interval_minutes > active_minutes {
            return Err(format!(
                "POLL_INTERVAL_MINUTES={} is longer than the active hours ({} minutes).",
                self.interval_minutes, active_minutes
            ));
        }
        Ok(())
    }

    /// Testable version: is the given time inside the active hours
    pub fn is_active_at(&self, hour: u32, _minute: u32, _second: u32) -> bool {
        hour >= self.start_hour && hour < self.end_hour
    }

    /// Testable version: calculate wait time from given hour/minute/second.
    /// Returns None if a check should run now.
    pub fn time_until_next_poll_at(&self, hour: u32, minute: u32, second: u32) -> Option<Duration> {
        let now = u64::from(hour) * 3600 + u64::from(minute) * 60 + u64::from(second);
        let start = u64::from(self.start_hour) * 3600;
        let end = u64::from(self.end_hour) * 3600;
        let step = u64::from(self.interval_minutes.max(1)) * 60;

        // Before the active hours today
        if now < start {
            return Some(Duration::from_secs(start - now));
        }

        if now < end {
            let offset = (now - start) % step;
            if offset < u64::from(GRACE_SECS) {
                return None;
            }
            let next = now + (step - offset);
            if next < end {
                return Some(Duration::from_secs(next - now));
            }
        }

        // After the last slot - wait until the start hour tomorrow
        Some(Duration::from_secs((SECS_PER_DAY + start).saturating_sub(now).max(1)))
    }
}

/// Is the current time in the given timezone inside the active hours
pub fn is_active(schedule: &PollSchedule, tz: Tz) -> bool {
    let now = chrono::Utc::now().with_timezone(&tz);
    schedule.is_active_at(now.hour(), now.minute(), now.second())
}

/// Calculate duration until next check should run, in the given timezone
pub fn time_until_next_poll(schedule: &PollSchedule, tz: Tz) -> Option<Duration> {
    let now = chrono::Utc::now().with_timezone(&tz);
    schedule.time_until_next_poll_at(now.hour(), now.minute(), now.second())
}

/// Format duration for logging
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;

    if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else {
        format!("{}m", mins)
    }
}

/// Run the scheduler loop until `cancel` fires
pub async fn run_scheduler<F, Fut>(schedule: PollSchedule, tz: Tz, cancel: CancellationToken, mut check_fn: F)
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    info!(
        "Scheduler started ({}, every {}m between {:02}:00 and {:02}:00)",
        tz, schedule.interval_minutes, schedule.start_hour, schedule.end_hour
    );

    loop {
        match time_until_next_poll(&schedule, tz) {
            Some(wait_duration) => {
                info!("Next check in {}", format_duration(wait_duration));
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = sleep(wait_duration) => {}
                }
            }
            None => {
                debug!("Running check immediately");
            }
        }

        if cancel.is_cancelled() {
            break;
        }

        // Only run during active hours (handles clock drift around the end hour)
        if !is_active(&schedule, tz) {
            debug!("Outside active hours, skipping");
            continue;
        }

        check_fn().await;

        // Step past the grace window so the same slot does not run twice
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = sleep(Duration::from_secs(GRACE_SECS as u64 + 1)) => {}
        }
    }

    info!("Scheduler stopped");
}
