//! Availability scan orchestration
//!
//! Coordinates token retrieval, per-day fetches, slot computation,
//! notification, persistence and publishing. Days are processed one after
//! another; a failing day is logged and skipped.

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate, Utc};
use tracing::{debug, error, info, warn};

use crate::availability::{day_label, evaluate_day, DayOutcome, DayReport};
use crate::booking::BookingClient;
use crate::config::Config;
use crate::notify::{format_report, fresh_reports, Notifier};
use crate::policy::{ClockWindow, WindowPolicy};
use crate::publish::Publisher;
use crate::state::{self, Snapshot};

#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions {
    /// Print results only; no notification, state write or commit
    pub dry_run: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub days_scanned: usize,
    pub days_failed: usize,
    pub slots_found: usize,
    pub new_slots: usize,
    pub state_changed: bool,
}

/// New snapshot plus what is new in it compared to the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub snapshot: Snapshot,
    pub fresh: Snapshot,
    pub changed: bool,
}

/// Days to scan after `today`, with their windows. Days without a window are left out.
pub fn planned_days(today: NaiveDate, days_ahead: u32, policy: &WindowPolicy) -> Vec<(NaiveDate, ClockWindow)> {
    (1..=u64::from(days_ahead))
        .filter_map(|offset| today.checked_add_days(Days::new(offset)))
        .filter_map(|date| match policy.window_for_date(date) {
            Some(window) => Some((date, window)),
            None => {
                debug!("No window for {}, skipping", day_label(date));
                None
            }
        })
        .collect()
}

/// Build the new snapshot, keeping previous entries for days that failed to fetch.
pub fn reconcile(reports: &[DayReport], failed_labels: &[String], previous: &Snapshot) -> Reconciliation {
    let mut snapshot = Snapshot::from_reports(reports);
    for label in failed_labels {
        snapshot.carry_forward(label, previous);
    }

    let fresh = snapshot.newly_appeared(previous);
    let changed = snapshot != *previous;
    Reconciliation {
        snapshot,
        fresh,
        changed,
    }
}

/// Run a single availability scan
pub async fn run_check(
    config: &Config,
    client: &BookingClient,
    notifier: &Notifier,
    publisher: &Publisher,
    options: CheckOptions,
) -> Result<CheckSummary> {
    let now = Utc::now().with_timezone(&config.timezone).naive_local();
    let days = planned_days(now.date(), config.days_ahead, &config.windows);
    info!("Starting availability scan ({} days to check)", days.len());

    let mut summary = CheckSummary::default();
    if days.is_empty() {
        return Ok(summary);
    }

    let token = client
        .fetch_token()
        .await
        .context("Failed to obtain session token")?;

    let mut reports = Vec::new();
    let mut failed_labels = Vec::new();

    for (date, window) in days {
        let label = day_label(date);
        summary.days_scanned += 1;

        let schedule = match client.fetch_day(date, &token).await {
            Ok(schedule) => schedule,
            Err(e) => {
                warn!("Error processing {}: {}", label, e);
                summary.days_failed += 1;
                failed_labels.push(label);
                continue;
            }
        };

        let slots = match evaluate_day(&schedule, &window, config.min_duration(), config.timezone) {
            DayOutcome::Evaluated(slots) => slots,
            DayOutcome::MissingDate => {
                warn!("{}: response carries no usable date, no slots computed", label);
                Vec::new()
            }
        };

        if slots.is_empty() {
            debug!("{} ({}): no free slots", label, window);
        } else {
            info!("{} ({}): {} free slots", label, window, slots.len());
            for slot in &slots {
                info!("  {}", slot);
            }
        }

        summary.slots_found += slots.len();
        reports.push(DayReport { date, window, slots });
    }

    if options.dry_run {
        let report = format_report(&reports);
        if report.is_empty() {
            println!("No free slots");
        } else {
            println!("{}", report);
        }
        return Ok(summary);
    }

    let previous = match state::load(&config.state_path) {
        Ok(previous) => previous,
        Err(e) => {
            warn!("{:#}; treating previous results as empty", e);
            Snapshot::default()
        }
    };

    let reconciliation = reconcile(&reports, &failed_labels, &previous);
    summary.new_slots = reconciliation.fresh.slot_count();
    summary.state_changed = reconciliation.changed;

    if !reconciliation.fresh.is_empty() {
        let message = format_report(&fresh_reports(&reports, &reconciliation.fresh));
        send_notification(notifier, &message).await;
    }

    if !reconciliation.changed {
        info!("No changes since last run");
        return Ok(summary);
    }

    state::save(&config.state_path, &reconciliation.snapshot)?;
    info!("State updated ({} slots)", reconciliation.snapshot.slot_count());

    match publisher.publish(true, now).await {
        Ok(outcome) => debug!("Publish outcome: {:?}", outcome),
        Err(e) => error!("Failed to publish state: {:#}", e),
    }

    Ok(summary)
}

/// Send a notification; failures are logged and never abort the scan
async fn send_notification(notifier: &Notifier, message: &str) {
    if let Err(e) = notifier.send(message).await {
        error!("Failed to send notification: {:#}", e);
        // Log the original message so it's not lost
        error!("Original message: {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slots::FreeInterval;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, day).unwrap()
    }

    fn slot(court: &str, day: u32, start: u32, end: u32) -> FreeInterval {
        FreeInterval {
            resource_name: court.to_string(),
            start: date(day).and_hms_opt(start, 0, 0).unwrap(),
            end: date(day).and_hms_opt(end, 0, 0).unwrap(),
        }
    }

    fn report(day: u32, slots: Vec<FreeInterval>) -> DayReport {
        DayReport {
            date: date(day),
            window: ClockWindow::parse("18:00-22:00").unwrap(),
            slots,
        }
    }

    // === planned_days tests ===

    #[test]
    fn test_planned_days_from_monday() {
        // 2026-10-19 is a Monday
        let days = planned_days(date(19), 3, &WindowPolicy::default());
        let dates: Vec<NaiveDate> = days.iter().map(|(d, _)| *d).collect();
        assert_eq!(dates, vec![date(20), date(21), date(22)]);
    }

    #[test]
    fn test_planned_days_skip_weekend() {
        // From Thursday: Friday kept, Saturday and Sunday skipped
        let days = planned_days(date(22), 3, &WindowPolicy::default());
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].0, date(23));
        assert_eq!(days[0].1.to_string(), "15:30-18:00");
    }

    #[test]
    fn test_planned_days_excludes_today() {
        let days = planned_days(date(19), 1, &WindowPolicy::default());
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].0, date(20));
        assert!(planned_days(date(19), 0, &WindowPolicy::default()).is_empty());
    }

    // === reconcile tests ===

    #[test]
    fn test_reconcile_first_run_everything_is_new() {
        let reports = vec![report(20, vec![slot("Pista 1", 20, 20, 22)])];
        let result = reconcile(&reports, &[], &Snapshot::default());
        assert!(result.changed);
        assert_eq!(result.fresh.slot_count(), 1);
    }

    #[test]
    fn test_reconcile_unchanged() {
        let reports = vec![report(20, vec![slot("Pista 1", 20, 20, 22)])];
        let previous = Snapshot::from_reports(&reports);
        let result = reconcile(&reports, &[], &previous);
        assert!(!result.changed);
        assert!(result.fresh.is_empty());
    }

    #[test]
    fn test_reconcile_failed_day_keeps_previous_entry() {
        let previous = Snapshot::from_reports(&[
            report(20, vec![slot("Pista 1", 20, 20, 22)]),
            report(21, vec![slot("Pista 2", 21, 18, 20)]),
        ]);
        // Day 21 failed to fetch this time
        let reports = vec![report(20, vec![slot("Pista 1", 20, 20, 22)])];
        let result = reconcile(&reports, &[day_label(date(21))], &previous);
        assert!(!result.changed);
        assert!(result.fresh.is_empty());
    }

    #[test]
    fn test_reconcile_removed_slot_changes_without_news() {
        let previous = Snapshot::from_reports(&[report(20, vec![slot("Pista 1", 20, 20, 22)])]);
        let reports = vec![report(20, vec![])];
        let result = reconcile(&reports, &[], &previous);
        assert!(result.changed);
        assert!(result.fresh.is_empty());
    }
}
