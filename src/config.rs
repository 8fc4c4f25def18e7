use anyhow::{anyhow, bail, Context, Result};
use chrono_tz::Tz;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::booking::BookingConfig;
use crate::notify::PUSHOVER_API_URL;
use crate::policy::{ClockWindow, WindowPolicy, WEEKDAY_KEYS};
use crate::scheduler::PollSchedule;
use crate::slots::DEFAULT_MIN_DURATION_MINUTES;

#[derive(Debug, Clone)]
pub struct Config {
    // Booking site
    pub booking_base_url: String,
    pub booking_grid_id: u32,
    pub booking_session_id: String,
    pub booking_language: String,
    pub booking_token_marker: String,
    pub request_timeout_secs: u64,

    // Scan settings
    pub min_duration_minutes: i64,
    pub days_ahead: u32,
    pub timezone: Tz,
    pub windows: WindowPolicy,

    // Where the previous results live
    pub state_path: PathBuf,

    // Pushover notifications
    pub pushover_user_key: String,
    pub pushover_api_token: String,
    pub pushover_api_url: String,

    // Commit the state file after it changes
    pub git_publish: bool,
    pub git_push: bool,

    // Polling loop (ignored with --once)
    pub poll_interval_minutes: u32,
    pub active_start_hour: u32,
    pub active_end_hour: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env if present, ignore if missing
        Self::from_getter(|key| env::var(key).ok())
    }

    /// Parse config from a custom getter function (for testing)
    pub fn from_getter<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let timezone_name = get("TIMEZONE").unwrap_or_else(|| "Europe/Madrid".to_string());
        let timezone: Tz = timezone_name
            .trim()
            .parse()
            .map_err(|_| anyhow!("TIMEZONE '{}' is not a known IANA timezone", timezone_name))?;

        let mut windows = WindowPolicy::default();
        for (index, key) in WEEKDAY_KEYS.into_iter().enumerate() {
            if let Some(value) = get(key) {
                windows.set(index, parse_window(key, &value)?);
            }
        }

        Ok(Config {
            booking_base_url: get("BOOKING_BASE_URL")
                .unwrap_or_else(|| "https://www.padelcpi.com".to_string()),
            booking_grid_id: get("BOOKING_GRID_ID")
                .unwrap_or_else(|| "4".to_string())
                .parse()
                .context("BOOKING_GRID_ID must be a non-negative integer")?,
            booking_session_id: get("BOOKING_SESSION_ID").context("BOOKING_SESSION_ID not set")?,
            booking_language: get("BOOKING_LANGUAGE").unwrap_or_else(|| "ca-ES".to_string()),
            booking_token_marker: get("BOOKING_TOKEN_MARKER")
                .unwrap_or_else(|| "hl90njda2b89k".to_string()),
            request_timeout_secs: get("REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),

            min_duration_minutes: get("MIN_DURATION_MINUTES")
                .unwrap_or_else(|| DEFAULT_MIN_DURATION_MINUTES.to_string())
                .parse()
                .context("MIN_DURATION_MINUTES must be an integer")?,
            days_ahead: get("DAYS_AHEAD")
                .unwrap_or_else(|| "3".to_string())
                .parse()
                .context("DAYS_AHEAD must be a non-negative integer")?,
            timezone,
            windows,

            state_path: PathBuf::from(
                get("STATE_PATH").unwrap_or_else(|| "last_results.json".to_string()),
            ),

            pushover_user_key: get("PUSHOVER_USER_KEY").context("PUSHOVER_USER_KEY not set")?,
            pushover_api_token: get("PUSHOVER_API_TOKEN").context("PUSHOVER_API_TOKEN not set")?,
            pushover_api_url: get("PUSHOVER_API_URL").unwrap_or_else(|| PUSHOVER_API_URL.to_string()),

            git_publish: parse_flag(get("GIT_PUBLISH")),
            git_push: parse_flag(get("GIT_PUSH")),

            poll_interval_minutes: get("POLL_INTERVAL_MINUTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
            active_start_hour: get("ACTIVE_START_HOUR")
                .and_then(|s| s.parse().ok())
                .unwrap_or(7),
            active_end_hour: get("ACTIVE_END_HOUR")
                .and_then(|s| s.parse().ok())
                .unwrap_or(23),
        })
    }

    /// Create config from a HashMap (convenience for testing)
    pub fn from_map(map: &HashMap<&str, &str>) -> Result<Self> {
        Self::from_getter(|key| map.get(key).map(|v| v.to_string()))
    }

    /// Validate configuration values at startup.
    /// Returns Ok(()) if all validations pass, or Err with details of what failed.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if !self.booking_base_url.starts_with("https://") && !self.booking_base_url.starts_with("http://") {
            errors.push(format!(
                "BOOKING_BASE_URL '{}' must start with http:// or https://",
                self.booking_base_url
            ));
        }

        if !self.pushover_api_url.starts_with("https://") && !self.pushover_api_url.starts_with("http://") {
            errors.push(format!(
                "PUSHOVER_API_URL '{}' must start with http:// or https://",
                self.pushover_api_url
            ));
        }

        if self.booking_session_id.trim().is_empty() {
            errors.push("BOOKING_SESSION_ID cannot be empty.".to_string());
        }

        if self.booking_token_marker.trim().is_empty() {
            errors.push("BOOKING_TOKEN_MARKER cannot be empty.".to_string());
        }

        if self.request_timeout_secs == 0 {
            errors.push("REQUEST_TIMEOUT_SECS must be greater than 0.".to_string());
        }

        if self.min_duration_minutes <= 0 {
            errors.push("MIN_DURATION_MINUTES must be greater than 0.".to_string());
        }

        if self.days_ahead == 0 {
            errors.push("DAYS_AHEAD must be greater than 0.".to_string());
        } else if self.days_ahead > 14 {
            errors.push(format!(
                "DAYS_AHEAD={} seems too far ahead (max recommended: 14).",
                self.days_ahead
            ));
        }

        if (0..7).all(|day| self.windows.window_for(day).is_none()) {
            errors.push("No WINDOW_* is set; every day would be skipped.".to_string());
        }

        if self.pushover_user_key.trim().is_empty() || self.pushover_api_token.trim().is_empty() {
            errors.push("PUSHOVER_USER_KEY and PUSHOVER_API_TOKEN cannot be empty.".to_string());
        }

        if self.git_push && !self.git_publish {
            errors.push("GIT_PUSH requires GIT_PUBLISH.".to_string());
        }

        if let Err(e) = self.poll_schedule().validate() {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )
        }
    }

    pub fn booking(&self) -> BookingConfig {
        BookingConfig {
            base_url: self.booking_base_url.clone(),
            grid_id: self.booking_grid_id,
            session_id: self.booking_session_id.clone(),
            language: self.booking_language.clone(),
            token_marker: self.booking_token_marker.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }

    pub fn min_duration(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.min_duration_minutes)
    }

    pub fn poll_schedule(&self) -> PollSchedule {
        PollSchedule {
            start_hour: self.active_start_hour,
            end_hour: self.active_end_hour,
            interval_minutes: self.poll_interval_minutes,
        }
    }
}

/// Empty value disables the day; anything else must be `HH:MM-HH:MM`.
fn parse_window(key: &str, value: &str) -> Result<Option<ClockWindow>> {
    let value = value.trim();
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    ClockWindow::parse(value)
        .map(Some)
        .with_context(|| format!("{} must be HH:MM-HH:MM with start before end, got '{}'", key, value))
}

fn parse_flag(value: Option<String>) -> bool {
    matches!(
        value.as_deref().map(str::trim).map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "true" | "yes" | "on")
    )
}
