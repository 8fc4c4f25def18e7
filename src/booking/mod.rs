//! Booking-site collaborators: session token scraping and daily grid fetch.
//!
//! The grid endpoint answers with an ASP.NET page-method envelope:
//! `{"d": {"StrFecha": "dd/mm/YYYY", "Columnas": [{"TextoPrincipal": .., "Ocupaciones": [..]}]}}`.

pub mod client;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::slots::RawOccupation;

pub use client::{BookingClient, BookingConfig};

/// Date format used by the booking site in requests and responses
pub const SITE_DATE_FORMAT: &str = "%d/%m/%Y";

/// Name used for courts that come without a label
pub const UNNAMED_COURT: &str = "sin nombre";

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("session token '{marker}' not found in grid page")]
    TokenNotFound { marker: String },
}

pub type Result<T> = std::result::Result<T, BookingError>;

/// Top-level envelope of the grid response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GridResponse {
    #[serde(rename = "d", default, deserialize_with = "null_as_default")]
    pub day: DaySchedule,
}

/// One day of the booking grid.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DaySchedule {
    /// Base date as `dd/mm/YYYY`
    #[serde(rename = "StrFecha", default)]
    pub date: Option<String>,
    #[serde(rename = "Columnas", default, deserialize_with = "null_as_default")]
    pub courts: Vec<Court>,
}

impl DaySchedule {
    /// The day's base date, if present and well formed.
    pub fn base_date(&self) -> Option<NaiveDate> {
        let text = self.date.as_deref()?.trim();
        NaiveDate::parse_from_str(text, SITE_DATE_FORMAT).ok()
    }
}

/// A bookable court and its occupancy for the day.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Court {
    #[serde(rename = "TextoPrincipal", default)]
    pub name: Option<String>,
    #[serde(rename = "Ocupaciones", default, deserialize_with = "null_as_default")]
    pub occupations: Vec<RawOccupation>,
}

impl Court {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNNAMED_COURT)
    }
}

/// Format a date the way the booking site expects it.
pub fn site_date(date: NaiveDate) -> String {
    date.format(SITE_DATE_FORMAT).to_string()
}

/// Find `<marker> = '<token>'` in the grid page HTML.
pub fn extract_token(html: &str, marker: &str) -> Option<String> {
    if marker.is_empty() {
        return None;
    }

    let mut rest = html;
    while let Some(pos) = rest.find(marker) {
        rest = &rest[pos + marker.len()..];

        let after_eq = match rest.trim_start().strip_prefix('=') {
            Some(after) => after.trim_start(),
            None => continue,
        };
        let Some(quoted) = after_eq.strip_prefix('\'') else {
            continue;
        };
        if let Some(end) = quoted.find('\'') {
            let token = &quoted[..end];
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }
    None
}

fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
