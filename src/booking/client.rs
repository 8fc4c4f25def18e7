use chrono::NaiveDate;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use super::{extract_token, site_date, BookingError, DaySchedule, GridResponse, Result};
use crate::redact;

/// Grid page that embeds the session token
const GRID_PATH: &str = "/Booking/Grid.aspx";

/// Page method returning one day of the grid
const GRID_DATA_PATH: &str = "/booking/srvc.aspx/ObtenerCuadro";

const USER_AGENT: &str = "Mozilla/5.0";

/// Everything the booking client needs to talk to the site.
#[derive(Debug, Clone)]
pub struct BookingConfig {
    /// Site origin, e.g. `https://www.padelcpi.com`
    pub base_url: String,
    /// `idCuadro` of the grid to query
    pub grid_id: u32,
    /// `ASP.NET_SessionId` cookie
    pub session_id: String,
    /// `i18next` cookie
    pub language: String,
    /// JavaScript variable holding the token in the grid page
    pub token_marker: String,
    pub request_timeout: Duration,
}

impl BookingConfig {
    pub fn grid_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), GRID_PATH)
    }

    pub fn data_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), GRID_DATA_PATH)
    }

    pub fn origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Cookie header accepted by the site (consent flags plus session).
    pub fn cookie_header(&self) -> String {
        format!(
            "cb-enabled=enabled; MPOpcionCookie=necesarios; ASP.NET_SessionId={}; i18next={}",
            urlencoding::encode(&self.session_id),
            urlencoding::encode(&self.language),
        )
    }
}

/// Request body for the grid page method
#[derive(Debug, Serialize, PartialEq)]
pub struct GridRequest<'a> {
    #[serde(rename = "idCuadro")]
    pub grid_id: u32,
    #[serde(rename = "fecha")]
    pub date: String,
    pub key: &'a str,
}

pub struct BookingClient {
    client: reqwest::Client,
    config: BookingConfig,
}

impl BookingClient {
    pub fn new(config: BookingConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client, config })
    }

    /// Load the grid page and pull the per-session token out of it.
    pub async fn fetch_token(&self) -> Result<String> {
        let url = self.config.grid_url();
        debug!("Fetching session token from {}", url);

        let response = self
            .client
            .get(&url)
            .header(
                reqwest::header::ACCEPT,
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::COOKIE, self.config.cookie_header())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BookingError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let html = response.text().await?;
        let token = extract_token(&html, &self.config.token_marker).ok_or_else(|| {
            BookingError::TokenNotFound {
                marker: self.config.token_marker.clone(),
            }
        })?;

        info!("Session token obtained ({})", redact::secret(&token));
        Ok(token)
    }

    /// Fetch one day of the booking grid.
    pub async fn fetch_day(&self, date: NaiveDate, token: &str) -> Result<DaySchedule> {
        let url = self.config.data_url();
        let body = GridRequest {
            grid_id: self.config.grid_id,
            date: site_date(date),
            key: token,
        };
        debug!("Fetching grid {} for {}", body.grid_id, body.date);

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::ACCEPT, "application/json, text/javascript, */*; q=0.01")
            .header(reqwest::header::ORIGIN, self.config.origin())
            .header(reqwest::header::REFERER, self.config.grid_url())
            .header(reqwest::header::COOKIE, self.config.cookie_header())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BookingError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let bytes = response.bytes().await?;
        let grid: GridResponse = serde_json::from_slice(&bytes)?;
        debug!("Grid for {} has {} courts", site_date(date), grid.day.courts.len());
        Ok(grid.day)
    }
}
