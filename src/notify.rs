use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

use crate::availability::DayReport;
use crate::config::Config;
use crate::state::Snapshot;

/// Default Pushover API endpoint
pub const PUSHOVER_API_URL: &str = "https://api.pushover.net/1/messages.json";

/// Maximum Pushover message length
pub const MAX_MESSAGE_LENGTH: usize = 1024;

pub const MESSAGE_TITLE: &str = "Pistas libres";

#[derive(Debug, Deserialize, PartialEq)]
pub struct PushoverResponse {
    pub status: i64,
    #[serde(default)]
    pub errors: Vec<String>,
}

impl PushoverResponse {
    pub fn is_success(&self) -> bool {
        self.status == 1
    }
}

/// Build the Pushover form parameters (credentials stay out of the URL)
pub fn build_message_params(
    api_token: &str,
    user_key: &str,
    title: &str,
    message: &str,
) -> [(&'static str, String); 4] {
    [
        ("token", api_token.to_string()),
        ("user", user_key.to_string()),
        ("title", title.to_string()),
        ("message", message.to_string()),
    ]
}

/// Truncate a message to the Pushover limit.
/// Cuts at the last full line that fits and appends "..."
pub fn truncate_message(message: &str) -> String {
    if message.len() <= MAX_MESSAGE_LENGTH {
        return message.to_string();
    }

    // Leave room for "\n..." (4 bytes)
    let mut cut = MAX_MESSAGE_LENGTH - 4;
    while cut > 0 && !message.is_char_boundary(cut) {
        cut -= 1;
    }
    let head = &message[..cut];
    let head = head.rfind('\n').map(|pos| &head[..pos]).unwrap_or(head);

    format!("{}\n...", head)
}

/// Render reports as the notification body.
///
/// ```text
/// Martes 20/10/2026 (18:30-21:30)
///   - Pista 1: 20:00 - 21:30
/// ```
pub fn format_report(reports: &[DayReport]) -> String {
    let mut blocks = Vec::new();
    for report in reports.iter().filter(|r| !r.slots.is_empty()) {
        let mut block = format!("{} ({})", report.label(), report.window);
        for slot in &report.slots {
            block.push_str(&format!("\n  - {}", slot));
        }
        blocks.push(block);
    }
    blocks.join("\n\n")
}

/// Keep only the slots listed in `fresh`, preserving report order.
pub fn fresh_reports(reports: &[DayReport], fresh: &Snapshot) -> Vec<DayReport> {
    reports
        .iter()
        .filter_map(|report| {
            let new_slots = fresh.day(&report.label())?;
            let slots: Vec<_> = report
                .slots
                .iter()
                .filter(|slot| new_slots.contains(slot))
                .cloned()
                .collect();
            (!slots.is_empty()).then(|| DayReport {
                slots,
                ..report.clone()
            })
        })
        .collect()
}

pub struct Notifier {
    client: reqwest::Client,
    endpoint: String,
    api_token: String,
    user_key: String,
}

impl Notifier {
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.pushover_api_url.clone(),
            api_token: config.pushover_api_token.clone(),
            user_key: config.pushover_user_key.clone(),
        }
    }

    /// Deliver one message. A single attempt; the caller decides what a failure means.
    pub async fn send(&self, message: &str) -> Result<()> {
        let message = if message.len() > MAX_MESSAGE_LENGTH {
            let truncated = truncate_message(message);
            debug!("Message truncated from {} to {} bytes", message.len(), truncated.len());
            truncated
        } else {
            message.to_string()
        };

        info!("Sending notification ({} bytes)", message.len());

        let params = build_message_params(&self.api_token, &self.user_key, MESSAGE_TITLE, &message);
        let response = self
            .client
            .post(&self.endpoint)
            .form(&params)
            .send()
            .await
            .context("Failed to send Pushover request")?;

        let result: PushoverResponse = response
            .json()
            .await
            .context("Failed to parse Pushover response")?;

        if result.is_success() {
            info!("Notification delivered");
            Ok(())
        } else {
            let reason = if result.errors.is_empty() {
                "Unknown error".to_string()
            } else {
                result.errors.join("; ")
            };
            anyhow::bail!("Pushover API error: {}", reason)
        }
    }
}
