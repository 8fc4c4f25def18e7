//! Persistence of the last computed free slots
//!
//! The snapshot is a JSON object keyed by day label. Novelty is decided by
//! whole-value equality against the previous snapshot; the notification
//! only lists the slots that were not present before.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

use crate::availability::DayReport;
use crate::slots::FreeInterval;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot {
    days: BTreeMap<String, Vec<FreeInterval>>,
}

impl Snapshot {
    pub fn from_reports(reports: &[DayReport]) -> Self {
        let days = reports
            .iter()
            .map(|report| (report.label(), report.slots.clone()))
            .collect();
        Self { days }
    }

    pub fn is_empty(&self) -> bool {
        self.days.values().all(Vec::is_empty)
    }

    pub fn day(&self, label: &str) -> Option<&[FreeInterval]> {
        self.days.get(label).map(Vec::as_slice)
    }

    pub fn slot_count(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    /// Copy a day's entry from `previous`, if it has one.
    ///
    /// Used when a day could not be fetched, so that its slots are neither
    /// dropped from the store nor reported again once the fetch recovers.
    pub fn carry_forward(&mut self, label: &str, previous: &Snapshot) {
        if let Some(slots) = previous.days.get(label) {
            self.days.insert(label.to_string(), slots.clone());
        }
    }

    /// Slots in `self` that `previous` did not have for the same day.
    /// Days without new slots are omitted.
    pub fn newly_appeared(&self, previous: &Snapshot) -> Snapshot {
        let days = self
            .days
            .iter()
            .filter_map(|(label, slots)| {
                let before = previous.days.get(label);
                let fresh: Vec<FreeInterval> = slots
                    .iter()
                    .filter(|slot| before.map_or(true, |b| !b.contains(slot)))
                    .cloned()
                    .collect();
                (!fresh.is_empty()).then(|| (label.clone(), fresh))
            })
            .collect();
        Snapshot { days }
    }
}

/// Load the snapshot at `path`. A missing file is an empty snapshot.
pub fn load(path: &Path) -> Result<Snapshot> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("No previous state at {}", path.display());
            return Ok(Snapshot::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to read state file {}", path.display()))
        }
    };

    if data.trim().is_empty() {
        return Ok(Snapshot::default());
    }

    serde_json::from_str(&data).with_context(|| format!("Malformed state file {}", path.display()))
}

/// Write the snapshot to `path`, replacing any previous content.
pub fn save(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot).context("Failed to serialize state")?;

    // Write next to the target and rename so a crash never leaves half a file.
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json + "\n").with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("Failed to replace {}", path.display()))?;

    debug!("Saved {} slots to {}", snapshot.slot_count(), path.display());
    Ok(())
}
