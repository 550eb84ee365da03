//! Global machine-status detector, §4.4 "Global detectors (machine
//! status...)". Grounded on `MachineStatusTracker` in
//! `examples/original_source/app/api/v1/endpoints/energymonitoring.py`:
//! per-machine rate limiting plus whole-row significance comparison, minus
//! the Python version's generic dict walk (we compare the fixed field set
//! `TelemetrySnapshot` exposes).

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::TelemetrySnapshot;

use super::{numeric_significant, string_significant};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusEvent {
    pub machine_id: String,
    pub status: String,
    pub timestamp: NaiveDateTime,
    pub total_power_kw: Option<f64>,
}

/// Reduce a full telemetry snapshot to the status stream's narrower shape.
/// Shared by [`StatusDetector`] and the initial-snapshot builder the
/// machine-status SSE handler uses before any change has been detected.
pub fn snapshot_to_status_event(snapshot: &TelemetrySnapshot) -> StatusEvent {
    StatusEvent {
        machine_id: snapshot.machine_id.clone(),
        status: snapshot.job_status.clone().unwrap_or_else(|| "UNKNOWN".to_string()),
        timestamp: snapshot.timestamp,
        total_power_kw: snapshot.power_kw,
    }
}

pub struct StatusDetector {
    previous: HashMap<String, TelemetrySnapshot>,
    last_broadcast: HashMap<String, NaiveDateTime>,
    min_interval: chrono::Duration,
    numeric_threshold: f64,
}

impl StatusDetector {
    pub fn new(min_interval: std::time::Duration, numeric_threshold: f64) -> Self {
        Self {
            previous: HashMap::new(),
            last_broadcast: HashMap::new(),
            min_interval: chrono::Duration::from_std(min_interval).unwrap_or(chrono::Duration::seconds(1)),
            numeric_threshold,
        }
    }

    fn is_significant(&self, curr: &TelemetrySnapshot, prev: &TelemetrySnapshot) -> bool {
        if string_significant(curr.job_status.as_deref(), prev.job_status.as_deref()) {
            return true;
        }
        numeric_significant(curr.power_kw, prev.power_kw, self.numeric_threshold)
    }

    fn to_event(snapshot: &TelemetrySnapshot) -> StatusEvent {
        snapshot_to_status_event(snapshot)
    }

    /// Diff `current` against the previously seen live set, §4.4. Machines
    /// present before but absent now emit a synthetic OFFLINE event.
    pub fn detect(&mut self, current: &[TelemetrySnapshot], now: NaiveDateTime) -> Vec<StatusEvent> {
        let mut changed = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for snapshot in current {
            seen.insert(snapshot.machine_id.clone());
            match self.previous.get(&snapshot.machine_id) {
                None => {
                    changed.push(Self::to_event(snapshot));
                    self.last_broadcast.insert(snapshot.machine_id.clone(), now);
                }
                Some(prev) => {
                    let last = self.last_broadcast.get(&snapshot.machine_id).copied();
                    let rate_limited = last.map(|t| now - t < self.min_interval).unwrap_or(false);
                    if !rate_limited && self.is_significant(snapshot, prev) {
                        changed.push(Self::to_event(snapshot));
                        self.last_broadcast.insert(snapshot.machine_id.clone(), now);
                    }
                }
            }
        }

        for machine_id in self.previous.keys() {
            if !seen.contains(machine_id) {
                changed.push(StatusEvent {
                    machine_id: machine_id.clone(),
                    status: "OFFLINE".to_string(),
                    timestamp: now,
                    total_power_kw: None,
                });
            }
        }

        self.previous = current.iter().map(|s| (s.machine_id.clone(), s.clone())).collect();
        changed
    }
}
