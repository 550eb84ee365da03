//! Global machine-parameter detector, §4.4 "Global detectors (...machine
//! parameters...)". Grounded on `MachineParameterTracker` in
//! `examples/original_source/app/api/v1/endpoints/energymonitoring.py`: no
//! rate limiting (only the status and shiftwise streams are rate-limited in
//! the original), full-field comparison, synthetic OFFLINE on removal.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDateTime;

use crate::domain::TelemetrySnapshot;

use super::{numeric_significant, string_significant};

pub struct ParameterDetector {
    previous: HashMap<String, TelemetrySnapshot>,
    numeric_threshold: f64,
}

impl ParameterDetector {
    pub fn new(numeric_threshold: f64) -> Self {
        Self { previous: HashMap::new(), numeric_threshold }
    }

    fn is_significant(&self, curr: &TelemetrySnapshot, prev: &TelemetrySnapshot) -> bool {
        for (curr_val, prev_val) in curr.numeric_fields().into_iter().zip(prev.numeric_fields()) {
            if numeric_significant(curr_val.1, prev_val.1, self.numeric_threshold) {
                return true;
            }
        }
        for (curr_val, prev_val) in curr.string_fields().into_iter().zip(prev.string_fields()) {
            if string_significant(curr_val.1, prev_val.1) {
                return true;
            }
        }
        false
    }

    /// Diff `current` against the previous live set, §4.4. Returns every
    /// machine whose parameters changed plus a synthetic OFFLINE row for
    /// each machine that disappeared from the live set.
    pub fn detect(&mut self, current: &[TelemetrySnapshot], now: NaiveDateTime) -> Vec<TelemetrySnapshot> {
        let mut changed = Vec::new();
        let mut seen = HashSet::new();

        for snapshot in current {
            seen.insert(snapshot.machine_id.clone());
            match self.previous.get(&snapshot.machine_id) {
                None => changed.push(snapshot.clone()),
                Some(prev) if self.is_significant(snapshot, prev) => changed.push(snapshot.clone()),
                Some(_) => {}
            }
        }

        for machine_id in self.previous.keys() {
            if !seen.contains(machine_id) {
                changed.push(TelemetrySnapshot {
                    machine_id: machine_id.clone(),
                    timestamp: now,
                    voltage: None,
                    current: None,
                    power_kw: None,
                    op_mode: None,
                    prog_status: Some("OFFLINE".to_string()),
                    part_count: None,
                    job_status: Some("OFFLINE".to_string()),
                    extra: Default::default(),
                });
            }
        }

        self.previous = current.iter().map(|s| (s.machine_id.clone(), s.clone())).collect();
        changed
    }
}
