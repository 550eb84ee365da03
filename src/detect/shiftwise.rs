//! Shiftwise-energy detector, §4.4 "Global detectors (...shiftwise
//! energy)". Grounded on `ShiftwiseEnergyTracker` in
//! `examples/original_source/app/api/v1/endpoints/energymonitoring.py`: a
//! single global rate limit (not per-machine) and the larger energy
//! threshold (default 1e-2) called out in §4.4.

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::domain::ShiftwiseEnergy;

use super::numeric_significant;

pub struct ShiftwiseDetector {
    previous: HashMap<String, ShiftwiseEnergy>,
    last_broadcast: Option<NaiveDateTime>,
    min_interval: chrono::Duration,
    energy_threshold: f64,
}

impl ShiftwiseDetector {
    pub fn new(min_interval: std::time::Duration, energy_threshold: f64) -> Self {
        Self {
            previous: HashMap::new(),
            last_broadcast: None,
            min_interval: chrono::Duration::from_std(min_interval).unwrap_or(chrono::Duration::seconds(5)),
            energy_threshold,
        }
    }

    fn is_significant(&self, curr: &ShiftwiseEnergy, prev: &ShiftwiseEnergy) -> bool {
        numeric_significant(Some(curr.shift1), Some(prev.shift1), self.energy_threshold)
            || numeric_significant(Some(curr.shift2), Some(prev.shift2), self.energy_threshold)
            || numeric_significant(Some(curr.shift3), Some(prev.shift3), self.energy_threshold)
            || numeric_significant(Some(curr.total), Some(prev.total), self.energy_threshold)
    }

    /// Diff `current` against the previous set, gated by one global rate
    /// limit (§4.4: "shiftwise ≥ 5 s globally"). Returns `None` when the
    /// rate limit blocks a broadcast this tick, matching the original's
    /// "only update/broadcast if there were significant changes" behavior.
    pub fn detect(&mut self, current: &[ShiftwiseEnergy], now: NaiveDateTime) -> Option<Vec<ShiftwiseEnergy>> {
        if let Some(last) = self.last_broadcast {
            if now - last < self.min_interval {
                return None;
            }
        }

        let mut changed = Vec::new();
        for energy in current {
            match self.previous.get(&energy.machine_id) {
                None => changed.push(energy.clone()),
                Some(prev) if self.is_significant(energy, prev) => changed.push(energy.clone()),
                Some(_) => {}
            }
        }

        if changed.is_empty() {
            return None;
        }

        self.previous = current.iter().map(|e| (e.machine_id.clone(), e.clone())).collect();
        self.last_broadcast = Some(now);
        Some(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(h, m, s).unwrap()
    }

    fn energy(machine_id: &str, total: f64, ts: NaiveDateTime) -> ShiftwiseEnergy {
        ShiftwiseEnergy { machine_id: machine_id.to_string(), timestamp: ts, shift1: 1.0, shift2: 1.0, shift3: 1.0, total }
    }

    #[test]
    fn first_sighting_broadcasts_immediately() {
        let mut detector = ShiftwiseDetector::new(std::time::Duration::from_secs(5), 1e-2);
        let events = detector.detect(&[energy("m1", 3.0, dt(9, 0, 0))], dt(9, 0, 0));
        assert_eq!(events.unwrap().len(), 1);
    }

    #[test]
    fn rapid_successive_changes_are_rate_limited() {
        let mut detector = ShiftwiseDetector::new(std::time::Duration::from_secs(5), 1e-2);
        detector.detect(&[energy("m1", 3.0, dt(9, 0, 0))], dt(9, 0, 0));
        let events = detector.detect(&[energy("m1", 10.0, dt(9, 0, 2))], dt(9, 0, 2));
        assert!(events.is_none());
    }

    #[test]
    fn change_after_interval_elapses_broadcasts() {
        let mut detector = ShiftwiseDetector::new(std::time::Duration::from_secs(5), 1e-2);
        detector.detect(&[energy("m1", 3.0, dt(9, 0, 0))], dt(9, 0, 0));
        let events = detector.detect(&[energy("m1", 10.0, dt(9, 0, 6))], dt(9, 0, 6));
        assert_eq!(events.unwrap().len(), 1);
    }
}
