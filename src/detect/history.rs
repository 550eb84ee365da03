//! Per-machine parameter history detector, §4.4 "Per-machine parameter
//! history (rolling window)". Grounded on `HistoricalDataTracker` in
//! `examples/original_source/app/api/v1/endpoints/energymonitoring.py`:
//! tracks only `last_timestamp`; when the latest history row is newer, the
//! *whole* window is re-emitted (§4.4: "downstream subscribers receive the
//! whole window so that newly joined clients need no back-fill logic").
//!
//! The repository, not this type, runs the window query; this type only
//! decides whether the tick produced anything new, so it stays a pure
//! function of its inputs like the other detectors.

use chrono::NaiveDateTime;

use crate::domain::TelemetrySnapshot;

pub struct HistoryWindowDetector {
    last_timestamp: Option<NaiveDateTime>,
    initial_sent: bool,
}

impl HistoryWindowDetector {
    pub fn new() -> Self {
        Self { last_timestamp: None, initial_sent: false }
    }

    /// `latest_timestamp` is the newest history row's timestamp for this
    /// machine (`None` if it has no history yet); `window` is the already
    /// fetched rolling-window query result for that timestamp.
    pub fn detect(
        &mut self,
        latest_timestamp: Option<NaiveDateTime>,
        window: Vec<TelemetrySnapshot>,
    ) -> Option<Vec<TelemetrySnapshot>> {
        match latest_timestamp {
            None => {
                if self.initial_sent {
                    None
                } else {
                    self.initial_sent = true;
                    Some(window)
                }
            }
            Some(latest) => {
                if let Some(last) = self.last_timestamp {
                    if latest <= last {
                        return None;
                    }
                }
                self.last_timestamp = Some(latest);
                self.initial_sent = true;
                Some(window)
            }
        }
    }
}

impl Default for HistoryWindowDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn first_tick_with_no_history_sends_once() {
        let mut detector = HistoryWindowDetector::new();
        assert!(detector.detect(None, vec![]).is_some());
        assert!(detector.detect(None, vec![]).is_none());
    }

    #[test]
    fn new_latest_timestamp_emits_full_window() {
        let mut detector = HistoryWindowDetector::new();
        assert!(detector.detect(Some(dt(9, 0)), vec![]).is_some());
        assert!(detector.detect(Some(dt(9, 0)), vec![]).is_none());
        assert!(detector.detect(Some(dt(9, 1)), vec![]).is_some());
    }
}
