// ==========================================
// MES Core - Change Detectors, spec.md §4.4
// ==========================================
// Per-stream stateful filters that compare a current snapshot to the
// previous one and emit only significant changes. Each detector owns its
// `previous_state`/`last_broadcast_time` exclusively (§5: "owned exclusively
// by the detector task; no cross-task access") and is driven by an explicit
// `now` so the comparison logic stays a deterministic, testable function of
// its inputs rather than reading the wall clock itself.
// ==========================================

pub mod history;
pub mod parameters;
pub mod runner;
pub mod shiftwise;
pub mod status;

pub use history::HistoryWindowDetector;
pub use parameters::ParameterDetector;
pub use runner::DetectorRunner;
pub use shiftwise::ShiftwiseDetector;
pub use status::{snapshot_to_status_event, StatusDetector, StatusEvent};

/// Numeric significance rule, §4.4 "either side is null and they differ, or
/// both numeric and |Δ| > threshold".
pub(crate) fn numeric_significant(curr: Option<f64>, prev: Option<f64>, threshold: f64) -> bool {
    match (curr, prev) {
        (None, None) => false,
        (None, Some(_)) | (Some(_), None) => true,
        (Some(c), Some(p)) => (c - p).abs() > threshold,
    }
}

/// Non-numeric significance rule, §4.4 "non-numeric and values differ".
pub(crate) fn string_significant(curr: Option<&str>, prev: Option<&str>) -> bool {
    curr != prev
}
