//! The Reschedule Controller, spec.md §4.3.
//!
//! Orchestrates the Scheduler: takes a caller-supplied snapshot, runs
//! [`crate::engine::scheduler::schedule`] treating in-progress operations as
//! committed immovable intervals, and reports which SVs should be archived
//! (predecessors) against which new ones should replace them (successors).
//! Persistence of the resulting SVs and the [`RescheduleRecord`] itself is
//! the repository layer's job (§5 "SV activation is a linearizable
//! single-writer transition") — this controller only computes what to write.

use chrono::NaiveDateTime;

use crate::domain::RescheduleTrigger;
use crate::engine::scheduler::{schedule, ScheduleInput, ScheduleRunReport};

/// Drives one reschedule run. Holds no state between runs: §5 requires that
/// two scheduling runs never execute concurrently, which the caller
/// enforces with a single lock around `run`.
pub struct RescheduleController;

/// Outcome of one reschedule run: the scheduler's report plus the identifiers
/// of the SVs it supersedes, ready to hand to the repository layer for the
/// single activation transaction.
#[derive(Debug, Clone)]
pub struct RescheduleOutcome {
    pub trigger: RescheduleTrigger,
    pub triggered_by: String,
    pub timestamp: NaiveDateTime,
    pub predecessor_sv_ids: Vec<String>,
    pub report: ScheduleRunReport,
}

impl RescheduleController {
    pub fn new() -> Self {
        Self
    }

    /// Run the scheduler against `input` (already built by the caller from a
    /// consistent snapshot, with in-progress operations folded into each
    /// machine's `committed` intervals so the scheduler cannot move them).
    /// `predecessor_sv_ids` are the active SVs this run is meant to replace;
    /// they pass through unchanged so the repository can archive exactly
    /// those rows in the same transaction that inserts the new ones.
    pub fn run(
        &self,
        input: ScheduleInput,
        trigger: RescheduleTrigger,
        triggered_by: impl Into<String>,
        predecessor_sv_ids: Vec<String>,
    ) -> RescheduleOutcome {
        let timestamp = input.now;
        let report = schedule(input);

        RescheduleOutcome {
            trigger,
            triggered_by: triggered_by.into(),
            timestamp,
            predecessor_sv_ids,
            report,
        }
    }
}

impl Default for RescheduleController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MachineState;
    use crate::engine::scheduler::{MachineAvailabilityInput, OperationInput, PartInput};
    use chrono::{NaiveDate, NaiveTime};
    use std::collections::HashMap;

    fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, mi, 0).unwrap()
    }

    #[test]
    fn run_produces_report_and_carries_trigger_metadata() {
        let mut machines = HashMap::new();
        machines.insert(
            "M1".to_string(),
            MachineAvailabilityInput {
                state: MachineState::On,
                available_from: dt(2024, 1, 1, 0, 0),
                committed: vec![],
            },
        );

        let input = ScheduleInput {
            now: dt(2024, 1, 1, 9, 0),
            shift_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            shift_end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            machines,
            parts: vec![PartInput {
                part_number: "P1".to_string(),
                order_id: "O1".to_string(),
                quantity: 1,
                priority: 1,
                raw_material_available: true,
                raw_material_available_from: dt(2024, 1, 1, 9, 0),
                operations: vec![OperationInput {
                    op_number: 10,
                    operation_id: "op10".to_string(),
                    machine_id: "M1".to_string(),
                    setup_hours: 0.1,
                    cycle_hours: 0.1,
                }],
            }],
        };

        let controller = RescheduleController::new();
        let outcome = controller.run(
            input,
            RescheduleTrigger::DowntimeClosed,
            "system",
            vec!["sv-old-1".to_string()],
        );

        assert_eq!(outcome.trigger, RescheduleTrigger::DowntimeClosed);
        assert_eq!(outcome.triggered_by, "system");
        assert_eq!(outcome.predecessor_sv_ids, vec!["sv-old-1".to_string()]);
        assert_eq!(outcome.report.part_results.len(), 1);
    }
}
