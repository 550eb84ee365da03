//! PSI / ScheduleVersion / ProductionLog, §3 — the scheduler's durable
//! output. A PSI is created once per planned operation and accumulates
//! ScheduleVersions across reschedules; exactly one SV per PSI is active at
//! any instant (§5 "SV activation is a linearizable single-writer
//! transition").

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannedScheduleItem {
    pub id: String,
    pub order_id: String,
    pub operation_id: String,
    pub machine_id: String,
    pub total_quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleVersion {
    pub id: String,
    pub psi_id: String,
    pub version_no: i32,
    pub is_active: bool,
    pub planned_start: NaiveDateTime,
    pub planned_end: NaiveDateTime,
    pub planned_quantity: i32,
    pub completed_quantity: i32,
    pub remaining_quantity: i32,
    pub created_at: NaiveDateTime,
}

impl ScheduleVersion {
    pub fn is_complete(&self) -> bool {
        self.completed_quantity >= self.planned_quantity
    }

    /// §4.1: a part is "Past Due" if the latest planned_end is strictly
    /// before now with items incomplete.
    pub fn is_past_due(&self, now: NaiveDateTime) -> bool {
        self.planned_end < now && !self.is_complete()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionLog {
    pub id: String,
    pub psi_id: String,
    pub sv_id: String,
    pub operator: String,
    pub started_at: NaiveDateTime,
    pub stopped_at: Option<NaiveDateTime>,
    pub good_qty: i32,
    pub bad_qty: i32,
    pub reason_codes: Vec<String>,
}

/// One segment of a scheduled operation's batch, as emitted by the Scheduler
/// before persistence (§4.2 "Output for each operation actually placed").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledSegment {
    pub part_number: String,
    pub op_number: i32,
    pub machine_id: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub kind: super::types::SegmentKind,
    /// e.g. "Setup(30/60min)" or "Process(2/3pcs)".
    pub annotation: String,
}

/// A reschedule record, §4.3 "A reschedule record is stored capturing
/// {trigger, by-whom, timestamp, predecessors, successors}".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleRecord {
    pub id: String,
    pub trigger: super::types::RescheduleTrigger,
    pub triggered_by: String,
    pub timestamp: NaiveDateTime,
    pub predecessor_sv_ids: Vec<String>,
    pub successor_sv_ids: Vec<String>,
}
