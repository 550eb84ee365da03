//! The Scheduler, spec.md §4.2 — the heart of the core.
//!
//! Grounded on `examples/original_source/app/algorithm/scheduling_copy.py`:
//! the shift-adjust/gap-search/batch-placement algorithm is a direct port,
//! generalized to a configurable shift window and restructured so the run is
//! one pure function of its inputs (Design Notes §9) rather than closures
//! over module-level dict state.

use std::collections::HashMap;

use chrono::{Days, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::domain::{MachineState, ScheduledSegment, SegmentKind};

/// One operation of one part's routing, already known to belong to a
/// schedulable work center (unschedulable-WC operations are filtered out by
/// the caller before building this input, per §3 WorkCenter.is_schedulable).
#[derive(Debug, Clone)]
pub struct OperationInput {
    pub op_number: i32,
    pub operation_id: String,
    pub machine_id: String,
    pub setup_hours: f64,
    pub cycle_hours: f64,
}

/// One active part to be scheduled, §4.2 "Inputs".
#[derive(Debug, Clone)]
pub struct PartInput {
    pub part_number: String,
    pub order_id: String,
    pub quantity: i32,
    pub priority: i32,
    pub raw_material_available: bool,
    pub raw_material_available_from: NaiveDateTime,
    /// Must already be ordered ascending by op_number.
    pub operations: Vec<OperationInput>,
}

/// A machine's current availability and already-committed load.
#[derive(Debug, Clone)]
pub struct MachineAvailabilityInput {
    pub state: MachineState,
    pub available_from: NaiveDateTime,
    pub committed: Vec<(NaiveDateTime, NaiveDateTime)>,
}

pub struct ScheduleInput {
    pub now: NaiveDateTime,
    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,
    pub parts: Vec<PartInput>,
    pub machines: HashMap<String, MachineAvailabilityInput>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartScheduleResult {
    pub part_number: String,
    pub completed_ops: usize,
    pub total_ops: usize,
    pub final_end: Option<NaiveDateTime>,
}

/// Full output of one scheduling run, §4.2 plus the diagnostic lists carried
/// over from `scheduling_copy.py`'s return tuple (SPEC_FULL.md Supplemented
/// Features).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScheduleRunReport {
    pub placed: Vec<ScheduledSegment>,
    pub part_results: Vec<PartScheduleResult>,
    pub skipped_parts: Vec<String>,
    pub partially_completed: Vec<String>,
}

/// Shift-adjust: roll `t` forward to the next moment inside the shift
/// window, §4.2 "Shift adjust".
pub fn shift_adjust(t: NaiveDateTime, shift_start: NaiveTime, shift_end: NaiveTime) -> NaiveDateTime {
    let time = t.time();
    if time < shift_start {
        t.date().and_time(shift_start)
    } else if time >= shift_end {
        (t.date() + Days::new(1)).and_time(shift_start)
    } else {
        t
    }
}

fn day_shift_end(t: NaiveDateTime, shift_end: NaiveTime) -> NaiveDateTime {
    t.date().and_time(shift_end)
}

fn next_day_shift_start(after: NaiveDateTime, shift_start: NaiveTime) -> NaiveDateTime {
    (after.date() + Days::new(1)).and_time(shift_start)
}

fn minutes_between(a: NaiveDateTime, b: NaiveDateTime) -> f64 {
    (b - a).num_seconds() as f64 / 60.0
}

/// Gate a candidate earliest-start against a machine's availability, §4.2
/// "Machine availability gate". Returns `None` if the machine is OFF
/// (permanently unavailable for this run).
fn machine_gate(
    avail: &MachineAvailabilityInput,
    earliest_start: NaiveDateTime,
    shift_start: NaiveTime,
    shift_end: NaiveTime,
) -> Option<NaiveDateTime> {
    if avail.state == MachineState::Off {
        return None;
    }
    let mut est = earliest_start;
    if avail.available_from > est {
        est = avail.available_from;
    }
    Some(shift_adjust(est, shift_start, shift_end))
}

/// Optimal slot search, §4.2. `committed` need not be sorted on entry.
fn find_optimal_slot(
    committed: &[(NaiveDateTime, NaiveDateTime)],
    duration_minutes: f64,
    earliest_start: NaiveDateTime,
    shift_start: NaiveTime,
    shift_end: NaiveTime,
) -> NaiveDateTime {
    if committed.is_empty() {
        return earliest_start;
    }

    let mut sorted = committed.to_vec();
    sorted.sort_by_key(|iv| iv.0);

    if earliest_start < sorted[0].0 {
        let gap = minutes_between(earliest_start, sorted[0].0);
        if gap >= duration_minutes {
            return shift_adjust(earliest_start, shift_start, shift_end);
        }
    }

    for i in 0..sorted.len() {
        if i + 1 < sorted.len() {
            let gap_start = sorted[i].1.max(earliest_start);
            let gap = minutes_between(gap_start, sorted[i + 1].0);
            if gap >= duration_minutes {
                return shift_adjust(gap_start, shift_start, shift_end);
            }
        }
    }

    let last_end = sorted.iter().map(|iv| iv.1).max().unwrap();
    shift_adjust(last_end.max(earliest_start), shift_start, shift_end)
}

/// Place a span of `total_minutes` starting at `start`, splitting at shift
/// boundaries. Calls `on_segment(seg_start, seg_end, elapsed_before, total)`
/// for each contiguous piece placed, so the caller can format the
/// setup/process-specific annotation and track committed intervals.
fn place_across_shifts(
    start: NaiveDateTime,
    total_minutes: f64,
    shift_start: NaiveTime,
    shift_end: NaiveTime,
    mut on_segment: impl FnMut(NaiveDateTime, NaiveDateTime, f64, f64),
) -> NaiveDateTime {
    let mut cursor = start;
    let mut remaining = total_minutes;
    let mut elapsed = 0.0;

    while remaining > 0.0 {
        let today_shift_end = day_shift_end(cursor, shift_end);
        let minutes_today = minutes_between(cursor, today_shift_end).max(0.0);
        let work_this_segment = remaining.min(minutes_today);
        let seg_end = cursor + chrono::Duration::seconds((work_this_segment * 60.0).round() as i64);

        on_segment(cursor, seg_end, elapsed, elapsed + work_this_segment);

        elapsed += work_this_segment;
        remaining -= work_this_segment;

        if remaining > 0.0 {
            cursor = next_day_shift_start(today_shift_end, shift_start);
        } else {
            cursor = seg_end;
        }
    }

    cursor
}

struct BatchContext<'a> {
    shift_start: NaiveTime,
    shift_end: NaiveTime,
    committed: &'a mut HashMap<String, Vec<(NaiveDateTime, NaiveDateTime)>>,
    machines: &'a HashMap<String, MachineAvailabilityInput>,
}

/// Schedule one part's batch of operations in sequence, §4.2 "Batch
/// placement". Returns the segments placed, how many leading operations
/// were fully placed, and the final completion instant (if any operation was
/// placed at all).
fn schedule_batch_operations(
    ctx: &mut BatchContext,
    part: &PartInput,
    start_time: NaiveDateTime,
) -> (Vec<ScheduledSegment>, usize, Option<NaiveDateTime>) {
    let mut batch = Vec::new();
    let mut prev_op_end: Option<NaiveDateTime> = None;
    let mut completed_ops = 0usize;
    let mut final_end = None;

    for op in &part.operations {
        let avail = match ctx.machines.get(&op.machine_id) {
            Some(a) => a,
            None => break, // no known status for this machine: treat as unavailable
        };

        let earliest_start = prev_op_end.unwrap_or(start_time);
        let gated_start =
            match machine_gate(avail, earliest_start, ctx.shift_start, ctx.shift_end) {
                Some(t) => t,
                None => break, // machine OFF: this and all following ops deferred
            };

        let setup_minutes = op.setup_hours * 60.0;
        let processing_minutes = op.cycle_hours * 60.0 * part.quantity as f64;
        let total_minutes = setup_minutes + processing_minutes;

        let committed = ctx.committed.entry(op.machine_id.clone()).or_default();
        let slot_start =
            find_optimal_slot(committed, total_minutes, gated_start, ctx.shift_start, ctx.shift_end);

        let mut op_segments = Vec::new();

        // Setup, split across shift boundaries.
        let setup_end = if setup_minutes > 0.0 {
            place_across_shifts(
                slot_start,
                setup_minutes,
                ctx.shift_start,
                ctx.shift_end,
                |seg_start, seg_end, elapsed_before, elapsed_after| {
                    op_segments.push(ScheduledSegment {
                        part_number: part.part_number.clone(),
                        op_number: op.op_number,
                        machine_id: op.machine_id.clone(),
                        start: seg_start,
                        end: seg_end,
                        kind: SegmentKind::Setup,
                        annotation: format!(
                            "Setup({}/{}min)",
                            elapsed_after.round() as i64,
                            setup_minutes.round() as i64
                        ),
                    });
                    let _ = elapsed_before;
                },
            )
        } else {
            slot_start
        };

        // Process, split across shift boundaries, pieces tracked cumulatively.
        let quantity = part.quantity;
        let process_end = if processing_minutes > 0.0 {
            let mut cumulative_pieces = 0i64;
            place_across_shifts(
                setup_end,
                processing_minutes,
                ctx.shift_start,
                ctx.shift_end,
                |seg_start, seg_end, elapsed_before, elapsed_after| {
                    let is_final_segment = (processing_minutes - elapsed_after).abs() < 1e-6;
                    let new_cumulative = if is_final_segment {
                        // Open question resolution (SPEC_FULL.md): the final
                        // segment absorbs the remainder so pieces reach
                        // exactly `quantity`, never more.
                        quantity as i64
                    } else {
                        let ratio = elapsed_after / processing_minutes;
                        (quantity as f64 * ratio).floor() as i64
                    }
                    .min(quantity as i64)
                    .max(cumulative_pieces);

                    op_segments.push(ScheduledSegment {
                        part_number: part.part_number.clone(),
                        op_number: op.op_number,
                        machine_id: op.machine_id.clone(),
                        start: seg_start,
                        end: seg_end,
                        kind: SegmentKind::Process,
                        annotation: format!("Process({}/{}pcs)", new_cumulative, quantity),
                    });

                    cumulative_pieces = new_cumulative;
                    let _ = elapsed_before;
                },
            )
        } else {
            setup_end
        };

        let committed = ctx.committed.entry(op.machine_id.clone()).or_default();
        for seg in &op_segments {
            committed.push((seg.start, seg.end));
        }

        batch.extend(op_segments);
        prev_op_end = Some(process_end);
        final_end = Some(process_end);
        completed_ops += 1;
    }

    (batch, completed_ops, final_end)
}

/// Run the scheduler once over a consistent snapshot of active parts and
/// machine state. Pure function: no I/O, no shared mutable state outside the
/// committed-interval map built and discarded within this call.
pub fn schedule(input: ScheduleInput) -> ScheduleRunReport {
    let mut parts = input.parts;
    // Stable sort: ascending priority, ties broken by original (insertion)
    // order, §4.2 "Tie-breaking".
    parts.sort_by_key(|p| p.priority);

    let mut committed: HashMap<String, Vec<(NaiveDateTime, NaiveDateTime)>> = HashMap::new();
    for (machine_id, avail) in &input.machines {
        committed.insert(machine_id.clone(), avail.committed.clone());
    }

    let mut report = ScheduleRunReport::default();

    for part in &parts {
        if !part.raw_material_available {
            report
                .skipped_parts
                .push(format!("{}: raw material unavailable", part.part_number));
            continue;
        }

        let mut start_time = input.now;
        if part.raw_material_available_from > start_time {
            start_time = part.raw_material_available_from;
        }
        start_time = shift_adjust(start_time, input.shift_start, input.shift_end);

        let mut ctx = BatchContext {
            shift_start: input.shift_start,
            shift_end: input.shift_end,
            committed: &mut committed,
            machines: &input.machines,
        };

        let (segments, completed_ops, final_end) =
            schedule_batch_operations(&mut ctx, part, start_time);

        if segments.is_empty() {
            report
                .skipped_parts
                .push(format!("{}: no operations could be placed", part.part_number));
            continue;
        }

        report.placed.extend(segments);
        report.part_results.push(PartScheduleResult {
            part_number: part.part_number.clone(),
            completed_ops,
            total_ops: part.operations.len(),
            final_end,
        });

        if completed_ops < part.operations.len() {
            report.partially_completed.push(format!(
                "{}: partially completed ({}/{})",
                part.part_number,
                completed_ops,
                part.operations.len()
            ));
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, mi, 0).unwrap()
    }

    fn shift() -> (NaiveTime, NaiveTime) {
        (NaiveTime::from_hms_opt(9, 0, 0).unwrap(), NaiveTime::from_hms_opt(17, 0, 0).unwrap())
    }

    fn machines(ids: &[(&str, MachineState)]) -> HashMap<String, MachineAvailabilityInput> {
        ids.iter()
            .map(|(id, state)| {
                (
                    id.to_string(),
                    MachineAvailabilityInput {
                        state: *state,
                        available_from: dt(2024, 1, 1, 0, 0),
                        committed: vec![],
                    },
                )
            })
            .collect()
    }

    #[test]
    fn shift_adjust_rolls_before_open() {
        let (s, e) = shift();
        let t = dt(2024, 12, 20, 7, 30);
        assert_eq!(shift_adjust(t, s, e), dt(2024, 12, 20, 9, 0));
    }

    #[test]
    fn shift_adjust_rolls_after_close() {
        let (s, e) = shift();
        let t = dt(2024, 12, 20, 18, 0);
        assert_eq!(shift_adjust(t, s, e), dt(2024, 12, 21, 9, 0));
    }

    #[test]
    fn shift_adjust_keeps_within_window() {
        let (s, e) = shift();
        let t = dt(2024, 12, 20, 10, 0);
        assert_eq!(shift_adjust(t, s, e), t);
    }

    /// Scenario A: single part, single machine, no shift rollover.
    #[test]
    fn scenario_a_single_part_single_machine() {
        let (s, e) = shift();
        let input = ScheduleInput {
            now: dt(2024, 12, 20, 9, 0),
            shift_start: s,
            shift_end: e,
            machines: machines(&[("M1", MachineState::On)]),
            parts: vec![PartInput {
                part_number: "P1".to_string(),
                order_id: "O1".to_string(),
                quantity: 3,
                priority: 1,
                raw_material_available: true,
                raw_material_available_from: dt(2024, 12, 20, 9, 0),
                operations: vec![
                    OperationInput {
                        op_number: 10,
                        operation_id: "op10".to_string(),
                        machine_id: "M1".to_string(),
                        setup_hours: 0.5,
                        cycle_hours: 0.25,
                    },
                    OperationInput {
                        op_number: 20,
                        operation_id: "op20".to_string(),
                        machine_id: "M1".to_string(),
                        setup_hours: 1.0,
                        cycle_hours: 0.5,
                    },
                ],
            }],
        };

        let report = schedule(input);
        assert!(report.skipped_parts.is_empty());
        assert_eq!(report.part_results.len(), 1);
        assert_eq!(report.part_results[0].completed_ops, 2);
        assert_eq!(report.part_results[0].final_end, Some(dt(2024, 12, 20, 12, 45)));

        // op10: Setup 09:00-09:30, Process 09:30-10:15 (3x15min)
        let op10_setup = &report.placed[0];
        assert_eq!(op10_setup.start, dt(2024, 12, 20, 9, 0));
        assert_eq!(op10_setup.end, dt(2024, 12, 20, 9, 30));
        let op10_process = &report.placed[1];
        assert_eq!(op10_process.start, dt(2024, 12, 20, 9, 30));
        assert_eq!(op10_process.end, dt(2024, 12, 20, 10, 15));

        // op20: Setup 10:15-11:15, Process 11:15-12:45 (3x30min)
        let op20_setup = &report.placed[2];
        assert_eq!(op20_setup.start, dt(2024, 12, 20, 10, 15));
        assert_eq!(op20_setup.end, dt(2024, 12, 20, 11, 15));
        let op20_process = &report.placed[3];
        assert_eq!(op20_process.start, dt(2024, 12, 20, 11, 15));
        assert_eq!(op20_process.end, dt(2024, 12, 20, 12, 45));
    }

    /// Scenario B: a 2h process starting at 16:00 splits across the shift
    /// boundary: 16:00-17:00 today, remainder 09:00-10:00 next day.
    #[test]
    fn scenario_b_shift_rollover_splits_process() {
        let (s, e) = shift();
        let start = dt(2024, 12, 20, 16, 0);
        let mut segs = Vec::new();
        let end = place_across_shifts(start, 120.0, s, e, |seg_start, seg_end, _before, _after| {
            segs.push((seg_start, seg_end));
        });

        assert_eq!(segs.len(), 2);
        assert_eq!(segs[0], (dt(2024, 12, 20, 16, 0), dt(2024, 12, 20, 17, 0)));
        assert_eq!(segs[1], (dt(2024, 12, 21, 9, 0), dt(2024, 12, 21, 10, 0)));
        assert_eq!(end, dt(2024, 12, 21, 10, 0));
    }

    /// Scenario B, full pipeline: pieces reported per shift with the first
    /// segment rounded down and the final segment absorbing the remainder.
    #[test]
    fn scenario_b_process_pieces_round_down_then_absorb_remainder() {
        let (s, e) = shift();
        // 3 pieces, cycle_hours chosen so total processing = 120 minutes,
        // 1 hour fits in today's shift (60/120 = 50% -> floor(3*0.5)=1).
        let input = ScheduleInput {
            now: dt(2024, 12, 20, 16, 0),
            shift_start: s,
            shift_end: e,
            machines: machines(&[("M1", MachineState::On)]),
            parts: vec![PartInput {
                part_number: "P1".to_string(),
                order_id: "O1".to_string(),
                quantity: 3,
                priority: 1,
                raw_material_available: true,
                raw_material_available_from: dt(2024, 12, 20, 9, 0),
                operations: vec![OperationInput {
                    op_number: 10,
                    operation_id: "op10".to_string(),
                    machine_id: "M1".to_string(),
                    setup_hours: 0.0,
                    cycle_hours: 40.0 / 60.0, // 40 min/piece * 3 = 120 min
                }],
            }],
        };

        let report = schedule(input);
        assert_eq!(report.placed.len(), 2);
        assert_eq!(report.placed[0].annotation, "Process(2/3pcs)");
        assert_eq!(report.placed[1].annotation, "Process(3/3pcs)");
    }

    /// Scenario C: gap fitting between two committed intervals.
    #[test]
    fn scenario_c_gap_fitting() {
        let (s, e) = shift();
        let committed = vec![
            (dt(2024, 12, 20, 9, 0), dt(2024, 12, 20, 10, 0)),
            (dt(2024, 12, 20, 14, 0), dt(2024, 12, 20, 17, 0)),
        ];
        let slot = find_optimal_slot(&committed, 120.0, dt(2024, 12, 20, 9, 0), s, e);
        assert_eq!(slot, dt(2024, 12, 20, 10, 0));
    }

    /// Scenario D: machine OFF mid-part leaves the part partially completed.
    #[test]
    fn scenario_d_machine_off_mid_part() {
        let (s, e) = shift();
        let input = ScheduleInput {
            now: dt(2024, 12, 20, 9, 0),
            shift_start: s,
            shift_end: e,
            machines: machines(&[("M1", MachineState::On), ("M2", MachineState::Off)]),
            parts: vec![PartInput {
                part_number: "P1".to_string(),
                order_id: "O1".to_string(),
                quantity: 1,
                priority: 1,
                raw_material_available: true,
                raw_material_available_from: dt(2024, 12, 20, 9, 0),
                operations: vec![
                    OperationInput {
                        op_number: 10,
                        operation_id: "op10".to_string(),
                        machine_id: "M1".to_string(),
                        setup_hours: 0.1,
                        cycle_hours: 0.1,
                    },
                    OperationInput {
                        op_number: 20,
                        operation_id: "op20".to_string(),
                        machine_id: "M2".to_string(),
                        setup_hours: 0.1,
                        cycle_hours: 0.1,
                    },
                ],
            }],
        };

        let report = schedule(input);
        assert_eq!(report.part_results[0].completed_ops, 1);
        assert_eq!(report.partially_completed.len(), 1);
        assert!(report.partially_completed[0].contains("1/2"));
    }

    /// Property 1: no two segments on the same machine overlap.
    #[test]
    fn property_no_overlap_on_same_machine() {
        let (s, e) = shift();
        let input = ScheduleInput {
            now: dt(2024, 12, 20, 9, 0),
            shift_start: s,
            shift_end: e,
            machines: machines(&[("M1", MachineState::On)]),
            parts: vec![
                PartInput {
                    part_number: "P1".to_string(),
                    order_id: "O1".to_string(),
                    quantity: 2,
                    priority: 1,
                    raw_material_available: true,
                    raw_material_available_from: dt(2024, 12, 20, 9, 0),
                    operations: vec![OperationInput {
                        op_number: 10,
                        operation_id: "op10".to_string(),
                        machine_id: "M1".to_string(),
                        setup_hours: 0.5,
                        cycle_hours: 0.5,
                    }],
                },
                PartInput {
                    part_number: "P2".to_string(),
                    order_id: "O2".to_string(),
                    quantity: 2,
                    priority: 2,
                    raw_material_available: true,
                    raw_material_available_from: dt(2024, 12, 20, 9, 0),
                    operations: vec![OperationInput {
                        op_number: 10,
                        operation_id: "op10b".to_string(),
                        machine_id: "M1".to_string(),
                        setup_hours: 0.5,
                        cycle_hours: 0.5,
                    }],
                },
            ],
        };

        let report = schedule(input);
        let mut by_machine: HashMap<String, Vec<(NaiveDateTime, NaiveDateTime)>> = HashMap::new();
        for seg in &report.placed {
            by_machine.entry(seg.machine_id.clone()).or_default().push((seg.start, seg.end));
        }
        for intervals in by_machine.values() {
            let mut sorted = intervals.clone();
            sorted.sort_by_key(|iv| iv.0);
            for w in sorted.windows(2) {
                assert!(w[0].1 <= w[1].0, "overlap: {:?} vs {:?}", w[0], w[1]);
            }
        }
    }

    /// Property 3: every segment lies within the shift window on its day.
    #[test]
    fn property_segments_within_shift_window() {
        let (s, e) = shift();
        let input = ScheduleInput {
            now: dt(2024, 12, 20, 16, 30),
            shift_start: s,
            shift_end: e,
            machines: machines(&[("M1", MachineState::On)]),
            parts: vec![PartInput {
                part_number: "P1".to_string(),
                order_id: "O1".to_string(),
                quantity: 5,
                priority: 1,
                raw_material_available: true,
                raw_material_available_from: dt(2024, 12, 20, 9, 0),
                operations: vec![OperationInput {
                    op_number: 10,
                    operation_id: "op10".to_string(),
                    machine_id: "M1".to_string(),
                    setup_hours: 1.0,
                    cycle_hours: 1.0,
                }],
            }],
        };

        let report = schedule(input);
        for seg in &report.placed {
            assert!(seg.start.time() >= s);
            assert!(seg.end.time() <= e || seg.end.time() == chrono::NaiveTime::from_hms_opt(0,0,0).unwrap());
            assert_eq!(seg.start.date(), seg.end.date());
        }
    }
}
