//! Reschedule orchestration, spec.md §4.3. Builds a [`ScheduleInput`] from a
//! consistent snapshot of the Catalog Store, runs it through the
//! [`RescheduleController`], and persists the result as new active SVs,
//! archiving the ones they supersede. Serialized behind
//! [`AppState::reschedule_lock`] (§5: "two scheduling runs never execute
//! concurrently").

use std::collections::HashMap;

use axum::extract::State;
use axum::Json;
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::domain::MachineState;
pub use crate::domain::RescheduleTrigger;
use crate::engine::reschedule::RescheduleController;
use crate::engine::scheduler::{MachineAvailabilityInput, OperationInput, PartInput, ScheduleInput};

use super::error::ApiResult;
use super::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct AdminRescheduleRequest {
    pub requested_by: String,
}

/// `POST /maintainance/reschedule`, §4.3's "explicit admin call" trigger.
pub async fn admin_reschedule(
    State(state): State<SharedState>,
    Json(req): Json<AdminRescheduleRequest>,
) -> ApiResult<axum::http::StatusCode> {
    trigger_reschedule(&state, RescheduleTrigger::AdminRequest, &req.requested_by).await?;
    Ok(axum::http::StatusCode::ACCEPTED)
}

/// Runs one full reschedule over every active part, §4.3's "explicit admin
/// call" trigger and the implicit ones fired after a downtime or priority
/// change. Best-effort: callers that trigger this as a side effect of
/// another successful write should log failures rather than fail the
/// original request.
pub async fn trigger_reschedule(
    state: &SharedState,
    trigger: RescheduleTrigger,
    triggered_by: &str,
) -> ApiResult<()> {
    let _guard = state.reschedule_lock.lock().await;
    let now = chrono::Utc::now().naive_utc();

    let statuses = state.catalog.list_active_part_schedule_statuses()?;
    let orders = state.catalog.list_orders()?;
    let projects = state.catalog.list_projects()?;
    let project_priority: HashMap<&str, i32> = projects.iter().map(|p| (p.id.as_str(), p.priority)).collect();

    let mut parts = Vec::new();
    let mut predecessor_sv_ids = Vec::new();

    for status in &statuses {
        let Some(order) = orders.iter().find(|o| o.production_order == status.production_order) else { continue };
        let mut operations: Vec<_> = state
            .catalog
            .list_operations_for_order(&order.id)?
            .into_iter()
            .map(|op| OperationInput {
                op_number: op.op_number,
                operation_id: op.id,
                machine_id: op.machine_id,
                setup_hours: op.setup_time,
                cycle_hours: op.cycle_time,
            })
            .collect();
        operations.sort_by_key(|op| op.op_number);

        let raw_material = state.catalog.find_raw_material(&order.raw_material_id)?;
        let (raw_material_available, raw_material_available_from) =
            raw_material.map(|rm| (rm.status.is_available(), rm.available_from)).unwrap_or((false, now));

        if let Some(active) = state.schedule.active_versions_for_order(&order.id)?.into_iter().next() {
            predecessor_sv_ids.push(active.id);
        }

        parts.push(PartInput {
            part_number: order.part_number.clone(),
            order_id: order.id.clone(),
            quantity: order.required_qty,
            priority: *project_priority.get(order.project_id.as_str()).unwrap_or(&i32::MAX),
            raw_material_available,
            raw_material_available_from,
            operations,
        });
    }

    let machine_statuses = state.catalog.list_machine_statuses()?;
    let mut machines = HashMap::new();
    for machine in state.catalog.list_machines()? {
        let status = machine_statuses.iter().find(|s| s.machine_id == machine.id);
        let (state_kind, available_from) =
            status.map(|s| (s.status, s.available_from)).unwrap_or((MachineState::On, now));
        machines.insert(machine.id, MachineAvailabilityInput { state: state_kind, available_from, committed: Vec::new() });
    }

    let input = ScheduleInput { now, shift_start: state.settings.shift_start, shift_end: state.settings.shift_end, parts, machines };

    let controller = RescheduleController::new();
    let outcome = controller.run(input, trigger, triggered_by, predecessor_sv_ids);

    if !outcome.report.skipped_parts.is_empty() {
        tracing::warn!(skipped = ?outcome.report.skipped_parts, "reschedule run skipped parts");
    }
    if !outcome.report.partially_completed.is_empty() {
        tracing::warn!(partially_completed = ?outcome.report.partially_completed, "reschedule run left parts partially placed");
    }

    let successor_sv_ids = persist_outcome(state, &outcome.report, now).await?;
    state.schedule.insert_reschedule_record(trigger, triggered_by, now, &outcome.predecessor_sv_ids, &successor_sv_ids)?;
    Ok(())
}

async fn persist_outcome(
    state: &SharedState,
    report: &crate::engine::scheduler::ScheduleRunReport,
    now: NaiveDateTime,
) -> ApiResult<Vec<String>> {
    let mut successor_sv_ids = Vec::new();
    for result in &report.part_results {
        let Some(final_end) = result.final_end else { continue };
        let Some(order) = state.catalog.find_order_by_part_number(&result.part_number)? else { continue };
        let Some(first_op) = state.catalog.list_operations_for_order(&order.id)?.into_iter().min_by_key(|op| op.op_number) else { continue };

        let planned_start = report
            .placed
            .iter()
            .filter(|seg| seg.part_number == result.part_number)
            .map(|seg| seg.start)
            .min()
            .unwrap_or(now);

        let psi = state.schedule.find_or_create_psi(&order.id, &first_op.id, &first_op.machine_id, order.required_qty)?;
        let sv = state.schedule.activate_version(&psi.id, planned_start, final_end, order.required_qty, now)?;
        successor_sv_ids.push(sv.id);
    }
    Ok(successor_sv_ids)
}
