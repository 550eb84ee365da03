//! Priority endpoints, spec.md §4.1/§6. Grounded on
//! `examples/original_source/app/api/v1/endpoints/priority_scheduling.py`'s
//! `get_priority_details`/`get_part_priority_details`/`update_part_priority`/
//! `update_order_priority`.

use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{Order, Project, RescheduleTrigger};
use crate::engine::priority::{
    check_changeable, derive_scheduling_status, lead_time_difference_days, reindex, PartScheduleSpan, PriorityDetail,
    ProjectPriority,
};

use super::error::{ApiError, ApiResult};
use super::reschedule::trigger_reschedule;
use super::state::SharedState;

fn build_detail(state: &SharedState, order: &Order, project: &Project, now: NaiveDateTime) -> ApiResult<PriorityDetail> {
    let versions = state.schedule.active_versions_for_order(&order.id)?;
    let span = PartScheduleSpan {
        earliest_start: versions.iter().map(|v| v.planned_start).min(),
        latest_end: versions.iter().map(|v| v.planned_end).max(),
        total_versions: versions.len(),
        completed_versions: versions.iter().filter(|v| v.is_complete()).count(),
    };
    let (status, is_changeable, reason) = derive_scheduling_status(&span, now);
    Ok(PriorityDetail {
        part_number: order.part_number.clone(),
        current_priority: project.priority,
        planned_start: span.earliest_start,
        planned_end: span.latest_end,
        status,
        is_changeable,
        reason,
        lead_time_difference_days: lead_time_difference_days(project.delivery_date, span.latest_end),
    })
}

pub async fn all_details(State(state): State<SharedState>) -> ApiResult<Json<Vec<PriorityDetail>>> {
    let now = chrono::Utc::now().naive_utc();
    let orders = state.catalog.list_orders()?;
    let mut details = Vec::with_capacity(orders.len());
    for order in &orders {
        let project = state
            .catalog
            .find_project(&order.project_id)?
            .ok_or_else(|| ApiError::Internal(format!("order {} references missing project", order.id)))?;
        details.push(build_detail(&state, order, &project, now)?);
    }
    Ok(Json(details))
}

pub async fn part_details(
    State(state): State<SharedState>,
    Path(part_number): Path<String>,
) -> ApiResult<Json<PriorityDetail>> {
    let order = state
        .catalog
        .find_order_by_part_number(&part_number)?
        .ok_or_else(|| ApiError::NotFound(format!("part {part_number} not found")))?;
    let project = state
        .catalog
        .find_project(&order.project_id)?
        .ok_or_else(|| ApiError::Internal(format!("order {} references missing project", order.id)))?;
    let now = chrono::Utc::now().naive_utc();
    Ok(Json(build_detail(&state, &order, &project, now)?))
}

#[derive(Debug, Deserialize)]
pub struct PriorityUpdateRequest {
    pub project_id: String,
    pub new_priority: i32,
}

#[derive(Debug, Serialize)]
pub struct PriorityUpdateResponse {
    pub updated: Vec<ProjectPriority>,
}

/// Shared by both `PUT /priority/update` and `PUT /priority/order/{id}/priority`:
/// validates the moving project's part is still changeable, then reindexes
/// every project's priority and persists the result, §4.1.
async fn apply_priority_change(state: &SharedState, project_id: &str, new_priority: i32) -> ApiResult<Vec<ProjectPriority>> {
    let order = state
        .catalog
        .list_orders()?
        .into_iter()
        .find(|o| o.project_id == project_id)
        .ok_or_else(|| ApiError::NotFound(format!("no order found for project {project_id}")))?;
    let project = state
        .catalog
        .find_project(project_id)?
        .ok_or_else(|| ApiError::NotFound(format!("project {project_id} not found")))?;

    let now = chrono::Utc::now().naive_utc();
    let detail = build_detail(state, &order, &project, now)?;
    check_changeable(detail.status, &detail.reason)?;

    let projects = state.catalog.list_projects()?;
    let entries: Vec<ProjectPriority> =
        projects.iter().map(|p| ProjectPriority { project_id: p.id.clone(), priority: p.priority }).collect();
    let updated = reindex(&entries, project_id, project.priority, new_priority);

    for entry in &updated {
        state.catalog.set_project_priority(&entry.project_id, entry.priority)?;
    }
    Ok(updated)
}

pub async fn update_priority(
    State(state): State<SharedState>,
    Json(req): Json<PriorityUpdateRequest>,
) -> ApiResult<Json<PriorityUpdateResponse>> {
    let updated = apply_priority_change(&state, &req.project_id, req.new_priority).await?;
    if let Err(err) = trigger_reschedule(&state, RescheduleTrigger::PriorityChanged, &req.project_id).await {
        tracing::warn!(error = %err, "post-priority-change reschedule failed");
    }
    Ok(Json(PriorityUpdateResponse { updated }))
}

#[derive(Debug, Deserialize)]
pub struct OrderPriorityRequest {
    pub new_priority: i32,
}

pub async fn update_order_priority(
    State(state): State<SharedState>,
    Path(order_id): Path<String>,
    Json(req): Json<OrderPriorityRequest>,
) -> ApiResult<Json<PriorityUpdateResponse>> {
    let order = state
        .catalog
        .find_order_by_production_order(&order_id)?
        .ok_or_else(|| ApiError::NotFound(format!("order {order_id} not found")))?;
    let updated = apply_priority_change(&state, &order.project_id, req.new_priority).await?;
    if let Err(err) = trigger_reschedule(&state, RescheduleTrigger::PriorityChanged, &order_id).await {
        tracing::warn!(error = %err, "post-priority-change reschedule failed");
    }
    Ok(Json(PriorityUpdateResponse { updated }))
}
