//! Downtime / maintenance endpoints, spec.md §4.6/§6. Grounded on
//! `examples/original_source/app/api/v1/endpoints/mttr_mtbf.py`.

use axum::extract::{Path, State};
use axum::Json;
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::domain::{Downtime, RescheduleTrigger};
use crate::engine::mttr_mtbf::{machine_performance, shop_performance, MachinePerformance, PerformanceReport};

use super::error::{ApiError, ApiResult};
use super::reschedule::trigger_reschedule;
use super::state::SharedState;

/// Fires the reschedule side effect for a downtime transition without
/// failing the request that already succeeded if it errors.
async fn reschedule_best_effort(state: &SharedState, trigger: RescheduleTrigger, by: &str) {
    if let Err(err) = trigger_reschedule(state, trigger, by).await {
        tracing::warn!(error = %err, "post-downtime reschedule failed");
    }
}

#[derive(Debug, Deserialize)]
pub struct OpenDowntimeRequest {
    pub machine_id: String,
    /// Defaults to "now" if omitted, per SPEC_FULL.md's Supplemented
    /// Features section.
    pub open_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub priority: i32,
    pub reported_by: String,
}

pub async fn open_downtime(
    State(state): State<SharedState>,
    Json(req): Json<OpenDowntimeRequest>,
) -> ApiResult<Json<Downtime>> {
    let open_at = req.open_at.unwrap_or_else(|| chrono::Utc::now().naive_utc());
    let downtime = state.downtime.open(&req.machine_id, open_at, req.priority, &req.reported_by)?;
    reschedule_best_effort(&state, RescheduleTrigger::DowntimeOpened, &req.reported_by).await;
    Ok(Json(downtime))
}

pub async fn list_downtimes(State(state): State<SharedState>) -> ApiResult<Json<Vec<(String, Vec<Downtime>)>>> {
    Ok(Json(state.downtime.list_all_by_machine()?))
}

#[derive(Debug, Deserialize)]
pub struct AcknowledgeRequest {
    pub in_progress_at: Option<NaiveDateTime>,
}

pub async fn acknowledge_downtime(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<AcknowledgeRequest>,
) -> ApiResult<axum::http::StatusCode> {
    let in_progress_at = req.in_progress_at.unwrap_or_else(|| chrono::Utc::now().naive_utc());
    state.downtime.acknowledge(&id, in_progress_at)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct CloseDowntimeRequest {
    pub closed_at: Option<NaiveDateTime>,
    pub action_taken: String,
}

pub async fn close_downtime(
    State(state): State<SharedState>,
    Path(id): Path<String>,
    Json(req): Json<CloseDowntimeRequest>,
) -> ApiResult<axum::http::StatusCode> {
    let closed_at = req.closed_at.unwrap_or_else(|| chrono::Utc::now().naive_utc());
    state.downtime.close(&id, closed_at, &req.action_taken)?;
    reschedule_best_effort(&state, RescheduleTrigger::DowntimeClosed, &req.action_taken).await;
    Ok(axum::http::StatusCode::NO_CONTENT)
}

pub async fn shop_machine_performance(State(state): State<SharedState>) -> ApiResult<Json<PerformanceReport>> {
    let now = chrono::Utc::now().naive_utc();
    let by_machine = state.downtime.list_all_by_machine()?;
    Ok(Json(shop_performance(&by_machine, now)))
}

/// Single-route delegation, SPEC_FULL.md's Supplemented Features: one
/// machine's performance metrics reuse the same [`machine_performance`]
/// computation the shop-wide report is built from rather than a parallel
/// code path.
pub async fn single_machine_performance(
    State(state): State<SharedState>,
    Path(machine_id): Path<String>,
) -> ApiResult<Json<MachinePerformance>> {
    let now = chrono::Utc::now().naive_utc();
    let downtimes = state.downtime.list_for_machine(&machine_id)?;
    if downtimes.is_empty() {
        return Err(ApiError::NotFound(format!("no downtime history for machine {machine_id}")));
    }
    Ok(Json(machine_performance(&machine_id, &downtimes, now)))
}
