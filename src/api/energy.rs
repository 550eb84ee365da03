//! Energy monitoring SSE streams and the history range query, spec.md
//! §4.4/§4.5/§6. Grounded on
//! `examples/original_source/app/api/v1/endpoints/energymonitoring.py`'s
//! five `StreamingResponse` endpoints and its `get_historical_data` range
//! query (7-day cap, basic statistics).

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, Sse};
use axum::Json;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::detect::snapshot_to_status_event;
use crate::domain::TelemetrySnapshot;

use super::error::{ApiError, ApiResult};
use super::sse::sse_response;
use super::state::SharedState;

const MAX_HISTORY_RANGE_DAYS: i64 = 7;

pub async fn machine_status_stream(
    State(state): State<SharedState>,
) -> ApiResult<Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>>> {
    let snapshot: Vec<_> = state.telemetry.list_live()?.iter().map(snapshot_to_status_event).collect();
    let sub = state.hub.machine_status.subscribe(snapshot);
    Ok(sse_response(sub))
}

pub async fn machine_parameters_stream(
    State(state): State<SharedState>,
) -> ApiResult<Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>>> {
    let snapshot = state.telemetry.list_live()?;
    let sub = state.hub.machine_parameters.subscribe(snapshot);
    Ok(sse_response(sub))
}

pub async fn single_machine_parameters_stream(
    State(state): State<SharedState>,
    Path(machine_id): Path<String>,
) -> ApiResult<Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>>> {
    let now = chrono::Utc::now().naive_utc();
    let snapshot = state.telemetry.get_live(&machine_id)?.unwrap_or_else(|| empty_snapshot(&machine_id, now));
    let topic = state.hub.machine_parameters_for(&machine_id);
    let sub = topic.subscribe(snapshot);
    Ok(sse_response(sub))
}

pub async fn parameter_history_stream(
    State(state): State<SharedState>,
    Path((machine_id, parameter_name)): Path<(String, String)>,
) -> ApiResult<Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>>> {
    let now = chrono::Utc::now().naive_utc();
    let window = state.telemetry.history_window(&machine_id, now, state.settings.history_window_minutes)?;
    let topic = state.hub.history_for(&machine_id, &parameter_name);
    let sub = topic.subscribe(window);
    Ok(sse_response(sub))
}

pub async fn shiftwise_energy_stream(
    State(state): State<SharedState>,
) -> ApiResult<Sse<impl futures::Stream<Item = Result<Event, std::convert::Infallible>>>> {
    let snapshot = state.telemetry.list_shiftwise_live()?;
    let sub = state.hub.shiftwise_energy.subscribe(snapshot);
    Ok(sse_response(sub))
}

fn empty_snapshot(machine_id: &str, now: NaiveDateTime) -> TelemetrySnapshot {
    TelemetrySnapshot {
        machine_id: machine_id.to_string(),
        timestamp: now,
        voltage: None,
        current: None,
        power_kw: None,
        op_mode: None,
        prog_status: None,
        part_count: None,
        job_status: None,
        extra: Default::default(),
    }
}

#[derive(Debug, Deserialize)]
pub struct HistoryRangeQuery {
    pub start_time: NaiveDateTime,
    pub end_time: NaiveDateTime,
}

#[derive(Debug, Serialize)]
pub struct ParameterStatistics {
    pub data_points: usize,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct HistoryRangeResponse {
    pub snapshots: Vec<TelemetrySnapshot>,
    pub statistics: ParameterStatistics,
}

fn numeric_value(snapshot: &TelemetrySnapshot, parameter_name: &str) -> Option<f64> {
    snapshot.numeric_fields().into_iter().find(|(name, _)| *name == parameter_name).and_then(|(_, v)| v)
}

pub async fn parameter_history_range(
    State(state): State<SharedState>,
    Path((machine_id, parameter_name)): Path<(String, String)>,
    Query(query): Query<HistoryRangeQuery>,
) -> ApiResult<Json<HistoryRangeResponse>> {
    if query.end_time < query.start_time {
        return Err(ApiError::InvariantViolation("end_time must not precede start_time".to_string()));
    }
    if (query.end_time - query.start_time).num_days() > MAX_HISTORY_RANGE_DAYS {
        return Err(ApiError::InvariantViolation(format!(
            "history range may not exceed {MAX_HISTORY_RANGE_DAYS} days"
        )));
    }

    let snapshots = state.telemetry.history_range(&machine_id, query.start_time, query.end_time)?;
    let values: Vec<f64> = snapshots.iter().filter_map(|s| numeric_value(s, &parameter_name)).collect();
    let statistics = ParameterStatistics {
        data_points: values.len(),
        min: values.iter().cloned().fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.min(v)))),
        max: values.iter().cloned().fold(None, |acc, v| Some(acc.map_or(v, |a: f64| a.max(v)))),
        avg: if values.is_empty() { None } else { Some(values.iter().sum::<f64>() / values.len() as f64) },
    };

    Ok(Json(HistoryRangeResponse { snapshots, statistics }))
}
