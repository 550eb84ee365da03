//! Production roll-up endpoints, spec.md §6
//! (`GET /production/{daily|weekly|monthly}`). Grounded on
//! `examples/original_source/app/api/v1/endpoints/daily_production.py`.

use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::engine::reporting::{roll_up, ProductionRecord, RollUpPeriod, RollUpReport};

use super::error::{ApiError, ApiResult};
use super::state::SharedState;

#[derive(Debug, Deserialize)]
pub struct RollUpQuery {
    pub start_epoch: i64,
    pub end_epoch: i64,
    pub part_number: Option<String>,
}

fn period_from_path(name: &str) -> ApiResult<RollUpPeriod> {
    match name {
        "daily" => Ok(RollUpPeriod::Daily),
        "weekly" => Ok(RollUpPeriod::Weekly),
        "monthly" => Ok(RollUpPeriod::Monthly),
        other => Err(ApiError::InvariantViolation(format!("unknown roll-up period '{other}'"))),
    }
}

pub async fn roll_up_report(
    State(state): State<SharedState>,
    Path(period): Path<String>,
    Query(query): Query<RollUpQuery>,
) -> ApiResult<Json<RollUpReport>> {
    let period = period_from_path(&period)?;
    let start = chrono::DateTime::from_timestamp(query.start_epoch, 0)
        .ok_or_else(|| ApiError::InvariantViolation("invalid start_epoch".to_string()))?
        .naive_utc();
    let end = chrono::DateTime::from_timestamp(query.end_epoch, 0)
        .ok_or_else(|| ApiError::InvariantViolation("invalid end_epoch".to_string()))?
        .naive_utc();

    let rows = state.schedule.active_versions_in_range(start, end)?;
    let orders = state.catalog.list_orders()?;
    let mut records = Vec::with_capacity(rows.len());
    for (psi, sv) in rows {
        let order = orders
            .iter()
            .find(|o| o.id == psi.order_id)
            .ok_or_else(|| ApiError::Internal(format!("psi {} references missing order", psi.id)))?
            .clone();

        if let Some(ref filter) = query.part_number {
            if &order.part_number != filter {
                continue;
            }
        }

        records.push(ProductionRecord {
            part_number: order.part_number,
            production_order: order.production_order,
            date: sv.planned_start.date(),
            planned_quantity: sv.planned_quantity,
            completed_quantity: sv.completed_quantity,
            remaining_quantity: sv.remaining_quantity,
        });
    }

    let start_date = naive_date(start);
    let end_date = naive_date(end);
    Ok(Json(roll_up(&records, period, start_date, end_date)))
}

fn naive_date(dt: NaiveDateTime) -> chrono::NaiveDate {
    dt.date()
}
