//! Planning endpoints, spec.md §6: order and operation CRUD over the
//! Catalog Store. Grounded on `examples/original_source/app/api/v1/endpoints/planning.py`'s
//! `get_all_orders`/`search_order`/`create_order`/`update_order`/
//! `update_operation`/`delete_order` handlers, minus the PDF OARC extraction
//! endpoint (spec.md's explicit Non-goal; superseded here by
//! [`crate::importer`]'s CSV bulk intake).

use axum::extract::{Path, State};
use axum::Json;

use crate::domain::{Operation, Order};

use super::error::{ApiError, ApiResult};
use super::state::SharedState;

pub async fn all_orders(State(state): State<SharedState>) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.catalog.list_orders()?))
}

pub async fn search_order(
    State(state): State<SharedState>,
    axum::extract::Query(params): axum::extract::Query<std::collections::HashMap<String, String>>,
) -> ApiResult<Json<Order>> {
    let part_number = params
        .get("part_number")
        .ok_or_else(|| ApiError::InvariantViolation("part_number query parameter is required".to_string()))?;
    state
        .catalog
        .find_order_by_part_number(part_number)?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("order for part {part_number} not found")))
}

pub async fn create_order(State(state): State<SharedState>, Json(order): Json<Order>) -> ApiResult<Json<Order>> {
    state.catalog.upsert_order(&order)?;
    Ok(Json(order))
}

pub async fn update_order(
    State(state): State<SharedState>,
    Path(production_order): Path<String>,
    Json(mut order): Json<Order>,
) -> ApiResult<Json<Order>> {
    let existing = state
        .catalog
        .find_order_by_production_order(&production_order)?
        .ok_or_else(|| ApiError::NotFound(format!("order {production_order} not found")))?;
    order.id = existing.id;
    order.production_order = production_order;
    state.catalog.upsert_order(&order)?;
    Ok(Json(order))
}

pub async fn update_operation(
    State(state): State<SharedState>,
    Path((order_id, op_number)): Path<(String, i32)>,
    Json(mut operation): Json<Operation>,
) -> ApiResult<Json<Operation>> {
    state
        .catalog
        .find_operation(&order_id, op_number)?
        .ok_or_else(|| ApiError::NotFound(format!("operation {op_number} of order {order_id} not found")))?;
    operation.order_id = order_id;
    operation.op_number = op_number;
    state.catalog.upsert_operation(&operation)?;
    Ok(Json(operation))
}

pub async fn delete_order(
    State(state): State<SharedState>,
    Path(order_id): Path<String>,
) -> ApiResult<axum::http::StatusCode> {
    state.catalog.delete_order(&order_id)?;
    Ok(axum::http::StatusCode::NO_CONTENT)
}
