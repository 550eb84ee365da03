//! Route table, spec.md §6.

use axum::routing::{delete, get, post, put};
use axum::Router;

use super::state::SharedState;
use super::{energy, maintenance, planning, priority, production, reschedule};

pub fn build_router(state: SharedState) -> Router {
    Router::new()
        .route("/api/v1/planning/all_orders", get(planning::all_orders))
        .route("/api/v1/planning/search_order", get(planning::search_order))
        .route("/api/v1/planning/create_order", post(planning::create_order))
        .route("/api/v1/planning/update_order/:po", put(planning::update_order))
        .route("/api/v1/planning/operations/:order_id/:op_number", put(planning::update_operation))
        .route("/api/v1/planning/orders/:id", delete(planning::delete_order))
        .route("/api/v1/priority/details", get(priority::all_details))
        .route("/api/v1/priority/details/:part", get(priority::part_details))
        .route("/api/v1/priority/update", put(priority::update_priority))
        .route("/api/v1/priority/order/:id/priority", put(priority::update_order_priority))
        .route("/api/v1/production/:period", get(production::roll_up_report))
        .route("/api/v1/maintainance/downtimes/", post(maintenance::open_downtime))
        .route("/api/v1/maintainance/supervisor/downtimes/", get(maintenance::list_downtimes))
        .route(
            "/api/v1/maintainance/supervisor/downtimes/:id/acknowledge",
            put(maintenance::acknowledge_downtime),
        )
        .route("/api/v1/maintainance/supervisor/downtimes/:id/close", put(maintenance::close_downtime))
        .route("/api/v1/maintainance/reschedule", post(reschedule::admin_reschedule))
        .route("/api/v1/maintainance/metrics/machine-performance", get(maintenance::shop_machine_performance))
        .route(
            "/api/v1/maintainance/metrics/machine-performance/:id",
            get(maintenance::single_machine_performance),
        )
        .route("/api/v1/energy-monitoring/machine-status-stream", get(energy::machine_status_stream))
        .route("/api/v1/energy-monitoring/machine-parameters-stream", get(energy::machine_parameters_stream))
        .route(
            "/api/v1/energy-monitoring/machine/:id/parameters-stream",
            get(energy::single_machine_parameters_stream),
        )
        .route(
            "/api/v1/energy-monitoring/machine/:id/parameter/:name/history-stream",
            get(energy::parameter_history_stream),
        )
        .route(
            "/api/v1/energy-monitoring/machine/:id/parameter/:name/history",
            get(energy::parameter_history_range),
        )
        .route("/api/v1/energy-monitoring/shiftwise-energy-stream", get(energy::shiftwise_energy_stream))
        .with_state(state)
}
