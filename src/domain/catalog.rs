//! Catalog Store entities, §3 — persistent master data consumed read-only by
//! the scheduler. Cyclic references from the source model (Machine knowing
//! its WorkCenter, WorkCenter knowing its Machines) collapse here to a single
//! owning direction: Machine and Operation hold the WorkCenter id, nothing
//! holds the reverse list.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::types::{ActivationStatus, MachineState, RawMaterialStatus};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub priority: i32,
    pub delivery_date: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub production_order: String,
    pub part_number: String,
    pub required_qty: i32,
    pub launched_qty: i32,
    pub project_id: String,
    pub raw_material_id: String,
    pub total_operations: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub id: String,
    pub order_id: String,
    pub op_number: i32,
    pub work_center_id: String,
    pub machine_id: String,
    /// Hours, per spec §3/§4.2.
    pub setup_time: f64,
    /// Hours per piece.
    pub cycle_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkCenter {
    pub id: String,
    pub code: String,
    pub is_schedulable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Machine {
    pub id: String,
    pub work_center_id: String,
    pub calibration_due: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMaterial {
    pub id: String,
    pub part: String,
    pub qty: f64,
    pub unit: String,
    pub status: RawMaterialStatus,
    pub available_from: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineStatus {
    pub machine_id: String,
    pub status: MachineState,
    pub available_from: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartScheduleStatus {
    pub part_number: String,
    pub production_order: String,
    pub status: ActivationStatus,
}
