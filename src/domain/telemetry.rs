//! Telemetry Ingest data shapes, §3/§4.4.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One machine's current electrical/controller snapshot. Field set is a
/// fixed schema (rather than a free-form map) so change detection can name
/// fields explicitly; `extra` carries anything the collector sends beyond
/// the known EMS parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub machine_id: String,
    pub timestamp: NaiveDateTime,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub power_kw: Option<f64>,
    pub op_mode: Option<String>,
    pub prog_status: Option<String>,
    pub part_count: Option<i64>,
    pub job_status: Option<String>,
    #[serde(default)]
    pub extra: std::collections::BTreeMap<String, serde_json::Value>,
}

impl TelemetrySnapshot {
    /// Numeric fields compared with an absolute-threshold rule, in the order
    /// the reference Python tracker visits them.
    pub fn numeric_fields(&self) -> Vec<(&'static str, Option<f64>)> {
        vec![
            ("voltage", self.voltage),
            ("current", self.current),
            ("power_kw", self.power_kw),
            ("part_count", self.part_count.map(|v| v as f64)),
        ]
    }

    pub fn string_fields(&self) -> Vec<(&'static str, Option<&str>)> {
        vec![
            ("op_mode", self.op_mode.as_deref()),
            ("prog_status", self.prog_status.as_deref()),
            ("job_status", self.job_status.as_deref()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftwiseEnergy {
    pub machine_id: String,
    pub timestamp: NaiveDateTime,
    pub shift1: f64,
    pub shift2: f64,
    pub shift3: f64,
    pub total: f64,
}
