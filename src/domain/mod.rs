// ==========================================
// MES Core - domain layer
// ==========================================
// Entities and value types from spec.md §3. No data access, no engine logic.
// ==========================================

pub mod catalog;
pub mod downtime;
pub mod schedule;
pub mod telemetry;
pub mod types;

pub use catalog::{
    Machine, MachineStatus, Operation, Order, PartScheduleStatus, Project, RawMaterial,
    WorkCenter,
};
pub use downtime::Downtime;
pub use schedule::{
    PlannedScheduleItem, ProductionLog, RescheduleRecord, ScheduleVersion, ScheduledSegment,
};
pub use telemetry::{ShiftwiseEnergy, TelemetrySnapshot};
pub use types::{
    ActivationStatus, DowntimeState, MachineState, RawMaterialStatus, RescheduleTrigger,
    SchedulingStatus, SegmentKind,
};
