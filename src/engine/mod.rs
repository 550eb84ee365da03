// ==========================================
// MES Core - engine layer
// ==========================================
// Business rules operating on catalog/status/downtime snapshots. No direct
// database access: engines are pure functions of their inputs (Design Notes,
// spec.md §9) plus the repositories they're handed for persistence of
// results.
// ==========================================

pub mod mttr_mtbf;
pub mod oee;
pub mod priority;
pub mod reporting;
pub mod reschedule;
pub mod scheduler;

pub use mttr_mtbf::{machine_performance, shop_performance, MachinePerformance, PerformanceReport};
pub use oee::{compute as compute_oee, OeeInputs, OeeResult};
pub use priority::{
    check_changeable, derive_scheduling_status, is_changeable, reindex, PartScheduleSpan,
    PriorityDetail, PriorityEngineError, ProjectPriority,
};
pub use reporting::{roll_up, ProductionRecord, RollUpBucket, RollUpPeriod, RollUpReport};
pub use reschedule::{RescheduleController, RescheduleOutcome};
pub use scheduler::{
    schedule, MachineAvailabilityInput, OperationInput, PartInput, PartScheduleResult,
    ScheduleInput, ScheduleRunReport,
};
