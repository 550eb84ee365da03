//! Shared application state handed to every axum handler, spec.md §9 Design
//! Notes: "Global mutable state (the module-level detector instances and
//! the SSE connection registries)... should become an explicit context
//! value created at server startup."

use std::sync::Arc;

use tokio::sync::Mutex as AsyncMutex;

use crate::broadcast::Hub;
use crate::config::Settings;
use crate::repository::{CatalogRepository, DowntimeRepository, ScheduleRepository, TelemetryRepository};

pub struct AppState {
    pub settings: Settings,
    pub catalog: CatalogRepository,
    pub schedule: ScheduleRepository,
    pub downtime: DowntimeRepository,
    pub telemetry: TelemetryRepository,
    pub hub: Arc<Hub>,
    /// §5: "two scheduling runs never execute concurrently" — every
    /// reschedule run is serialized behind this lock.
    pub reschedule_lock: AsyncMutex<()>,
}

pub type SharedState = Arc<AppState>;
