//! Ties the Telemetry Ingest repository, the four change detectors, and the
//! Broadcast Fabric together into one periodic tick, spec.md §4.4/§4.5:
//! "The detector loop pushes serialized events to every queue." Intended to
//! run as a single background `tokio::task` spawned once at server startup
//! (§5: each detector instance is owned exclusively by this task).

use std::collections::HashMap;

use chrono::NaiveDateTime;

use crate::broadcast::Hub;
use crate::config::Settings;
use crate::repository::TelemetryRepository;

use super::{HistoryWindowDetector, ParameterDetector, ShiftwiseDetector, StatusDetector};

pub struct DetectorRunner {
    status: StatusDetector,
    parameters: ParameterDetector,
    shiftwise: ShiftwiseDetector,
    history: HashMap<String, HistoryWindowDetector>,
    history_window_minutes: i64,
}

impl DetectorRunner {
    pub fn new(settings: &Settings) -> Self {
        Self {
            status: StatusDetector::new(settings.status_min_interval, settings.numeric_threshold),
            parameters: ParameterDetector::new(settings.numeric_threshold),
            shiftwise: ShiftwiseDetector::new(settings.shiftwise_min_interval, settings.energy_threshold),
            history: HashMap::new(),
            history_window_minutes: settings.history_window_minutes,
        }
    }

    /// Run one tick: read the current live state, diff it through every
    /// detector, and publish whatever came out significant.
    pub fn tick(&mut self, telemetry: &TelemetryRepository, hub: &Hub, now: NaiveDateTime) -> Result<(), crate::repository::RepositoryError> {
        let live = telemetry.list_live()?;

        let status_events = self.status.detect(&live, now);
        if !status_events.is_empty() {
            hub.machine_status.publish(status_events);
        }

        let parameter_events = self.parameters.detect(&live, now);
        if !parameter_events.is_empty() {
            for event in &parameter_events {
                hub.publish_machine_parameters(&event.machine_id, event.clone());
            }
            hub.machine_parameters.publish(parameter_events);
        }

        let shiftwise_live = telemetry.list_shiftwise_live()?;
        if let Some(events) = self.shiftwise.detect(&shiftwise_live, now) {
            hub.shiftwise_energy.publish(events);
        }

        for snapshot in &live {
            let detector = self.history.entry(snapshot.machine_id.clone()).or_default();
            let latest = telemetry.latest_history_timestamp(&snapshot.machine_id)?;
            if let Some(window) = detector.detect(latest, telemetry.history_window(&snapshot.machine_id, now, self.history_window_minutes)?) {
                hub.publish_history_all_parameters(&snapshot.machine_id, window);
            }
        }

        Ok(())
    }
}
