//! The `Hub` is the single place that owns every broadcast topic, created
//! once at server startup and shared behind an `Arc` with the detector
//! loop and the API handlers (spec.md §9 Design Notes: "Global mutable
//! state... should become an explicit Hub value created at server
//! startup and passed to handlers via a request-scoped context").
//!
//! Five topic shapes, matching §4.5's stream list: two fixed global
//! topics (machine status, machine parameters), two dynamically-keyed
//! per-machine topics (single-machine parameters, single-machine
//! parameter history), and one fixed global topic (shiftwise energy).

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::detect::StatusEvent;
use crate::domain::{ShiftwiseEnergy, TelemetrySnapshot};

use super::Topic;

pub struct Hub {
    capacity: usize,
    pub machine_status: Arc<Topic<Vec<StatusEvent>>>,
    pub machine_parameters: Arc<Topic<Vec<TelemetrySnapshot>>>,
    pub shiftwise_energy: Arc<Topic<Vec<ShiftwiseEnergy>>>,
    per_machine_parameters: Mutex<HashMap<String, Arc<Topic<TelemetrySnapshot>>>>,
    per_machine_history: Mutex<HashMap<(String, String), Arc<Topic<Vec<TelemetrySnapshot>>>>>,
}

impl Hub {
    pub fn new(subscriber_queue_capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            capacity: subscriber_queue_capacity,
            machine_status: Topic::new(subscriber_queue_capacity),
            machine_parameters: Topic::new(subscriber_queue_capacity),
            shiftwise_energy: Topic::new(subscriber_queue_capacity),
            per_machine_parameters: Mutex::new(HashMap::new()),
            per_machine_history: Mutex::new(HashMap::new()),
        })
    }

    /// Gets or lazily creates the single-machine parameter stream topic.
    pub fn machine_parameters_for(&self, machine_id: &str) -> Arc<Topic<TelemetrySnapshot>> {
        let mut topics = self.per_machine_parameters.lock().unwrap();
        topics
            .entry(machine_id.to_string())
            .or_insert_with(|| Topic::new(self.capacity))
            .clone()
    }

    /// Gets or lazily creates the rolling-history stream topic for one
    /// machine/parameter pair (§4.4: "Per-machine parameter history").
    pub fn history_for(&self, machine_id: &str, parameter_name: &str) -> Arc<Topic<Vec<TelemetrySnapshot>>> {
        let key = (machine_id.to_string(), parameter_name.to_string());
        let mut topics = self.per_machine_history.lock().unwrap();
        topics.entry(key).or_insert_with(|| Topic::new(self.capacity)).clone()
    }

    /// Publishes a per-machine parameter snapshot only to subscribers of
    /// that specific machine's topic, if one has ever been created.
    pub fn publish_machine_parameters(&self, machine_id: &str, snapshot: TelemetrySnapshot) {
        let topics = self.per_machine_parameters.lock().unwrap();
        if let Some(topic) = topics.get(machine_id) {
            topic.publish(snapshot);
        }
    }

    pub fn publish_history(&self, machine_id: &str, parameter_name: &str, window: Vec<TelemetrySnapshot>) {
        let topics = self.per_machine_history.lock().unwrap();
        if let Some(topic) = topics.get(&(machine_id.to_string(), parameter_name.to_string())) {
            topic.publish(window);
        }
    }

    /// The history detector tracks one window per machine regardless of
    /// which named parameter a client is charting (§4.4: the whole window
    /// is re-emitted, not a per-field delta), so a new window fans out to
    /// every parameter-keyed topic open for that machine.
    pub fn publish_history_all_parameters(&self, machine_id: &str, window: Vec<TelemetrySnapshot>) {
        let topics = self.per_machine_history.lock().unwrap();
        for ((topic_machine_id, _), topic) in topics.iter() {
            if topic_machine_id == machine_id {
                topic.publish(window.clone());
            }
        }
    }
}
