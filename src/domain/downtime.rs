//! Status Catalog & Downtime Log, §3/§4.6.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::types::DowntimeState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Downtime {
    pub id: String,
    pub machine_id: String,
    pub open_at: NaiveDateTime,
    pub in_progress_at: Option<NaiveDateTime>,
    pub closed_at: Option<NaiveDateTime>,
    pub action_taken: Option<String>,
    pub priority: i32,
    pub reported_by: String,
}

impl Downtime {
    pub fn state(&self) -> DowntimeState {
        if self.closed_at.is_some() {
            DowntimeState::Closed
        } else if self.in_progress_at.is_some() {
            DowntimeState::InProgress
        } else {
            DowntimeState::Open
        }
    }

    pub fn is_open(&self) -> bool {
        self.closed_at.is_none()
    }
}
