//! Shared value types used across the domain layer.

use serde::{Deserialize, Serialize};

/// Effective machine state as reported by the Status Catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MachineState {
    On,
    Off,
    Idle,
}

impl MachineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineState::On => "ON",
            MachineState::Off => "OFF",
            MachineState::Idle => "IDLE",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ON" => Some(MachineState::On),
            "OFF" => Some(MachineState::Off),
            "IDLE" => Some(MachineState::Idle),
            _ => None,
        }
    }
}

/// Raw material availability, §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawMaterialStatus {
    Available,
    Reserved,
    Unavailable,
}

impl RawMaterialStatus {
    pub fn is_available(&self) -> bool {
        matches!(self, RawMaterialStatus::Available)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RawMaterialStatus::Available => "Available",
            RawMaterialStatus::Reserved => "Reserved",
            RawMaterialStatus::Unavailable => "Unavailable",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Available" => Some(RawMaterialStatus::Available),
            "Reserved" => Some(RawMaterialStatus::Reserved),
            "Unavailable" => Some(RawMaterialStatus::Unavailable),
            _ => None,
        }
    }
}

/// Part schedule activation flag, §3 PartScheduleStatus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivationStatus {
    Active,
    Inactive,
}

impl ActivationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivationStatus::Active => "active",
            ActivationStatus::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ActivationStatus::Active),
            "inactive" => Some(ActivationStatus::Inactive),
            _ => None,
        }
    }
}

/// Derived scheduling status shown on the priority board, §4.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SchedulingStatus {
    NotScheduled,
    ScheduledFuture,
    ScheduledTodaySoon,
    InProgress,
    PastDue,
    Completed,
}

impl SchedulingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchedulingStatus::NotScheduled => "Not Scheduled",
            SchedulingStatus::ScheduledFuture => "Scheduled Future",
            SchedulingStatus::ScheduledTodaySoon => "Scheduled Today/Soon",
            SchedulingStatus::InProgress => "In Progress",
            SchedulingStatus::PastDue => "Past Due",
            SchedulingStatus::Completed => "Completed",
        }
    }
}

/// Downtime lifecycle stage, §3 Downtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DowntimeState {
    Open,
    InProgress,
    Closed,
}

/// A segment's kind within a placed batch, §4.2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentKind {
    Setup,
    Process,
}

impl SegmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentKind::Setup => "Setup",
            SegmentKind::Process => "Process",
        }
    }
}

/// Trigger that caused a reschedule run, §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RescheduleTrigger {
    DowntimeOpened,
    DowntimeClosed,
    PriorityChanged,
    RawMaterialUnlocked,
    AdminRequest,
}

impl RescheduleTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            RescheduleTrigger::DowntimeOpened => "downtime_opened",
            RescheduleTrigger::DowntimeClosed => "downtime_closed",
            RescheduleTrigger::PriorityChanged => "priority_changed",
            RescheduleTrigger::RawMaterialUnlocked => "raw_material_unlocked",
            RescheduleTrigger::AdminRequest => "admin_request",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "downtime_opened" => Some(RescheduleTrigger::DowntimeOpened),
            "downtime_closed" => Some(RescheduleTrigger::DowntimeClosed),
            "priority_changed" => Some(RescheduleTrigger::PriorityChanged),
            "raw_material_unlocked" => Some(RescheduleTrigger::RawMaterialUnlocked),
            "admin_request" => Some(RescheduleTrigger::AdminRequest),
            _ => None,
        }
    }
}
