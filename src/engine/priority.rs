//! The Priority Engine, spec.md §4.1.
//!
//! Grounded on `examples/original_source/app/api/v1/endpoints/priority_scheduling.py`:
//! `determine_scheduling_status` becomes [`derive_scheduling_status`] and the
//! ±1 shift-in-range reindex in `update_part_priority`/`update_order_priority`
//! becomes [`reindex`]. Both are pure functions here; the repository layer
//! owns the transaction that makes a reindex durable.

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::domain::SchedulingStatus;

/// A project's derived scheduling status and whether its priority may still
/// be changed, §4.1.
#[derive(Debug, Clone, PartialEq)]
pub struct PriorityDetail {
    pub part_number: String,
    pub current_priority: i32,
    pub planned_start: Option<NaiveDateTime>,
    pub planned_end: Option<NaiveDateTime>,
    pub status: SchedulingStatus,
    pub is_changeable: bool,
    pub reason: String,
    /// Days between a project's delivery date and the part's latest planned
    /// completion; negative means the part is due to finish after its
    /// delivery date. `None` when the part has no scheduled completion yet.
    /// Informational only, not used by any invariant.
    pub lead_time_difference_days: Option<i64>,
}

/// Port of `determine_scheduling_status`'s `lead_time_difference` field.
pub fn lead_time_difference_days(
    delivery_date: NaiveDateTime,
    latest_end: Option<NaiveDateTime>,
) -> Option<i64> {
    latest_end.map(|end| (delivery_date - end).num_days())
}

#[derive(Debug, Error, PartialEq)]
pub enum PriorityEngineError {
    #[error("priority cannot be changed: {0}")]
    NotChangeable(String),
}

/// Span of active schedule versions for one part, reduced to what the status
/// derivation needs: the earliest planned_start and latest planned_end
/// across all its active SVs, and whether every SV is complete.
#[derive(Debug, Clone)]
pub struct PartScheduleSpan {
    pub earliest_start: Option<NaiveDateTime>,
    pub latest_end: Option<NaiveDateTime>,
    pub total_versions: usize,
    pub completed_versions: usize,
}

/// Port of `determine_scheduling_status`, §4.1 "Status derivation".
pub fn derive_scheduling_status(
    span: &PartScheduleSpan,
    now: NaiveDateTime,
) -> (SchedulingStatus, bool, String) {
    if span.total_versions > 0 && span.completed_versions == span.total_versions {
        return (
            SchedulingStatus::Completed,
            false,
            "Part is already completed".to_string(),
        );
    }

    match (span.earliest_start, span.latest_end) {
        (Some(start), Some(end)) => {
            if end < now {
                (
                    SchedulingStatus::PastDue,
                    false,
                    "Part production window has passed".to_string(),
                )
            } else if start <= now && end > now {
                (
                    SchedulingStatus::InProgress,
                    true,
                    "Part is currently in production".to_string(),
                )
            } else if start > now {
                let days_until_start = (start - now).num_days();
                (
                    SchedulingStatus::ScheduledFuture,
                    true,
                    format!(
                        "Part is scheduled to start in the future ({} days)",
                        days_until_start
                    ),
                )
            } else {
                (
                    SchedulingStatus::ScheduledTodaySoon,
                    true,
                    "Part is scheduled to start soon".to_string(),
                )
            }
        }
        _ => (
            SchedulingStatus::NotScheduled,
            true,
            "Part is not yet scheduled".to_string(),
        ),
    }
}

/// Whether a priority derived as `is_changeable` by [`derive_scheduling_status`]
/// may in fact be edited. Kept as a thin named predicate so callers read
/// intent rather than poking at the tuple field directly.
pub fn is_changeable(status: SchedulingStatus) -> bool {
    !matches!(status, SchedulingStatus::Completed | SchedulingStatus::PastDue)
}

/// One project's id and priority, as carried by [`reindex`].
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectPriority {
    pub project_id: String,
    pub priority: i32,
}

/// Gap-free dense reindex, §4.1 "Reindex is dense and gap-free": moving a
/// project from `old_priority` to `new_priority` shifts every project
/// strictly between the two bounds by exactly one step, in the direction
/// that closes the gap left behind. Port of the `update_part_priority`
/// priority-shift loop.
///
/// `projects` need not be sorted; the project being moved is identified by
/// `moving_project_id` and excluded from the shift (its priority is set to
/// `new_priority` directly by the caller after this returns).
pub fn reindex(
    projects: &[ProjectPriority],
    moving_project_id: &str,
    old_priority: i32,
    new_priority: i32,
) -> Vec<ProjectPriority> {
    projects
        .iter()
        .map(|p| {
            if p.project_id == moving_project_id {
                return ProjectPriority {
                    project_id: p.project_id.clone(),
                    priority: new_priority,
                };
            }

            let mut priority = p.priority;
            if new_priority < old_priority {
                // Moving to a higher priority (lower number): everyone in
                // [new, old) shifts down the list by one.
                if new_priority <= p.priority && p.priority < old_priority {
                    priority += 1;
                }
            } else if new_priority > old_priority {
                // Moving to a lower priority (higher number): everyone in
                // (old, new] shifts up the list by one.
                if old_priority < p.priority && p.priority <= new_priority {
                    priority -= 1;
                }
            }

            ProjectPriority { project_id: p.project_id.clone(), priority }
        })
        .collect()
}

/// Validate a requested priority change against the current status, §4.1.
/// Returns `Ok(())` if the change may proceed, or the reason it may not.
pub fn check_changeable(status: SchedulingStatus, reason: &str) -> Result<(), PriorityEngineError> {
    if is_changeable(status) {
        Ok(())
    } else {
        Err(PriorityEngineError::NotChangeable(reason.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, mi, 0).unwrap()
    }

    #[test]
    fn not_scheduled_when_no_span() {
        let span = PartScheduleSpan { earliest_start: None, latest_end: None, total_versions: 0, completed_versions: 0 };
        let (status, changeable, _) = derive_scheduling_status(&span, dt(2024, 1, 1, 0, 0));
        assert_eq!(status, SchedulingStatus::NotScheduled);
        assert!(changeable);
    }

    #[test]
    fn completed_when_all_versions_done() {
        let span = PartScheduleSpan {
            earliest_start: Some(dt(2024, 1, 1, 9, 0)),
            latest_end: Some(dt(2024, 1, 1, 17, 0)),
            total_versions: 2,
            completed_versions: 2,
        };
        let (status, changeable, _) = derive_scheduling_status(&span, dt(2024, 1, 2, 0, 0));
        assert_eq!(status, SchedulingStatus::Completed);
        assert!(!changeable);
    }

    #[test]
    fn past_due_when_end_before_now_and_incomplete() {
        let span = PartScheduleSpan {
            earliest_start: Some(dt(2024, 1, 1, 9, 0)),
            latest_end: Some(dt(2024, 1, 1, 17, 0)),
            total_versions: 1,
            completed_versions: 0,
        };
        let (status, changeable, _) = derive_scheduling_status(&span, dt(2024, 1, 2, 0, 0));
        assert_eq!(status, SchedulingStatus::PastDue);
        assert!(!changeable);
    }

    #[test]
    fn in_progress_when_now_within_window() {
        let span = PartScheduleSpan {
            earliest_start: Some(dt(2024, 1, 1, 9, 0)),
            latest_end: Some(dt(2024, 1, 1, 17, 0)),
            total_versions: 1,
            completed_versions: 0,
        };
        let (status, changeable, _) = derive_scheduling_status(&span, dt(2024, 1, 1, 12, 0));
        assert_eq!(status, SchedulingStatus::InProgress);
        assert!(changeable);
    }

    #[test]
    fn scheduled_future_when_start_after_now() {
        let span = PartScheduleSpan {
            earliest_start: Some(dt(2024, 1, 5, 9, 0)),
            latest_end: Some(dt(2024, 1, 5, 17, 0)),
            total_versions: 1,
            completed_versions: 0,
        };
        let (status, _, reason) = derive_scheduling_status(&span, dt(2024, 1, 1, 9, 0));
        assert_eq!(status, SchedulingStatus::ScheduledFuture);
        assert!(reason.contains("4 days") || reason.contains("days"));
    }

    #[test]
    fn reindex_moving_to_higher_priority_shifts_others_down() {
        let projects = vec![
            ProjectPriority { project_id: "A".to_string(), priority: 1 },
            ProjectPriority { project_id: "B".to_string(), priority: 2 },
            ProjectPriority { project_id: "C".to_string(), priority: 3 },
            ProjectPriority { project_id: "D".to_string(), priority: 4 },
        ];
        // Move D from priority 4 to priority 2: B and C shift down to 3 and 4.
        let result = reindex(&projects, "D", 4, 2);
        let by_id = |id: &str| result.iter().find(|p| p.project_id == id).unwrap().priority;
        assert_eq!(by_id("A"), 1);
        assert_eq!(by_id("B"), 3);
        assert_eq!(by_id("C"), 4);
        assert_eq!(by_id("D"), 2);

        // Dense and gap-free: the resulting priority set is exactly {1,2,3,4}.
        let mut priorities: Vec<i32> = result.iter().map(|p| p.priority).collect();
        priorities.sort();
        assert_eq!(priorities, vec![1, 2, 3, 4]);
    }

    #[test]
    fn reindex_moving_to_lower_priority_shifts_others_up() {
        let projects = vec![
            ProjectPriority { project_id: "A".to_string(), priority: 1 },
            ProjectPriority { project_id: "B".to_string(), priority: 2 },
            ProjectPriority { project_id: "C".to_string(), priority: 3 },
            ProjectPriority { project_id: "D".to_string(), priority: 4 },
        ];
        // Move A from priority 1 to priority 3: B and C shift up to 1 and 2.
        let result = reindex(&projects, "A", 1, 3);
        let by_id = |id: &str| result.iter().find(|p| p.project_id == id).unwrap().priority;
        assert_eq!(by_id("A"), 3);
        assert_eq!(by_id("B"), 1);
        assert_eq!(by_id("C"), 2);
        assert_eq!(by_id("D"), 4);
    }

    #[test]
    fn reindex_no_op_when_priority_unchanged() {
        let projects = vec![
            ProjectPriority { project_id: "A".to_string(), priority: 1 },
            ProjectPriority { project_id: "B".to_string(), priority: 2 },
        ];
        let result = reindex(&projects, "A", 1, 1);
        assert_eq!(result, projects);
    }

    #[test]
    fn check_changeable_rejects_completed() {
        let err = check_changeable(SchedulingStatus::Completed, "done").unwrap_err();
        assert!(matches!(err, PriorityEngineError::NotChangeable(_)));
    }
}
