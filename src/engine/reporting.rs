//! Production reporting roll-ups, spec.md §6
//! (`GET /production/{daily|weekly|monthly}`).
//!
//! Grounded on `examples/original_source/app/api/v1/endpoints/daily_production.py`:
//! `get_all_production_data` plus its daily/weekly/monthly grouping loops,
//! generalized into one [`roll_up`] parameterized by [`RollUpPeriod`] instead
//! of three near-duplicate handlers.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// One PSI/active-SV pair reduced to what a production report needs, joined
/// from `planned_schedule_item` + `order` + `schedule_version` by the
/// repository layer before being handed here.
#[derive(Debug, Clone)]
pub struct ProductionRecord {
    pub part_number: String,
    pub production_order: String,
    pub date: NaiveDate,
    pub planned_quantity: i32,
    pub completed_quantity: i32,
    pub remaining_quantity: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollUpPeriod {
    Daily,
    Weekly,
    Monthly,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollUpBucket {
    /// Start of the bucket: the day itself, the Monday of the week, or the
    /// 1st of the month.
    pub period_start: NaiveDate,
    pub part_number: String,
    pub production_order: String,
    pub planned_quantity: i32,
    pub completed_quantity: i32,
    pub remaining_quantity: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RollUpReport {
    pub buckets: Vec<RollUpBucket>,
    pub total_planned: BTreeMap<String, i32>,
    pub total_completed: BTreeMap<String, i32>,
}

fn bucket_start(date: NaiveDate, period: RollUpPeriod) -> NaiveDate {
    match period {
        RollUpPeriod::Daily => date,
        RollUpPeriod::Weekly => date - chrono::Duration::days(date.weekday().num_days_from_monday() as i64),
        RollUpPeriod::Monthly => NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap(),
    }
}

/// Group production records into period buckets per part, §6. Records
/// outside `[start, end]` (inclusive) are dropped; callers filtering by
/// `part_number` should do so before calling this.
pub fn roll_up(
    records: &[ProductionRecord],
    period: RollUpPeriod,
    start: NaiveDate,
    end: NaiveDate,
) -> RollUpReport {
    let mut grouped: BTreeMap<(NaiveDate, String), RollUpBucket> = BTreeMap::new();
    let mut total_planned: BTreeMap<String, i32> = BTreeMap::new();
    let mut total_completed: BTreeMap<String, i32> = BTreeMap::new();

    for record in records {
        if record.date < start || record.date > end {
            continue;
        }

        let key = (bucket_start(record.date, period), record.part_number.clone());
        let entry = grouped.entry(key.clone()).or_insert_with(|| RollUpBucket {
            period_start: key.0,
            part_number: record.part_number.clone(),
            production_order: record.production_order.clone(),
            planned_quantity: 0,
            completed_quantity: 0,
            remaining_quantity: 0,
        });
        entry.planned_quantity += record.planned_quantity;
        entry.completed_quantity += record.completed_quantity;
        entry.remaining_quantity += record.remaining_quantity;

        *total_planned.entry(record.part_number.clone()).or_insert(0) += record.planned_quantity;
        *total_completed.entry(record.part_number.clone()).or_insert(0) += record.completed_quantity;
    }

    let mut buckets: Vec<RollUpBucket> = grouped.into_values().collect();
    buckets.sort_by(|a, b| (a.period_start, &a.part_number).cmp(&(b.period_start, &b.part_number)));

    RollUpReport { buckets, total_planned, total_completed }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn daily_keeps_each_day_separate() {
        let records = vec![
            ProductionRecord {
                part_number: "P1".to_string(),
                production_order: "PO1".to_string(),
                date: d(2024, 3, 1),
                planned_quantity: 10,
                completed_quantity: 5,
                remaining_quantity: 5,
            },
            ProductionRecord {
                part_number: "P1".to_string(),
                production_order: "PO1".to_string(),
                date: d(2024, 3, 2),
                planned_quantity: 10,
                completed_quantity: 10,
                remaining_quantity: 0,
            },
        ];

        let report = roll_up(&records, RollUpPeriod::Daily, d(2024, 3, 1), d(2024, 3, 31));
        assert_eq!(report.buckets.len(), 2);
        assert_eq!(report.total_planned["P1"], 20);
        assert_eq!(report.total_completed["P1"], 15);
    }

    #[test]
    fn weekly_groups_by_monday() {
        let records = vec![
            ProductionRecord {
                part_number: "P1".to_string(),
                production_order: "PO1".to_string(),
                date: d(2024, 3, 4), // Monday
                planned_quantity: 5,
                completed_quantity: 5,
                remaining_quantity: 0,
            },
            ProductionRecord {
                part_number: "P1".to_string(),
                production_order: "PO1".to_string(),
                date: d(2024, 3, 6), // Wednesday, same week
                planned_quantity: 5,
                completed_quantity: 5,
                remaining_quantity: 0,
            },
        ];

        let report = roll_up(&records, RollUpPeriod::Weekly, d(2024, 3, 1), d(2024, 3, 31));
        assert_eq!(report.buckets.len(), 1);
        assert_eq!(report.buckets[0].period_start, d(2024, 3, 4));
        assert_eq!(report.buckets[0].planned_quantity, 10);
    }

    #[test]
    fn monthly_groups_by_first_of_month() {
        let records = vec![
            ProductionRecord {
                part_number: "P1".to_string(),
                production_order: "PO1".to_string(),
                date: d(2024, 3, 15),
                planned_quantity: 5,
                completed_quantity: 5,
                remaining_quantity: 0,
            },
            ProductionRecord {
                part_number: "P1".to_string(),
                production_order: "PO1".to_string(),
                date: d(2024, 3, 28),
                planned_quantity: 5,
                completed_quantity: 5,
                remaining_quantity: 0,
            },
        ];

        let report = roll_up(&records, RollUpPeriod::Monthly, d(2024, 3, 1), d(2024, 3, 31));
        assert_eq!(report.buckets.len(), 1);
        assert_eq!(report.buckets[0].period_start, d(2024, 3, 1));
    }

    #[test]
    fn records_outside_range_are_dropped() {
        let records = vec![ProductionRecord {
            part_number: "P1".to_string(),
            production_order: "PO1".to_string(),
            date: d(2024, 4, 1),
            planned_quantity: 5,
            completed_quantity: 5,
            remaining_quantity: 0,
        }];
        let report = roll_up(&records, RollUpPeriod::Daily, d(2024, 3, 1), d(2024, 3, 31));
        assert!(report.buckets.is_empty());
    }
}
