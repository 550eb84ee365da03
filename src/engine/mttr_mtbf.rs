//! MTTR / MTBF computation, spec.md §4.6.
//!
//! Grounded on `examples/original_source/app/api/v1/endpoints/mttr_mtbf.py`'s
//! `get_machine_performance_metrics`. Per SPEC_FULL.md's Open Question
//! Decision #1: the original divides both shop-wide totals by one shared
//! `total_failures` counter, which conflates the repair-time sample count
//! (number of closed downtimes) with the between-failure sample count
//! (number of MTBF intervals) — the two are not generally equal. Here each
//! shop total is normalized by its own sample count.

use chrono::NaiveDateTime;

use crate::domain::Downtime;

#[derive(Debug, Clone, PartialEq)]
pub struct MachinePerformance {
    pub machine_id: String,
    pub mttr_hours: f64,
    pub mtbf_hours: f64,
    pub total_failures: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceReport {
    pub machines: Vec<MachinePerformance>,
    pub mttr_shop_hours: f64,
    pub mtbf_shop_hours: f64,
    pub total_failures: usize,
}

fn hours_between(a: NaiveDateTime, b: NaiveDateTime) -> f64 {
    (b - a).num_seconds() as f64 / 3600.0
}

/// Compute one machine's MTTR/MTBF from its downtime history, §4.6.
/// `downtimes` need not be sorted; `now` closes the trailing uptime interval
/// when the most recent downtime is closed.
pub fn machine_performance(machine_id: &str, downtimes: &[Downtime], now: NaiveDateTime) -> MachinePerformance {
    let mut records: Vec<&Downtime> = downtimes.iter().collect();
    records.sort_by_key(|d| d.open_at);

    let closed: Vec<&&Downtime> = records.iter().filter(|d| d.closed_at.is_some()).collect();
    let repair_times: Vec<f64> = closed
        .iter()
        .map(|d| hours_between(d.open_at, d.closed_at.unwrap()))
        .collect();
    let mttr_hours = if repair_times.is_empty() {
        0.0
    } else {
        repair_times.iter().sum::<f64>() / repair_times.len() as f64
    };

    let mut between_failure_times = Vec::new();
    for d in &closed {
        let closed_at = d.closed_at.unwrap();
        if let Some(next) = records.iter().find(|r| r.open_at > closed_at) {
            between_failure_times.push(hours_between(closed_at, next.open_at));
        }
    }
    if let Some(last) = records.last() {
        if let Some(last_closed_at) = last.closed_at {
            between_failure_times.push(hours_between(last_closed_at, now));
        }
    }
    let mtbf_hours = if between_failure_times.is_empty() {
        0.0
    } else {
        between_failure_times.iter().sum::<f64>() / between_failure_times.len() as f64
    };

    MachinePerformance {
        machine_id: machine_id.to_string(),
        mttr_hours: (mttr_hours * 100.0).round() / 100.0,
        mtbf_hours: (mtbf_hours * 100.0).round() / 100.0,
        total_failures: records.len(),
    }
}

/// Roll a set of per-machine downtime histories into a shop-wide report,
/// §4.6. Each machine's entry is independent; shop totals normalize MTTR and
/// MTBF by their own respective sample counts (see module docs).
pub fn shop_performance(
    by_machine: &[(String, Vec<Downtime>)],
    now: NaiveDateTime,
) -> PerformanceReport {
    let mut machines = Vec::with_capacity(by_machine.len());
    let mut total_repair_time = 0.0;
    let mut total_between_failures_time = 0.0;
    let mut repair_samples = 0usize;
    let mut between_failure_samples = 0usize;
    let mut total_failures = 0usize;

    for (machine_id, downtimes) in by_machine {
        let closed_count = downtimes.iter().filter(|d| d.closed_at.is_some()).count();
        let between_count = {
            let mut sorted: Vec<&Downtime> = downtimes.iter().collect();
            sorted.sort_by_key(|d| d.open_at);
            let mut count = 0usize;
            for d in sorted.iter().filter(|d| d.closed_at.is_some()) {
                let closed_at = d.closed_at.unwrap();
                if sorted.iter().any(|r| r.open_at > closed_at) {
                    count += 1;
                }
            }
            if let Some(last) = sorted.last() {
                if last.closed_at.is_some() {
                    count += 1;
                }
            }
            count
        };

        let perf = machine_performance(machine_id, downtimes, now);
        total_repair_time += perf.mttr_hours * closed_count as f64;
        total_between_failures_time += perf.mtbf_hours * between_count as f64;
        repair_samples += closed_count;
        between_failure_samples += between_count;
        total_failures += perf.total_failures;

        machines.push(perf);
    }

    let mttr_shop_hours = if repair_samples > 0 {
        total_repair_time / repair_samples as f64
    } else {
        0.0
    };
    let mtbf_shop_hours = if between_failure_samples > 0 {
        total_between_failures_time / between_failure_samples as f64
    } else {
        0.0
    };

    PerformanceReport {
        machines,
        mttr_shop_hours,
        mtbf_shop_hours,
        total_failures,
    }
}
