//! Planned Schedule Item / Schedule Version repository, §3/§4.3/§5.
//!
//! Owns the one durable invariant the whole system leans on: "for a given
//! PSI, SV activation is a linearizable single-writer transition" (§5) — the
//! new SV is inserted and the prior flipped to inactive in one transaction.
//! Grounded on the teacher's `Arc<Mutex<Connection>>` repository shape and
//! its `conn.transaction()` usage elsewhere in the pack (estuary-flow,
//! fourthplaces-mntogether) for multi-statement atomic writes.

use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use uuid::Uuid;

use crate::domain::{PlannedScheduleItem, RescheduleRecord, RescheduleTrigger, ScheduleVersion};
use crate::repository::error::{RepositoryError, RepositoryResult};

pub struct ScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ScheduleRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn.lock().map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Find or create the PSI for one (order, operation, machine) triple.
    /// PSIs are created once per planned operation and never deleted; only
    /// their SVs change across reschedules.
    pub fn find_or_create_psi(
        &self,
        order_id: &str,
        operation_id: &str,
        machine_id: &str,
        total_quantity: i32,
    ) -> RepositoryResult<PlannedScheduleItem> {
        let conn = self.get_conn()?;
        let existing = conn
            .query_row(
                "SELECT id, order_id, operation_id, machine_id, total_quantity
                 FROM planned_schedule_item WHERE operation_id = ?1",
                params![operation_id],
                Self::map_psi,
            )
            .optional()?;

        if let Some(psi) = existing {
            return Ok(psi);
        }

        let psi = PlannedScheduleItem {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            operation_id: operation_id.to_string(),
            machine_id: machine_id.to_string(),
            total_quantity,
        };
        conn.execute(
            "INSERT INTO planned_schedule_item (id, order_id, operation_id, machine_id, total_quantity)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![psi.id, psi.order_id, psi.operation_id, psi.machine_id, psi.total_quantity],
        )?;
        Ok(psi)
    }

    fn map_psi(row: &rusqlite::Row) -> SqliteResult<PlannedScheduleItem> {
        Ok(PlannedScheduleItem {
            id: row.get(0)?,
            order_id: row.get(1)?,
            operation_id: row.get(2)?,
            machine_id: row.get(3)?,
            total_quantity: row.get(4)?,
        })
    }

    /// Activate a new SV for a PSI, archiving whatever SV was previously
    /// active, in one transaction (§5).
    pub fn activate_version(
        &self,
        psi_id: &str,
        planned_start: NaiveDateTime,
        planned_end: NaiveDateTime,
        planned_quantity: i32,
        created_at: NaiveDateTime,
    ) -> RepositoryResult<ScheduleVersion> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            "UPDATE schedule_version SET is_active = 0 WHERE psi_id = ?1 AND is_active = 1",
            params![psi_id],
        )?;

        let next_version_no: i32 = tx.query_row(
            "SELECT COALESCE(MAX(version_no), 0) + 1 FROM schedule_version WHERE psi_id = ?1",
            params![psi_id],
            |row| row.get(0),
        )?;

        let sv = ScheduleVersion {
            id: Uuid::new_v4().to_string(),
            psi_id: psi_id.to_string(),
            version_no: next_version_no,
            is_active: true,
            planned_start,
            planned_end,
            planned_quantity,
            completed_quantity: 0,
            remaining_quantity: planned_quantity,
            created_at,
        };

        tx.execute(
            "INSERT INTO schedule_version (id, psi_id, version_no, is_active, planned_start, planned_end,
                 planned_quantity, completed_quantity, remaining_quantity, created_at)
             VALUES (?1, ?2, ?3, 1, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                sv.id,
                sv.psi_id,
                sv.version_no,
                sv.planned_start,
                sv.planned_end,
                sv.planned_quantity,
                sv.completed_quantity,
                sv.remaining_quantity,
                sv.created_at,
            ],
        )?;

        tx.commit()?;
        Ok(sv)
    }

    pub fn find_active_version(&self, psi_id: &str) -> RepositoryResult<Option<ScheduleVersion>> {
        let conn = self.get_conn()?;
        conn.query_row(
            "SELECT id, psi_id, version_no, is_active, planned_start, planned_end,
                    planned_quantity, completed_quantity, remaining_quantity, created_at
             FROM schedule_version WHERE psi_id = ?1 AND is_active = 1",
            params![psi_id],
            Self::map_sv,
        )
        .optional()
        .map_err(Into::into)
    }

    /// All active SVs for every PSI belonging to an order, §4.1 status
    /// derivation ("find the earliest planned start / latest planned end
    /// across active SVs for this order").
    pub fn active_versions_for_order(&self, order_id: &str) -> RepositoryResult<Vec<ScheduleVersion>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT sv.id, sv.psi_id, sv.version_no, sv.is_active, sv.planned_start, sv.planned_end,
                    sv.planned_quantity, sv.completed_quantity, sv.remaining_quantity, sv.created_at
             FROM schedule_version sv
             JOIN planned_schedule_item psi ON psi.id = sv.psi_id
             WHERE psi.order_id = ?1 AND sv.is_active = 1",
        )?;
        let rows = stmt.query_map(params![order_id], Self::map_sv)?.collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// Active SVs for production reporting within a date range, §6
    /// `GET /production/{daily|weekly|monthly}`.
    pub fn active_versions_in_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> RepositoryResult<Vec<(PlannedScheduleItem, ScheduleVersion)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT psi.id, psi.order_id, psi.operation_id, psi.machine_id, psi.total_quantity,
                    sv.id, sv.psi_id, sv.version_no, sv.is_active, sv.planned_start, sv.planned_end,
                    sv.planned_quantity, sv.completed_quantity, sv.remaining_quantity, sv.created_at
             FROM planned_schedule_item psi
             JOIN schedule_version sv ON sv.psi_id = psi.id
             WHERE sv.is_active = 1 AND sv.planned_start >= ?1 AND sv.planned_start <= ?2",
        )?;
        let rows = stmt
            .query_map(params![start, end], |row| {
                let psi = PlannedScheduleItem {
                    id: row.get(0)?,
                    order_id: row.get(1)?,
                    operation_id: row.get(2)?,
                    machine_id: row.get(3)?,
                    total_quantity: row.get(4)?,
                };
                let sv = ScheduleVersion {
                    id: row.get(5)?,
                    psi_id: row.get(6)?,
                    version_no: row.get(7)?,
                    is_active: row.get(8)?,
                    planned_start: row.get(9)?,
                    planned_end: row.get(10)?,
                    planned_quantity: row.get(11)?,
                    completed_quantity: row.get(12)?,
                    remaining_quantity: row.get(13)?,
                    created_at: row.get(14)?,
                };
                Ok((psi, sv))
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// Apply a production count against the active SV, §6 production log
    /// recording. Clamps `remaining_quantity` at zero.
    pub fn record_completed_quantity(&self, sv_id: &str, additional_good: i32) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE schedule_version SET
                 completed_quantity = completed_quantity + ?1,
                 remaining_quantity = MAX(0, remaining_quantity - ?1)
             WHERE id = ?2",
            params![additional_good, sv_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound { entity: "schedule_version".to_string(), id: sv_id.to_string() });
        }
        Ok(())
    }

    /// Persist a reschedule run's audit trail, §4.3 "A reschedule record is
    /// stored capturing {trigger, by-whom, timestamp, predecessors,
    /// successors}".
    pub fn insert_reschedule_record(
        &self,
        trigger: RescheduleTrigger,
        triggered_by: &str,
        timestamp: NaiveDateTime,
        predecessor_sv_ids: &[String],
        successor_sv_ids: &[String],
    ) -> RepositoryResult<RescheduleRecord> {
        let conn = self.get_conn()?;
        let record = RescheduleRecord {
            id: Uuid::new_v4().to_string(),
            trigger,
            triggered_by: triggered_by.to_string(),
            timestamp,
            predecessor_sv_ids: predecessor_sv_ids.to_vec(),
            successor_sv_ids: successor_sv_ids.to_vec(),
        };
        let predecessors_json = serde_json::to_string(&record.predecessor_sv_ids).unwrap_or_else(|_| "[]".to_string());
        let successors_json = serde_json::to_string(&record.successor_sv_ids).unwrap_or_else(|_| "[]".to_string());
        conn.execute(
            "INSERT INTO reschedule_record (id, trigger, triggered_by, timestamp, predecessor_sv_ids, successor_sv_ids)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![record.id, record.trigger.as_str(), record.triggered_by, record.timestamp, predecessors_json, successors_json],
        )?;
        Ok(record)
    }

    /// Most recent reschedule records, newest first, for audit/debug display.
    pub fn list_recent_reschedule_records(&self, limit: i64) -> RepositoryResult<Vec<RescheduleRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, trigger, triggered_by, timestamp, predecessor_sv_ids, successor_sv_ids
             FROM reschedule_record ORDER BY timestamp DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], |row| {
                let trigger_str: String = row.get(1)?;
                let predecessors_json: String = row.get(4)?;
                let successors_json: String = row.get(5)?;
                Ok(RescheduleRecord {
                    id: row.get(0)?,
                    trigger: RescheduleTrigger::parse(&trigger_str).unwrap_or(RescheduleTrigger::AdminRequest),
                    triggered_by: row.get(2)?,
                    timestamp: row.get(3)?,
                    predecessor_sv_ids: serde_json::from_str(&predecessors_json).unwrap_or_default(),
                    successor_sv_ids: serde_json::from_str(&successors_json).unwrap_or_default(),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn map_sv(row: &rusqlite::Row) -> SqliteResult<ScheduleVersion> {
        Ok(ScheduleVersion {
            id: row.get(0)?,
            psi_id: row.get(1)?,
            version_no: row.get(2)?,
            is_active: row.get(3)?,
            planned_start: row.get(4)?,
            planned_end: row.get(5)?,
            planned_quantity: row.get(6)?,
            completed_quantity: row.get(7)?,
            remaining_quantity: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_schema, open_sqlite_connection};
    use chrono::NaiveDate;

    fn test_repo_with_order() -> (ScheduleRepository, String, String) {
        let conn = open_sqlite_connection(":memory:").unwrap();
        init_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO project (id, name, priority, delivery_date) VALUES ('p1','Proj',1,'2024-06-01 00:00:00');
            INSERT INTO raw_material (id, part, qty, unit, status, available_from) VALUES ('rm1','PT1',1,'kg','Available','2024-01-01 00:00:00');
            INSERT INTO "order" (id, production_order, part_number, required_qty, launched_qty, project_id, raw_material_id, total_operations)
                VALUES ('o1','PO1','PT1',10,0,'p1','rm1',1);
            INSERT INTO work_center (id, code, is_schedulable) VALUES ('wc1','WC1',1);
            INSERT INTO machine (id, work_center_id, calibration_due) VALUES ('m1','wc1',NULL);
            INSERT INTO operation (id, order_id, op_number, work_center_id, machine_id, setup_time, cycle_time)
                VALUES ('op1','o1',10,'wc1','m1',0.5,0.25);
            "#,
        )
        .unwrap();
        let repo = ScheduleRepository::new(Arc::new(Mutex::new(conn)));
        ("o1".to_string(), "op1".to_string());
        (repo, "o1".to_string(), "op1".to_string())
    }

    fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn find_or_create_psi_is_idempotent() {
        let (repo, order_id, op_id) = test_repo_with_order();
        let psi1 = repo.find_or_create_psi(&order_id, &op_id, "m1", 10).unwrap();
        let psi2 = repo.find_or_create_psi(&order_id, &op_id, "m1", 10).unwrap();
        assert_eq!(psi1.id, psi2.id);
    }

    #[test]
    fn activate_version_deactivates_previous() {
        let (repo, order_id, op_id) = test_repo_with_order();
        let psi = repo.find_or_create_psi(&order_id, &op_id, "m1", 10).unwrap();

        let sv1 = repo
            .activate_version(&psi.id, dt(2024, 1, 1, 9), dt(2024, 1, 1, 12), 10, dt(2024, 1, 1, 9))
            .unwrap();
        assert_eq!(sv1.version_no, 1);
        assert!(sv1.is_active);

        let sv2 = repo
            .activate_version(&psi.id, dt(2024, 1, 2, 9), dt(2024, 1, 2, 12), 10, dt(2024, 1, 2, 9))
            .unwrap();
        assert_eq!(sv2.version_no, 2);

        let active = repo.find_active_version(&psi.id).unwrap().unwrap();
        assert_eq!(active.id, sv2.id);
    }

    #[test]
    fn record_completed_quantity_clamps_remaining_at_zero() {
        let (repo, order_id, op_id) = test_repo_with_order();
        let psi = repo.find_or_create_psi(&order_id, &op_id, "m1", 10).unwrap();
        let sv = repo
            .activate_version(&psi.id, dt(2024, 1, 1, 9), dt(2024, 1, 1, 12), 10, dt(2024, 1, 1, 9))
            .unwrap();

        repo.record_completed_quantity(&sv.id, 15).unwrap();
        let active = repo.find_active_version(&psi.id).unwrap().unwrap();
        assert_eq!(active.completed_quantity, 15);
        assert_eq!(active.remaining_quantity, 0);
    }
}
