//! Downtime Log repository, §3/§4.3/§4.6/§6. Grounded on
//! `examples/original_source/app/api/v1/endpoints/mttr_mtbf.py`'s
//! create/acknowledge/close downtime handlers and the shared
//! `Arc<Mutex<Connection>>` repository shape.

use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use uuid::Uuid;

use crate::domain::Downtime;
use crate::repository::error::{RepositoryError, RepositoryResult};

pub struct DowntimeRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DowntimeRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn.lock().map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Open a new downtime for a machine, §6 `POST /maintainance/downtimes/`.
    /// Rejects with `Conflict` if the machine already has an open downtime,
    /// per SPEC_FULL.md's Supplemented Features section.
    pub fn open(
        &self,
        machine_id: &str,
        open_at: NaiveDateTime,
        priority: i32,
        reported_by: &str,
    ) -> RepositoryResult<Downtime> {
        let conn = self.get_conn()?;
        let already_open: Option<String> = conn
            .query_row(
                "SELECT id FROM downtime WHERE machine_id = ?1 AND closed_at IS NULL",
                params![machine_id],
                |row| row.get(0),
            )
            .optional()?;
        if already_open.is_some() {
            return Err(RepositoryError::Conflict(format!(
                "machine {} already has an open downtime",
                machine_id
            )));
        }

        let downtime = Downtime {
            id: Uuid::new_v4().to_string(),
            machine_id: machine_id.to_string(),
            open_at,
            in_progress_at: None,
            closed_at: None,
            action_taken: None,
            priority,
            reported_by: reported_by.to_string(),
        };
        conn.execute(
            "INSERT INTO downtime (id, machine_id, open_at, in_progress_at, closed_at, action_taken, priority, reported_by)
             VALUES (?1, ?2, ?3, NULL, NULL, NULL, ?4, ?5)",
            params![downtime.id, downtime.machine_id, downtime.open_at, downtime.priority, downtime.reported_by],
        )?;
        Ok(downtime)
    }

    /// Acknowledge: record `in_progress_at`, §6 supervisor acknowledge route.
    pub fn acknowledge(&self, id: &str, in_progress_at: NaiveDateTime) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE downtime SET in_progress_at = ?1 WHERE id = ?2 AND closed_at IS NULL",
            params![in_progress_at, id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound { entity: "downtime".to_string(), id: id.to_string() });
        }
        Ok(())
    }

    /// Close: record `closed_at` and the action taken, §4.3 trigger
    /// "closure of downtime (machine returns)".
    pub fn close(&self, id: &str, closed_at: NaiveDateTime, action_taken: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE downtime SET closed_at = ?1, action_taken = ?2 WHERE id = ?3 AND closed_at IS NULL",
            params![closed_at, action_taken, id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound { entity: "downtime".to_string(), id: id.to_string() });
        }
        Ok(())
    }

    pub fn list_for_machine(&self, machine_id: &str) -> RepositoryResult<Vec<Downtime>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, machine_id, open_at, in_progress_at, closed_at, action_taken, priority, reported_by
             FROM downtime WHERE machine_id = ?1 ORDER BY open_at ASC",
        )?;
        let rows = stmt.query_map(params![machine_id], Self::map_downtime)?.collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// All downtimes, grouped by machine, §4.6 shop-wide performance report.
    pub fn list_all_by_machine(&self) -> RepositoryResult<Vec<(String, Vec<Downtime>)>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, machine_id, open_at, in_progress_at, closed_at, action_taken, priority, reported_by
             FROM downtime ORDER BY machine_id ASC, open_at ASC",
        )?;
        let rows = stmt.query_map([], Self::map_downtime)?.collect::<SqliteResult<Vec<_>>>()?;

        let mut by_machine: Vec<(String, Vec<Downtime>)> = Vec::new();
        for downtime in rows {
            match by_machine.iter_mut().find(|(id, _)| *id == downtime.machine_id) {
                Some((_, list)) => list.push(downtime),
                None => by_machine.push((downtime.machine_id.clone(), vec![downtime])),
            }
        }
        Ok(by_machine)
    }

    pub fn list_open(&self) -> RepositoryResult<Vec<Downtime>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, machine_id, open_at, in_progress_at, closed_at, action_taken, priority, reported_by
             FROM downtime WHERE closed_at IS NULL ORDER BY priority ASC, open_at ASC",
        )?;
        let rows = stmt.query_map([], Self::map_downtime)?.collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn map_downtime(row: &rusqlite::Row) -> SqliteResult<Downtime> {
        Ok(Downtime {
            id: row.get(0)?,
            machine_id: row.get(1)?,
            open_at: row.get(2)?,
            in_progress_at: row.get(3)?,
            closed_at: row.get(4)?,
            action_taken: row.get(5)?,
            priority: row.get(6)?,
            reported_by: row.get(7)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_schema, open_sqlite_connection};
    use chrono::NaiveDate;

    fn test_repo() -> DowntimeRepository {
        let conn = open_sqlite_connection(":memory:").unwrap();
        init_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO work_center (id, code, is_schedulable) VALUES ('wc1','WC1',1)",
            [],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO machine (id, work_center_id, calibration_due) VALUES ('m1','wc1',NULL)",
            [],
        )
        .unwrap();
        DowntimeRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn dt(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    #[test]
    fn opening_second_downtime_while_one_open_conflicts() {
        let repo = test_repo();
        repo.open("m1", dt(2024, 1, 1, 9), 1, "operator").unwrap();
        let err = repo.open("m1", dt(2024, 1, 1, 10), 1, "operator").unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[test]
    fn close_then_reopen_succeeds() {
        let repo = test_repo();
        let d = repo.open("m1", dt(2024, 1, 1, 9), 1, "operator").unwrap();
        repo.close(&d.id, dt(2024, 1, 1, 11), "replaced fuse").unwrap();
        let reopened = repo.open("m1", dt(2024, 1, 2, 9), 1, "operator").unwrap();
        assert_ne!(d.id, reopened.id);
    }

    #[test]
    fn acknowledge_missing_is_not_found() {
        let repo = test_repo();
        let err = repo.acknowledge("missing", dt(2024, 1, 1, 9)).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn list_open_excludes_closed() {
        let repo = test_repo();
        let d = repo.open("m1", dt(2024, 1, 1, 9), 1, "operator").unwrap();
        repo.close(&d.id, dt(2024, 1, 1, 11), "fixed").unwrap();
        assert!(repo.list_open().unwrap().is_empty());
    }
}
