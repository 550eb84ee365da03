//! Telemetry Ingest persistence, §3/§4.4 — the live-row-per-machine table
//! plus the append-only history, for both machine EMS snapshots and
//! shiftwise energy. Grounded on `examples/original_source/app/api/v1/endpoints/energymonitoring.py`'s
//! `MachineEMSLive`/`MachineEMSHistory`/`ShiftwiseEnergyLive`/`ShiftwiseEnergyHistory`
//! tables, collapsed to the shared `Arc<Mutex<Connection>>` repository shape
//! used throughout this layer.

use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};

use crate::domain::{ShiftwiseEnergy, TelemetrySnapshot};
use crate::repository::error::{RepositoryError, RepositoryResult};

pub struct TelemetryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TelemetryRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn.lock().map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// Ingest one machine's snapshot: upsert the live row, append to
    /// history, §4.4 "writes both a live-row-per-machine table and an
    /// append-only history". One transaction so a crash never leaves the
    /// live row and history out of step.
    pub fn ingest(&self, snapshot: &TelemetrySnapshot) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let extra = serde_json::to_string(&snapshot.extra).unwrap_or_else(|_| "{}".to_string());

        tx.execute(
            r#"INSERT INTO telemetry_snapshot_live
                   (machine_id, timestamp, voltage, current, power_kw, op_mode, prog_status, part_count, job_status, extra)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
               ON CONFLICT(machine_id) DO UPDATE SET
                   timestamp = excluded.timestamp, voltage = excluded.voltage, current = excluded.current,
                   power_kw = excluded.power_kw, op_mode = excluded.op_mode, prog_status = excluded.prog_status,
                   part_count = excluded.part_count, job_status = excluded.job_status, extra = excluded.extra"#,
            params![
                snapshot.machine_id,
                snapshot.timestamp,
                snapshot.voltage,
                snapshot.current,
                snapshot.power_kw,
                snapshot.op_mode,
                snapshot.prog_status,
                snapshot.part_count,
                snapshot.job_status,
                extra,
            ],
        )?;

        tx.execute(
            r#"INSERT INTO telemetry_snapshot_history
                   (machine_id, timestamp, voltage, current, power_kw, op_mode, prog_status, part_count, job_status, extra)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
               ON CONFLICT(machine_id, timestamp) DO NOTHING"#,
            params![
                snapshot.machine_id,
                snapshot.timestamp,
                snapshot.voltage,
                snapshot.current,
                snapshot.power_kw,
                snapshot.op_mode,
                snapshot.prog_status,
                snapshot.part_count,
                snapshot.job_status,
                extra,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    pub fn list_live(&self) -> RepositoryResult<Vec<TelemetrySnapshot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT machine_id, timestamp, voltage, current, power_kw, op_mode, prog_status, part_count, job_status, extra
             FROM telemetry_snapshot_live ORDER BY machine_id ASC",
        )?;
        let rows = stmt.query_map([], Self::map_snapshot)?.collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn get_live(&self, machine_id: &str) -> RepositoryResult<Option<TelemetrySnapshot>> {
        let conn = self.get_conn()?;
        conn.query_row(
            "SELECT machine_id, timestamp, voltage, current, power_kw, op_mode, prog_status, part_count, job_status, extra
             FROM telemetry_snapshot_live WHERE machine_id = ?1",
            params![machine_id],
            Self::map_snapshot,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn latest_history_timestamp(&self, machine_id: &str) -> RepositoryResult<Option<NaiveDateTime>> {
        let conn = self.get_conn()?;
        conn.query_row(
            "SELECT MAX(timestamp) FROM telemetry_snapshot_history WHERE machine_id = ?1",
            params![machine_id],
            |row| row.get(0),
        )
        .optional()
        .map(Option::flatten)
        .map_err(Into::into)
    }

    /// §4.4 per-machine rolling window: every history row for `machine_id`
    /// in `[end - window_minutes, end]`, ascending by timestamp.
    pub fn history_window(
        &self,
        machine_id: &str,
        end: NaiveDateTime,
        window_minutes: i64,
    ) -> RepositoryResult<Vec<TelemetrySnapshot>> {
        let start = end - chrono::Duration::minutes(window_minutes);
        self.history_range(machine_id, start, end)
    }

    /// §6 range query `GET .../history?start_time&end_time`. Callers are
    /// responsible for rejecting ranges over 7 days before calling this.
    pub fn history_range(
        &self,
        machine_id: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> RepositoryResult<Vec<TelemetrySnapshot>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT machine_id, timestamp, voltage, current, power_kw, op_mode, prog_status, part_count, job_status, extra
             FROM telemetry_snapshot_history
             WHERE machine_id = ?1 AND timestamp >= ?2 AND timestamp <= ?3
             ORDER BY timestamp ASC",
        )?;
        let rows = stmt
            .query_map(params![machine_id, start, end], Self::map_snapshot)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn machine_has_history(&self, machine_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM telemetry_snapshot_history WHERE machine_id = ?1)",
            params![machine_id],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    fn map_snapshot(row: &rusqlite::Row) -> SqliteResult<TelemetrySnapshot> {
        let extra_json: String = row.get(9)?;
        let extra = serde_json::from_str(&extra_json).unwrap_or_default();
        Ok(TelemetrySnapshot {
            machine_id: row.get(0)?,
            timestamp: row.get(1)?,
            voltage: row.get(2)?,
            current: row.get(3)?,
            power_kw: row.get(4)?,
            op_mode: row.get(5)?,
            prog_status: row.get(6)?,
            part_count: row.get(7)?,
            job_status: row.get(8)?,
            extra,
        })
    }

    // ---- Shiftwise energy ------------------------------------------------

    pub fn ingest_shiftwise(&self, energy: &ShiftwiseEnergy) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO shiftwise_energy_live (machine_id, timestamp, shift1, shift2, shift3, total)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               ON CONFLICT(machine_id) DO UPDATE SET
                   timestamp = excluded.timestamp, shift1 = excluded.shift1, shift2 = excluded.shift2,
                   shift3 = excluded.shift3, total = excluded.total"#,
            params![energy.machine_id, energy.timestamp, energy.shift1, energy.shift2, energy.shift3, energy.total],
        )?;

        tx.execute(
            r#"INSERT INTO shiftwise_energy_history (machine_id, timestamp, shift1, shift2, shift3, total)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               ON CONFLICT(machine_id, timestamp) DO NOTHING"#,
            params![energy.machine_id, energy.timestamp, energy.shift1, energy.shift2, energy.shift3, energy.total],
        )?;

        tx.commit()?;
        Ok(())
    }

    pub fn list_shiftwise_live(&self) -> RepositoryResult<Vec<ShiftwiseEnergy>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT machine_id, timestamp, shift1, shift2, shift3, total
             FROM shiftwise_energy_live ORDER BY machine_id ASC",
        )?;
        let rows = stmt.query_map([], Self::map_shiftwise)?.collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// §6 combined shiftwise history between two instants, aggregated per
    /// machine by the caller (the repository returns raw rows only).
    pub fn shiftwise_history_range(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> RepositoryResult<Vec<ShiftwiseEnergy>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT machine_id, timestamp, shift1, shift2, shift3, total
             FROM shiftwise_energy_history WHERE timestamp >= ?1 AND timestamp <= ?2
             ORDER BY machine_id ASC, timestamp ASC",
        )?;
        let rows = stmt.query_map(params![start, end], Self::map_shiftwise)?.collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn map_shiftwise(row: &rusqlite::Row) -> SqliteResult<ShiftwiseEnergy> {
        Ok(ShiftwiseEnergy {
            machine_id: row.get(0)?,
            timestamp: row.get(1)?,
            shift1: row.get(2)?,
            shift2: row.get(3)?,
            shift3: row.get(4)?,
            total: row.get(5)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_schema, open_sqlite_connection};
    use chrono::NaiveDate;

    fn test_repo() -> TelemetryRepository {
        let conn = open_sqlite_connection(":memory:").unwrap();
        init_schema(&conn).unwrap();
        TelemetryRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, mi, 0).unwrap()
    }

    fn snapshot(machine_id: &str, ts: NaiveDateTime, voltage: f64) -> TelemetrySnapshot {
        TelemetrySnapshot {
            machine_id: machine_id.to_string(),
            timestamp: ts,
            voltage: Some(voltage),
            current: Some(10.0),
            power_kw: Some(5.0),
            op_mode: Some("AUTO".to_string()),
            prog_status: Some("RUNNING".to_string()),
            part_count: Some(1),
            job_status: Some("JOB1".to_string()),
            extra: Default::default(),
        }
    }

    #[test]
    fn ingest_upserts_live_and_appends_history() {
        let repo = test_repo();
        repo.ingest(&snapshot("m1", dt(2024, 1, 1, 9, 0), 400.0)).unwrap();
        repo.ingest(&snapshot("m1", dt(2024, 1, 1, 9, 1), 401.0)).unwrap();

        let live = repo.get_live("m1").unwrap().unwrap();
        assert_eq!(live.voltage, Some(401.0));

        let history = repo.history_range("m1", dt(2024, 1, 1, 0, 0), dt(2024, 1, 2, 0, 0)).unwrap();
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn history_window_honors_window_minutes() {
        let repo = test_repo();
        repo.ingest(&snapshot("m1", dt(2024, 1, 1, 8, 0), 1.0)).unwrap();
        repo.ingest(&snapshot("m1", dt(2024, 1, 1, 9, 0), 2.0)).unwrap();

        let window = repo.history_window("m1", dt(2024, 1, 1, 9, 0), 30).unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(window[0].voltage, Some(2.0));
    }

    #[test]
    fn machine_has_history_reflects_ingested_rows() {
        let repo = test_repo();
        assert!(!repo.machine_has_history("m1").unwrap());
        repo.ingest(&snapshot("m1", dt(2024, 1, 1, 9, 0), 1.0)).unwrap();
        assert!(repo.machine_has_history("m1").unwrap());
    }
}
