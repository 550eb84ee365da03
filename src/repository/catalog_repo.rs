//! Catalog Store repository, §3 — projects, orders, operations, work
//! centers, machines, raw materials, and part schedule status. Grounded on
//! `examples/butianzheng-hot-rolling-finish-aps/src/repository/machine_config_repo.rs`'s
//! `Arc<Mutex<Connection>>` + `get_conn()` + query_row/query_map shape.

use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};

use crate::domain::{
    ActivationStatus, Machine, MachineState, MachineStatus, Operation, Order, PartScheduleStatus,
    Project, RawMaterial, RawMaterialStatus, WorkCenter,
};
use crate::repository::error::{RepositoryError, RepositoryResult};

pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn.lock().map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ---- Project ----------------------------------------------------

    pub fn upsert_project(&self, project: &Project) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO project (id, name, priority, delivery_date) VALUES (?1, ?2, ?3, ?4)
               ON CONFLICT(id) DO UPDATE SET name = excluded.name, priority = excluded.priority,
                   delivery_date = excluded.delivery_date"#,
            params![project.id, project.name, project.priority, project.delivery_date],
        )?;
        Ok(())
    }

    pub fn set_project_priority(&self, project_id: &str, priority: i32) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE project SET priority = ?1 WHERE id = ?2",
            params![priority, project_id],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound { entity: "project".to_string(), id: project_id.to_string() });
        }
        Ok(())
    }

    pub fn find_project(&self, id: &str) -> RepositoryResult<Option<Project>> {
        let conn = self.get_conn()?;
        conn.query_row(
            "SELECT id, name, priority, delivery_date FROM project WHERE id = ?1",
            params![id],
            Self::map_project,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_projects(&self) -> RepositoryResult<Vec<Project>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, name, priority, delivery_date FROM project ORDER BY priority ASC")?;
        let rows = stmt.query_map([], Self::map_project)?.collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn map_project(row: &rusqlite::Row) -> SqliteResult<Project> {
        Ok(Project {
            id: row.get(0)?,
            name: row.get(1)?,
            priority: row.get(2)?,
            delivery_date: row.get(3)?,
        })
    }

    // ---- Order --------------------------------------------------------

    pub fn upsert_order(&self, order: &Order) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO "order" (id, production_order, part_number, required_qty, launched_qty,
                   project_id, raw_material_id, total_operations)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
               ON CONFLICT(id) DO UPDATE SET production_order = excluded.production_order,
                   part_number = excluded.part_number, required_qty = excluded.required_qty,
                   launched_qty = excluded.launched_qty, project_id = excluded.project_id,
                   raw_material_id = excluded.raw_material_id, total_operations = excluded.total_operations"#,
            params![
                order.id,
                order.production_order,
                order.part_number,
                order.required_qty,
                order.launched_qty,
                order.project_id,
                order.raw_material_id,
                order.total_operations,
            ],
        )?;
        Ok(())
    }

    pub fn find_order_by_production_order(&self, po: &str) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;
        conn.query_row(
            r#"SELECT id, production_order, part_number, required_qty, launched_qty,
                      project_id, raw_material_id, total_operations
               FROM "order" WHERE production_order = ?1"#,
            params![po],
            Self::map_order,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn find_order_by_part_number(&self, part_number: &str) -> RepositoryResult<Option<Order>> {
        let conn = self.get_conn()?;
        conn.query_row(
            r#"SELECT id, production_order, part_number, required_qty, launched_qty,
                      project_id, raw_material_id, total_operations
               FROM "order" WHERE part_number = ?1"#,
            params![part_number],
            Self::map_order,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_orders(&self) -> RepositoryResult<Vec<Order>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"SELECT id, production_order, part_number, required_qty, launched_qty,
                      project_id, raw_material_id, total_operations
               FROM "order" ORDER BY production_order ASC"#,
        )?;
        let rows = stmt.query_map([], Self::map_order)?.collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn delete_order(&self, id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(r#"DELETE FROM "order" WHERE id = ?1"#, params![id])?;
        if affected == 0 {
            return Err(RepositoryError::NotFound { entity: "order".to_string(), id: id.to_string() });
        }
        Ok(())
    }

    fn map_order(row: &rusqlite::Row) -> SqliteResult<Order> {
        Ok(Order {
            id: row.get(0)?,
            production_order: row.get(1)?,
            part_number: row.get(2)?,
            required_qty: row.get(3)?,
            launched_qty: row.get(4)?,
            project_id: row.get(5)?,
            raw_material_id: row.get(6)?,
            total_operations: row.get(7)?,
        })
    }

    // ---- Operation ------------------------------------------------------

    pub fn upsert_operation(&self, op: &Operation) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO operation (id, order_id, op_number, work_center_id, machine_id,
                   setup_time, cycle_time)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
               ON CONFLICT(order_id, op_number) DO UPDATE SET
                   work_center_id = excluded.work_center_id, machine_id = excluded.machine_id,
                   setup_time = excluded.setup_time, cycle_time = excluded.cycle_time"#,
            params![op.id, op.order_id, op.op_number, op.work_center_id, op.machine_id, op.setup_time, op.cycle_time],
        )?;
        Ok(())
    }

    pub fn find_operation(&self, order_id: &str, op_number: i32) -> RepositoryResult<Option<Operation>> {
        let conn = self.get_conn()?;
        conn.query_row(
            "SELECT id, order_id, op_number, work_center_id, machine_id, setup_time, cycle_time
             FROM operation WHERE order_id = ?1 AND op_number = ?2",
            params![order_id, op_number],
            Self::map_operation,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_operations_for_order(&self, order_id: &str) -> RepositoryResult<Vec<Operation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, order_id, op_number, work_center_id, machine_id, setup_time, cycle_time
             FROM operation WHERE order_id = ?1 ORDER BY op_number ASC",
        )?;
        let rows = stmt.query_map(params![order_id], Self::map_operation)?.collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn map_operation(row: &rusqlite::Row) -> SqliteResult<Operation> {
        Ok(Operation {
            id: row.get(0)?,
            order_id: row.get(1)?,
            op_number: row.get(2)?,
            work_center_id: row.get(3)?,
            machine_id: row.get(4)?,
            setup_time: row.get(5)?,
            cycle_time: row.get(6)?,
        })
    }

    // ---- WorkCenter / Machine / MachineStatus ---------------------------

    pub fn upsert_work_center(&self, wc: &WorkCenter) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO work_center (id, code, is_schedulable) VALUES (?1, ?2, ?3)
               ON CONFLICT(id) DO UPDATE SET code = excluded.code, is_schedulable = excluded.is_schedulable"#,
            params![wc.id, wc.code, wc.is_schedulable],
        )?;
        Ok(())
    }

    pub fn find_work_center(&self, id: &str) -> RepositoryResult<Option<WorkCenter>> {
        let conn = self.get_conn()?;
        conn.query_row(
            "SELECT id, code, is_schedulable FROM work_center WHERE id = ?1",
            params![id],
            |row| Ok(WorkCenter { id: row.get(0)?, code: row.get(1)?, is_schedulable: row.get(2)? }),
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn upsert_machine(&self, machine: &Machine) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO machine (id, work_center_id, calibration_due) VALUES (?1, ?2, ?3)
               ON CONFLICT(id) DO UPDATE SET work_center_id = excluded.work_center_id,
                   calibration_due = excluded.calibration_due"#,
            params![machine.id, machine.work_center_id, machine.calibration_due],
        )?;
        Ok(())
    }

    pub fn list_machines(&self) -> RepositoryResult<Vec<Machine>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, work_center_id, calibration_due FROM machine ORDER BY id ASC")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(Machine { id: row.get(0)?, work_center_id: row.get(1)?, calibration_due: row.get(2)? })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    pub fn upsert_machine_status(&self, status: &MachineStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO machine_status (machine_id, status, available_from) VALUES (?1, ?2, ?3)
               ON CONFLICT(machine_id) DO UPDATE SET status = excluded.status,
                   available_from = excluded.available_from"#,
            params![status.machine_id, status.status.as_str(), status.available_from],
        )?;
        Ok(())
    }

    pub fn list_machine_statuses(&self) -> RepositoryResult<Vec<MachineStatus>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT machine_id, status, available_from FROM machine_status")?;
        let rows = stmt.query_map([], Self::map_machine_status)?.collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn map_machine_status(row: &rusqlite::Row) -> SqliteResult<MachineStatus> {
        let status_str: String = row.get(1)?;
        let status = MachineState::parse(&status_str).unwrap_or(MachineState::Off);
        Ok(MachineStatus { machine_id: row.get(0)?, status, available_from: row.get(2)? })
    }

    // ---- RawMaterial -----------------------------------------------------

    pub fn upsert_raw_material(&self, rm: &RawMaterial) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO raw_material (id, part, qty, unit, status, available_from)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)
               ON CONFLICT(id) DO UPDATE SET part = excluded.part, qty = excluded.qty,
                   unit = excluded.unit, status = excluded.status, available_from = excluded.available_from"#,
            params![rm.id, rm.part, rm.qty, rm.unit, rm.status.as_str(), rm.available_from],
        )?;
        Ok(())
    }

    pub fn find_raw_material(&self, id: &str) -> RepositoryResult<Option<RawMaterial>> {
        let conn = self.get_conn()?;
        conn.query_row(
            "SELECT id, part, qty, unit, status, available_from FROM raw_material WHERE id = ?1",
            params![id],
            Self::map_raw_material,
        )
        .optional()
        .map_err(Into::into)
    }

    fn map_raw_material(row: &rusqlite::Row) -> SqliteResult<RawMaterial> {
        let status_str: String = row.get(4)?;
        let status = RawMaterialStatus::parse(&status_str).unwrap_or(RawMaterialStatus::Unavailable);
        Ok(RawMaterial {
            id: row.get(0)?,
            part: row.get(1)?,
            qty: row.get(2)?,
            unit: row.get(3)?,
            status,
            available_from: row.get(5)?,
        })
    }

    // ---- PartScheduleStatus ----------------------------------------------

    pub fn upsert_part_schedule_status(&self, s: &PartScheduleStatus) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"INSERT INTO part_schedule_status (part_number, production_order, status)
               VALUES (?1, ?2, ?3)
               ON CONFLICT(part_number, production_order) DO UPDATE SET status = excluded.status"#,
            params![s.part_number, s.production_order, s.status.as_str()],
        )?;
        Ok(())
    }

    pub fn find_part_schedule_status(&self, part_number: &str) -> RepositoryResult<Option<PartScheduleStatus>> {
        let conn = self.get_conn()?;
        conn.query_row(
            "SELECT part_number, production_order, status FROM part_schedule_status WHERE part_number = ?1",
            params![part_number],
            Self::map_part_schedule_status,
        )
        .optional()
        .map_err(Into::into)
    }

    pub fn list_active_part_schedule_statuses(&self) -> RepositoryResult<Vec<PartScheduleStatus>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            "SELECT part_number, production_order, status FROM part_schedule_status WHERE status = 'active'",
        )?;
        let rows = stmt.query_map([], Self::map_part_schedule_status)?.collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn map_part_schedule_status(row: &rusqlite::Row) -> SqliteResult<PartScheduleStatus> {
        let status_str: String = row.get(2)?;
        let status = ActivationStatus::parse(&status_str).unwrap_or(ActivationStatus::Inactive);
        Ok(PartScheduleStatus { part_number: row.get(0)?, production_order: row.get(1)?, status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{init_schema, open_sqlite_connection};
    use chrono::NaiveDate;

    fn test_repo() -> CatalogRepository {
        let conn = open_sqlite_connection(":memory:").unwrap();
        init_schema(&conn).unwrap();
        CatalogRepository::new(Arc::new(Mutex::new(conn)))
    }

    fn dt(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    #[test]
    fn project_upsert_and_find_roundtrip() {
        let repo = test_repo();
        let project = Project { id: "p1".to_string(), name: "Proj".to_string(), priority: 1, delivery_date: dt(2024, 6, 1) };
        repo.upsert_project(&project).unwrap();
        let found = repo.find_project("p1").unwrap().unwrap();
        assert_eq!(found, project);
    }

    #[test]
    fn set_project_priority_missing_is_not_found() {
        let repo = test_repo();
        let err = repo.set_project_priority("missing", 1).unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[test]
    fn order_upsert_find_by_part_number() {
        let repo = test_repo();
        let project = Project { id: "p1".to_string(), name: "Proj".to_string(), priority: 1, delivery_date: dt(2024, 6, 1) };
        repo.upsert_project(&project).unwrap();
        let rm = RawMaterial {
            id: "rm1".to_string(),
            part: "PT1".to_string(),
            qty: 10.0,
            unit: "kg".to_string(),
            status: RawMaterialStatus::Available,
            available_from: dt(2024, 1, 1),
        };
        repo.upsert_raw_material(&rm).unwrap();

        let order = Order {
            id: "o1".to_string(),
            production_order: "PO1".to_string(),
            part_number: "PT1".to_string(),
            required_qty: 10,
            launched_qty: 0,
            project_id: "p1".to_string(),
            raw_material_id: "rm1".to_string(),
            total_operations: 2,
        };
        repo.upsert_order(&order).unwrap();

        let found = repo.find_order_by_part_number("PT1").unwrap().unwrap();
        assert_eq!(found, order);
    }

    #[test]
    fn machine_status_upsert_overwrites() {
        let repo = test_repo();
        let wc = WorkCenter { id: "wc1".to_string(), code: "WC1".to_string(), is_schedulable: true };
        repo.upsert_work_center(&wc).unwrap();
        let machine = Machine { id: "m1".to_string(), work_center_id: "wc1".to_string(), calibration_due: None };
        repo.upsert_machine(&machine).unwrap();

        let status1 = MachineStatus { machine_id: "m1".to_string(), status: MachineState::On, available_from: dt(2024, 1, 1) };
        repo.upsert_machine_status(&status1).unwrap();
        let status2 = MachineStatus { machine_id: "m1".to_string(), status: MachineState::Off, available_from: dt(2024, 1, 2) };
        repo.upsert_machine_status(&status2).unwrap();

        let statuses = repo.list_machine_statuses().unwrap();
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].status, MachineState::Off);
    }
}
