// ==========================================
// MES Core - SQLite connection initialization and schema
// ==========================================
// Goals:
// - one PRAGMA setup shared by every connection (foreign keys, busy_timeout)
// - one schema definition, applied idempotently at startup
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// Default busy_timeout (ms).
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// Apply the connection-scoped PRAGMAs every connection needs.
///
/// foreign_keys and busy_timeout are per-connection settings in SQLite, so
/// this must run on every `Connection::open`, not just the first.
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// Open a connection with the shared PRAGMAs applied.
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// Create every table the core needs if it does not already exist. Run once
/// at startup against the shared connection; safe to call repeatedly.
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS project (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            priority INTEGER NOT NULL,
            delivery_date TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS raw_material (
            id TEXT PRIMARY KEY,
            part TEXT NOT NULL,
            qty REAL NOT NULL,
            unit TEXT NOT NULL,
            status TEXT NOT NULL,
            available_from TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS work_center (
            id TEXT PRIMARY KEY,
            code TEXT NOT NULL,
            is_schedulable INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS machine (
            id TEXT PRIMARY KEY,
            work_center_id TEXT NOT NULL REFERENCES work_center(id),
            calibration_due TEXT
        );

        CREATE TABLE IF NOT EXISTS machine_status (
            machine_id TEXT PRIMARY KEY REFERENCES machine(id),
            status TEXT NOT NULL,
            available_from TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS "order" (
            id TEXT PRIMARY KEY,
            production_order TEXT NOT NULL UNIQUE,
            part_number TEXT NOT NULL,
            required_qty INTEGER NOT NULL,
            launched_qty INTEGER NOT NULL,
            project_id TEXT NOT NULL REFERENCES project(id),
            raw_material_id TEXT NOT NULL REFERENCES raw_material(id),
            total_operations INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS operation (
            id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL REFERENCES "order"(id),
            op_number INTEGER NOT NULL,
            work_center_id TEXT NOT NULL REFERENCES work_center(id),
            machine_id TEXT NOT NULL REFERENCES machine(id),
            setup_time REAL NOT NULL,
            cycle_time REAL NOT NULL,
            UNIQUE(order_id, op_number)
        );

        CREATE TABLE IF NOT EXISTS part_schedule_status (
            part_number TEXT NOT NULL,
            production_order TEXT NOT NULL,
            status TEXT NOT NULL,
            PRIMARY KEY (part_number, production_order)
        );

        CREATE TABLE IF NOT EXISTS downtime (
            id TEXT PRIMARY KEY,
            machine_id TEXT NOT NULL REFERENCES machine(id),
            open_at TEXT NOT NULL,
            in_progress_at TEXT,
            closed_at TEXT,
            action_taken TEXT,
            priority INTEGER NOT NULL,
            reported_by TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS planned_schedule_item (
            id TEXT PRIMARY KEY,
            order_id TEXT NOT NULL REFERENCES "order"(id),
            operation_id TEXT NOT NULL REFERENCES operation(id),
            machine_id TEXT NOT NULL REFERENCES machine(id),
            total_quantity INTEGER NOT NULL,
            UNIQUE(operation_id)
        );

        CREATE TABLE IF NOT EXISTS schedule_version (
            id TEXT PRIMARY KEY,
            psi_id TEXT NOT NULL REFERENCES planned_schedule_item(id),
            version_no INTEGER NOT NULL,
            is_active INTEGER NOT NULL,
            planned_start TEXT NOT NULL,
            planned_end TEXT NOT NULL,
            planned_quantity INTEGER NOT NULL,
            completed_quantity INTEGER NOT NULL,
            remaining_quantity INTEGER NOT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(psi_id, version_no)
        );

        CREATE INDEX IF NOT EXISTS idx_sv_psi_active ON schedule_version(psi_id, is_active);

        CREATE TABLE IF NOT EXISTS production_log (
            id TEXT PRIMARY KEY,
            psi_id TEXT NOT NULL REFERENCES planned_schedule_item(id),
            sv_id TEXT NOT NULL REFERENCES schedule_version(id),
            operator TEXT NOT NULL,
            started_at TEXT NOT NULL,
            stopped_at TEXT,
            good_qty INTEGER NOT NULL,
            bad_qty INTEGER NOT NULL,
            reason_codes TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS reschedule_record (
            id TEXT PRIMARY KEY,
            trigger TEXT NOT NULL,
            triggered_by TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            predecessor_sv_ids TEXT NOT NULL DEFAULT '[]',
            successor_sv_ids TEXT NOT NULL DEFAULT '[]'
        );

        CREATE TABLE IF NOT EXISTS telemetry_snapshot_live (
            machine_id TEXT PRIMARY KEY,
            timestamp TEXT NOT NULL,
            voltage REAL,
            current REAL,
            power_kw REAL,
            op_mode TEXT,
            prog_status TEXT,
            part_count INTEGER,
            job_status TEXT,
            extra TEXT NOT NULL DEFAULT '{}'
        );

        CREATE TABLE IF NOT EXISTS telemetry_snapshot_history (
            machine_id TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            voltage REAL,
            current REAL,
            power_kw REAL,
            op_mode TEXT,
            prog_status TEXT,
            part_count INTEGER,
            job_status TEXT,
            extra TEXT NOT NULL DEFAULT '{}',
            PRIMARY KEY (machine_id, timestamp)
        );

        CREATE TABLE IF NOT EXISTS shiftwise_energy_live (
            machine_id TEXT PRIMARY KEY,
            timestamp TEXT NOT NULL,
            shift1 REAL NOT NULL,
            shift2 REAL NOT NULL,
            shift3 REAL NOT NULL,
            total REAL NOT NULL
        );

        CREATE TABLE IF NOT EXISTS shiftwise_energy_history (
            machine_id TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            shift1 REAL NOT NULL,
            shift2 REAL NOT NULL,
            shift3 REAL NOT NULL,
            total REAL NOT NULL,
            PRIMARY KEY (machine_id, timestamp)
        );
        "#,
    )
}
