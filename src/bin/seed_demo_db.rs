//! Seeds a fresh SQLite database with a small demo catalog: one project, two
//! orders each with a two-op routing, two work centers, two machines, and
//! an initial machine-status row for each. Run with `MES_DB_PATH` pointing
//! at a scratch file, e.g. `MES_DB_PATH=./demo.db cargo run --bin seed_demo_db`.

use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use mes_core::config::Settings;
use mes_core::db::{init_schema, open_sqlite_connection};
use mes_core::domain::{
    ActivationStatus, Machine, MachineState, MachineStatus, Operation, Order, PartScheduleStatus, Project, RawMaterial,
    RawMaterialStatus, WorkCenter,
};
use mes_core::repository::CatalogRepository;

fn main() -> anyhow::Result<()> {
    mes_core::logging::init();
    let settings = Settings::from_env();

    let conn = open_sqlite_connection(&settings.db_path)?;
    init_schema(&conn)?;
    let catalog = CatalogRepository::new(Arc::new(Mutex::new(conn)));

    let delivery_date = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    let available_from = NaiveDate::from_ymd_opt(2026, 7, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();

    let project = Project { id: "proj-1".to_string(), name: "Demo Production Line".to_string(), priority: 1, delivery_date };
    catalog.upsert_project(&project)?;

    catalog.upsert_work_center(&WorkCenter { id: "wc-cut".to_string(), code: "CUT".to_string(), is_schedulable: true })?;
    catalog.upsert_work_center(&WorkCenter { id: "wc-mill".to_string(), code: "MILL".to_string(), is_schedulable: true })?;

    catalog.upsert_machine(&Machine { id: "m-cut-1".to_string(), work_center_id: "wc-cut".to_string(), calibration_due: None })?;
    catalog.upsert_machine(&Machine { id: "m-mill-1".to_string(), work_center_id: "wc-mill".to_string(), calibration_due: None })?;

    for machine_id in ["m-cut-1", "m-mill-1"] {
        catalog.upsert_machine_status(&MachineStatus {
            machine_id: machine_id.to_string(),
            status: MachineState::Idle,
            available_from,
        })?;
    }

    for (i, part) in ["PART-A", "PART-B"].into_iter().enumerate() {
        let production_order = format!("PO-{}", 100 + i);
        let raw_material_id = format!("rm-{}", i + 1);
        catalog.upsert_raw_material(&RawMaterial {
            id: raw_material_id.clone(),
            part: part.to_string(),
            qty: 500.0,
            unit: "kg".to_string(),
            status: RawMaterialStatus::Available,
            available_from,
        })?;

        let order = Order {
            id: production_order.clone(),
            production_order: production_order.clone(),
            part_number: part.to_string(),
            required_qty: 100,
            launched_qty: 0,
            project_id: project.id.clone(),
            raw_material_id,
            total_operations: 2,
        };
        catalog.upsert_order(&order)?;

        catalog.upsert_operation(&Operation {
            id: format!("{production_order}-10"),
            order_id: order.id.clone(),
            op_number: 10,
            work_center_id: "wc-cut".to_string(),
            machine_id: "m-cut-1".to_string(),
            setup_time: 0.5,
            cycle_time: 0.05,
        })?;
        catalog.upsert_operation(&Operation {
            id: format!("{production_order}-20"),
            order_id: order.id.clone(),
            op_number: 20,
            work_center_id: "wc-mill".to_string(),
            machine_id: "m-mill-1".to_string(),
            setup_time: 0.25,
            cycle_time: 0.1,
        })?;

        catalog.upsert_part_schedule_status(&PartScheduleStatus {
            part_number: part.to_string(),
            production_order,
            status: ActivationStatus::Active,
        })?;
    }

    tracing::info!(db_path = %settings.db_path, "demo database seeded");
    Ok(())
}
