//! Bulk order/routing intake, spec.md §6. Grounded on
//! `examples/original_source/app/api/v1/endpoints/planning.py`'s
//! `create_order`/`create_operation` handlers and `extract_oarc_details`'s
//! PDF-scraped field set (Project Name, Part No, Required/Launched Qty,
//! Prod Order No, Operations[{Oprn, setup, cycle, work center, machine}],
//! Raw Materials) — reshaped here as one CSV row per operation, since
//! scraping a fixed-layout PDF form is explicitly out of scope (spec.md's
//! Non-goals) while importing a flat routing sheet is the idiomatic Rust
//! equivalent of the same "get existing master data into the system in
//! bulk" job.
//!
//! One CSV row describes one operation of one order; rows sharing a
//! `production_order` are grouped into a single [`Order`] plus its
//! [`Operation`]s, and the [`Project`] each order belongs to is upserted
//! once per unique `project_id`.

use std::collections::BTreeMap;
use std::io::Read;

use chrono::NaiveDateTime;
use serde::Deserialize;
use thiserror::Error;

use crate::domain::{Operation, Order, Project};
use crate::repository::{CatalogRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("csv parse error: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {message}")]
    InvalidRow { row: usize, message: String },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[derive(Debug, Deserialize)]
struct ImportRow {
    project_id: String,
    project_name: String,
    project_priority: i32,
    delivery_date: NaiveDateTime,
    production_order: String,
    part_number: String,
    required_qty: i32,
    launched_qty: i32,
    raw_material_id: String,
    op_number: i32,
    work_center_id: String,
    machine_id: String,
    setup_time: f64,
    cycle_time: f64,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub projects_upserted: usize,
    pub orders_upserted: usize,
    pub operations_upserted: usize,
}

/// Import a routing sheet: one CSV row per operation, header row required.
/// All rows are validated and grouped before any database write, so a
/// malformed row rejects the whole file rather than leaving a partial
/// import behind.
pub fn import_csv<R: Read>(reader: R, catalog: &CatalogRepository) -> Result<ImportReport, ImportError> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    let mut projects: BTreeMap<String, Project> = BTreeMap::new();
    let mut orders: BTreeMap<String, Order> = BTreeMap::new();
    let mut operations: Vec<Operation> = Vec::new();
    let mut order_op_counts: BTreeMap<String, i32> = BTreeMap::new();

    for (idx, result) in csv_reader.deserialize::<ImportRow>().enumerate() {
        let row = result?;
        let row_num = idx + 2; // header is row 1

        if row.required_qty < 0 || row.launched_qty < 0 {
            return Err(ImportError::InvalidRow {
                row: row_num,
                message: "required_qty and launched_qty must be non-negative".to_string(),
            });
        }

        projects.entry(row.project_id.clone()).or_insert_with(|| Project {
            id: row.project_id.clone(),
            name: row.project_name.clone(),
            priority: row.project_priority,
            delivery_date: row.delivery_date,
        });

        let order = orders.entry(row.production_order.clone()).or_insert_with(|| Order {
            id: row.production_order.clone(),
            production_order: row.production_order.clone(),
            part_number: row.part_number.clone(),
            required_qty: row.required_qty,
            launched_qty: row.launched_qty,
            project_id: row.project_id.clone(),
            raw_material_id: row.raw_material_id.clone(),
            total_operations: 0,
        });

        operations.push(Operation {
            id: format!("{}-{}", row.production_order, row.op_number),
            order_id: order.id.clone(),
            op_number: row.op_number,
            work_center_id: row.work_center_id,
            machine_id: row.machine_id,
            setup_time: row.setup_time,
            cycle_time: row.cycle_time,
        });
        *order_op_counts.entry(row.production_order.clone()).or_insert(0) += 1;
    }

    for (po, count) in &order_op_counts {
        if let Some(order) = orders.get_mut(po) {
            order.total_operations = *count;
        }
    }

    let mut report = ImportReport::default();
    for project in projects.values() {
        catalog.upsert_project(project)?;
        report.projects_upserted += 1;
    }
    for order in orders.values() {
        catalog.upsert_order(order)?;
        report.orders_upserted += 1;
    }
    for operation in &operations {
        catalog.upsert_operation(operation)?;
        report.operations_upserted += 1;
    }

    Ok(report)
}
