//! End-to-end: ingest telemetry, run one detector tick, and confirm the
//! Broadcast Fabric's topics receive the resulting events.

use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveDateTime};
use mes_core::broadcast::{BroadcastEvent, Hub};
use mes_core::config::Settings;
use mes_core::db::{init_schema, open_sqlite_connection};
use mes_core::detect::DetectorRunner;
use mes_core::domain::TelemetrySnapshot;
use mes_core::repository::TelemetryRepository;
use tempfile::NamedTempFile;

fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d).unwrap().and_hms_opt(h, mi, 0).unwrap()
}

fn snapshot(machine_id: &str, timestamp: NaiveDateTime, power_kw: f64, job_status: &str) -> TelemetrySnapshot {
    TelemetrySnapshot {
        machine_id: machine_id.to_string(),
        timestamp,
        voltage: Some(400.0),
        current: Some(12.0),
        power_kw: Some(power_kw),
        op_mode: Some("AUTO".to_string()),
        prog_status: Some("RUNNING".to_string()),
        part_count: Some(0),
        job_status: Some(job_status.to_string()),
        extra: Default::default(),
    }
}

#[tokio::test]
async fn a_significant_status_change_reaches_the_machine_status_topic() {
    let temp_file = NamedTempFile::new().unwrap();
    let conn = open_sqlite_connection(temp_file.path().to_str().unwrap()).unwrap();
    init_schema(&conn).unwrap();
    let conn = Arc::new(Mutex::new(conn));

    let telemetry = TelemetryRepository::new(conn.clone());
    let settings = Settings::default();
    let hub = Hub::new(settings.subscriber_queue_capacity);
    let mut runner = DetectorRunner::new(&settings);

    let t0 = dt(2024, 1, 1, 9, 0);
    telemetry.ingest(&snapshot("m1", t0, 10.0, "RUNNING")).unwrap();
    runner.tick(&telemetry, &hub, t0).unwrap();

    let handle = hub.machine_status.subscribe(vec![]);
    let snapshot_event = handle.recv().await;
    assert!(matches!(snapshot_event, BroadcastEvent::Snapshot(_)));

    let t1 = dt(2024, 1, 1, 9, 1);
    telemetry.ingest(&snapshot("m1", t1, 10.0, "STOPPED")).unwrap();
    runner.tick(&telemetry, &hub, t1).unwrap();

    match handle.recv().await {
        BroadcastEvent::Update(events) => {
            assert_eq!(events.len(), 1);
            assert_eq!(events[0].status, "STOPPED");
        }
        other => panic!("expected an Update carrying the status change, got {other:?}"),
    }
}

#[tokio::test]
async fn per_machine_parameter_topic_only_sees_its_own_machine() {
    let temp_file = NamedTempFile::new().unwrap();
    let conn = open_sqlite_connection(temp_file.path().to_str().unwrap()).unwrap();
    init_schema(&conn).unwrap();
    let conn = Arc::new(Mutex::new(conn));

    let telemetry = TelemetryRepository::new(conn.clone());
    let settings = Settings::default();
    let hub = Hub::new(settings.subscriber_queue_capacity);
    let mut runner = DetectorRunner::new(&settings);

    let t0 = dt(2024, 1, 1, 9, 0);
    telemetry.ingest(&snapshot("m1", t0, 10.0, "RUNNING")).unwrap();
    telemetry.ingest(&snapshot("m2", t0, 20.0, "RUNNING")).unwrap();
    runner.tick(&telemetry, &hub, t0).unwrap();

    let m1_topic = hub.machine_parameters_for("m1");
    let handle = m1_topic.subscribe(snapshot("m1", t0, 10.0, "RUNNING"));

    let t1 = dt(2024, 1, 1, 9, 1);
    telemetry.ingest(&snapshot("m1", t1, 50.0, "RUNNING")).unwrap();
    telemetry.ingest(&snapshot("m2", t1, 90.0, "RUNNING")).unwrap();
    runner.tick(&telemetry, &hub, t1).unwrap();

    let _ = handle.recv().await;
    match handle.recv().await {
        BroadcastEvent::Update(snap) => assert_eq!(snap.machine_id, "m1"),
        other => panic!("expected m1's own update, got {other:?}"),
    }
}
