// ==========================================
// MES Core - HTTP server entrypoint
// ==========================================

use std::sync::Arc;

use mes_core::api::{build_router, AppState};
use mes_core::broadcast::Hub;
use mes_core::config::Settings;
use mes_core::db::{init_schema, open_sqlite_connection};
use mes_core::detect::DetectorRunner;
use mes_core::repository::{CatalogRepository, DowntimeRepository, ScheduleRepository, TelemetryRepository};
use std::sync::Mutex as StdMutex;
use tokio::sync::Mutex as AsyncMutex;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    mes_core::logging::init();

    let settings = Settings::from_env();
    tracing::info!(db_path = %settings.db_path, bind_addr = %settings.bind_addr, "starting mes-core");

    let conn = open_sqlite_connection(&settings.db_path)?;
    init_schema(&conn)?;
    let conn = Arc::new(StdMutex::new(conn));

    let hub = Hub::new(settings.subscriber_queue_capacity);

    let state = Arc::new(AppState {
        catalog: CatalogRepository::new(conn.clone()),
        schedule: ScheduleRepository::new(conn.clone()),
        downtime: DowntimeRepository::new(conn.clone()),
        telemetry: TelemetryRepository::new(conn.clone()),
        hub: hub.clone(),
        reschedule_lock: AsyncMutex::new(()),
        settings: settings.clone(),
    });

    spawn_detector_loop(state.clone());

    let router = build_router(state).layer(tower_http::trace::TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!(addr = %settings.bind_addr, "listening");
    axum::serve(listener, router).await?;

    Ok(())
}

/// Background tick loop driving the Change Detectors, spec.md §4.4/§4.5.
/// Runs on a fixed interval since the Telemetry Ingest is itself
/// poll-based (no push notification from the collector is assumed).
fn spawn_detector_loop(state: Arc<AppState>) {
    tokio::spawn(async move {
        let mut runner = DetectorRunner::new(&state.settings);
        let mut ticker = tokio::time::interval(std::time::Duration::from_millis(500));
        loop {
            ticker.tick().await;
            let now = chrono::Utc::now().naive_utc();
            if let Err(err) = runner.tick(&state.telemetry, &state.hub, now) {
                tracing::warn!(error = %err, "detector tick failed");
            }
        }
    });
}
