// ==========================================
// Logging initialization
// ==========================================
// Built on tracing + tracing-subscriber; level configured via RUST_LOG.
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber.
///
/// # Environment
/// - RUST_LOG: filter directive (default: info), e.g. `RUST_LOG=debug` or
///   `RUST_LOG=mes_core=trace`.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_line_number(true)
        .init();
}

/// Initialize a test-scoped subscriber (captured by the test harness writer).
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
