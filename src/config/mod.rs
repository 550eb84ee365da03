// ==========================================
// MES Core - runtime configuration
// ==========================================
// A plain value loaded once at startup from the environment, with defaults
// for every setting. No file-watching, no hot reload: restart to reconfigure.
// ==========================================

use chrono::NaiveTime;
use std::time::Duration;

/// Shift window and rate-limit/threshold knobs, §6 "Shift calendar" and §4.4.
#[derive(Debug, Clone)]
pub struct Settings {
    pub db_path: String,
    pub bind_addr: String,

    pub shift_start: NaiveTime,
    pub shift_end: NaiveTime,

    pub status_min_interval: Duration,
    pub shiftwise_min_interval: Duration,
    pub numeric_threshold: f64,
    pub energy_threshold: f64,
    pub history_window_minutes: i64,

    pub schedule_budget: Duration,
    pub subscriber_queue_capacity: usize,
}

impl Settings {
    /// Load from environment variables, falling back to defaults documented
    /// in SPEC_FULL.md's Configuration section.
    pub fn from_env() -> Self {
        Self {
            db_path: env_string("MES_DB_PATH", "./mes_core.db"),
            bind_addr: env_string("MES_BIND_ADDR", "0.0.0.0:8080"),
            shift_start: env_time("MES_SHIFT_START", 9, 0),
            shift_end: env_time("MES_SHIFT_END", 17, 0),
            status_min_interval: Duration::from_millis(env_u64("MES_STATUS_MIN_INTERVAL_MS", 1_000)),
            shiftwise_min_interval: Duration::from_millis(env_u64(
                "MES_SHIFTWISE_MIN_INTERVAL_MS",
                5_000,
            )),
            numeric_threshold: env_f64("MES_NUMERIC_THRESHOLD", 1e-4),
            energy_threshold: env_f64("MES_ENERGY_THRESHOLD", 1e-2),
            history_window_minutes: env_i64("MES_HISTORY_WINDOW_MINUTES", 30),
            schedule_budget: Duration::from_millis(env_u64("MES_SCHEDULE_BUDGET_MS", 5_000)),
            subscriber_queue_capacity: env_u64("MES_SUBSCRIBER_QUEUE_CAPACITY", 256) as usize,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_time(key: &str, default_hour: u32, default_min: u32) -> NaiveTime {
    std::env::var(key)
        .ok()
        .and_then(|v| NaiveTime::parse_from_str(&v, "%H:%M").ok())
        .unwrap_or_else(|| NaiveTime::from_hms_opt(default_hour, default_min, 0).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        std::env::remove_var("MES_SHIFT_START");
        std::env::remove_var("MES_SHIFT_END");
        let s = Settings::from_env();
        assert_eq!(s.shift_start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(s.shift_end, NaiveTime::from_hms_opt(17, 0, 0).unwrap());
        assert_eq!(s.numeric_threshold, 1e-4);
        assert_eq!(s.energy_threshold, 1e-2);
    }
}
