use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lazy_static::lazy_static;
use prometheus::{
    core::Collector, histogram_opts, HistogramVec, IntCounter, IntCounterVec, Registry,
};
use tracing::error;

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct DriverMetricsSnapshot {
    pub sessions_launched: u64,
    pub sessions_released: u64,
    pub launch_failures: u64,
    pub command_failures: u64,
}

static SESSIONS_LAUNCHED: AtomicU64 = AtomicU64::new(0);
static SESSIONS_RELEASED: AtomicU64 = AtomicU64::new(0);
static LAUNCH_FAILURES: AtomicU64 = AtomicU64::new(0);
static COMMAND_FAILURES: AtomicU64 = AtomicU64::new(0);

lazy_static! {
    static ref BROWSER_SESSIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("hrm_browser_sessions_total", "Browser sessions by lifecycle event"),
        &["event"]
    )
    .unwrap();
    static ref BROWSER_LAUNCH_DURATION: HistogramVec = HistogramVec::new(
        histogram_opts!(
            "hrm_browser_launch_duration_seconds",
            "Time to start a browser session",
            vec![0.25, 0.5, 1.0, 2.0, 5.0, 10.0, 20.0]
        ),
        &["backend"]
    )
    .unwrap();
    static ref DRIVER_COMMAND_FAILURES_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new(
            "hrm_driver_command_failures_total",
            "Driver commands that returned an error"
        ),
        &["command"]
    )
    .unwrap();
    static ref BROWSER_LAUNCH_FAILURES_TOTAL: IntCounter = IntCounter::new(
        "hrm_browser_launch_failures_total",
        "Browser sessions that failed to start"
    )
    .unwrap();
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register driver metric");
        }
    }
}

pub fn register_metrics(registry: &Registry) {
    register(registry, BROWSER_SESSIONS_TOTAL.clone());
    register(registry, BROWSER_LAUNCH_DURATION.clone());
    register(registry, DRIVER_COMMAND_FAILURES_TOTAL.clone());
    register(registry, BROWSER_LAUNCH_FAILURES_TOTAL.clone());
}

pub fn record_session_launched(backend: &str, duration: Duration) {
    SESSIONS_LAUNCHED.fetch_add(1, Ordering::Relaxed);
    BROWSER_SESSIONS_TOTAL.with_label_values(&["launched"]).inc();
    BROWSER_LAUNCH_DURATION
        .with_label_values(&[backend])
        .observe(duration.as_secs_f64());
}

pub fn record_session_released() {
    SESSIONS_RELEASED.fetch_add(1, Ordering::Relaxed);
    BROWSER_SESSIONS_TOTAL.with_label_values(&["released"]).inc();
}

pub fn record_launch_failure() {
    LAUNCH_FAILURES.fetch_add(1, Ordering::Relaxed);
    BROWSER_LAUNCH_FAILURES_TOTAL.inc();
}

pub fn record_command_failure(command: &str) {
    COMMAND_FAILURES.fetch_add(1, Ordering::Relaxed);
    DRIVER_COMMAND_FAILURES_TOTAL
        .with_label_values(&[command])
        .inc();
}

pub fn snapshot() -> DriverMetricsSnapshot {
    DriverMetricsSnapshot {
        sessions_launched: SESSIONS_LAUNCHED.load(Ordering::Relaxed),
        sessions_released: SESSIONS_RELEASED.load(Ordering::Relaxed),
        launch_failures: LAUNCH_FAILURES.load(Ordering::Relaxed),
        command_failures: COMMAND_FAILURES.load(Ordering::Relaxed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_only_grow() {
        let before = snapshot();
        record_session_launched("test", Duration::from_millis(20));
        record_session_released();
        record_launch_failure();
        record_command_failure("click");
        let after = snapshot();
        assert!(after.sessions_launched > before.sessions_launched);
        assert!(after.sessions_released > before.sessions_released);
        assert!(after.launch_failures > before.launch_failures);
        assert!(after.command_failures > before.command_failures);
    }

    #[test]
    fn registration_is_idempotent() {
        let registry = Registry::new();
        register_metrics(&registry);
        register_metrics(&registry);
        record_session_released();
        assert!(!registry.gather().is_empty());
    }
}
