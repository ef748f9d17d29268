use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use axum::{
    http::{header::CONTENT_TYPE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use cdp_adapter::metrics as cdp_metrics;
use hrm_core_types::WorkflowKind;
use lazy_static::lazy_static;
use once_cell::sync::{Lazy, OnceCell};
use prometheus::{
    core::Collector, histogram_opts, Encoder, HistogramVec, IntCounterVec, Registry, TextEncoder,
};
use tracing::error;

static GLOBAL_REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);
static REGISTER_ONCE: OnceCell<()> = OnceCell::new();

static WORKFLOWS_SUCCEEDED: AtomicU64 = AtomicU64::new(0);
static WORKFLOWS_FAILED: AtomicU64 = AtomicU64::new(0);

lazy_static! {
    static ref WORKFLOW_RUNS_TOTAL: IntCounterVec = IntCounterVec::new(
        prometheus::Opts::new("hrm_workflow_runs_total", "Workflow runs by outcome"),
        &["workflow", "outcome"]
    )
    .unwrap();
    static ref WORKFLOW_DURATION: HistogramVec = HistogramVec::new(
        histogram_opts!(
            "hrm_workflow_duration_seconds",
            "End-to-end workflow duration including browser start",
            vec![1.0, 2.5, 5.0, 10.0, 20.0, 40.0, 80.0, 160.0]
        ),
        &["workflow"]
    )
    .unwrap();
}

#[derive(Default, Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkflowMetricsSnapshot {
    pub succeeded: u64,
    pub failed: u64,
}

fn register<C>(registry: &Registry, collector: C)
where
    C: Collector + Clone + Send + Sync + 'static,
{
    if let Err(err) = registry.register(Box::new(collector.clone())) {
        if !matches!(err, prometheus::Error::AlreadyReg) {
            error!(?err, "failed to register workflow metric");
        }
    }
}

pub fn register_metrics() {
    REGISTER_ONCE.get_or_init(|| {
        let registry = global_registry();
        register(registry, WORKFLOW_RUNS_TOTAL.clone());
        register(registry, WORKFLOW_DURATION.clone());
        cdp_metrics::register_metrics(registry);
    });
}

/// `outcome` is the workflow outcome label (`success` or a failure class).
pub fn record_workflow(kind: WorkflowKind, outcome: &str, duration: Duration) {
    if outcome == "success" {
        WORKFLOWS_SUCCEEDED.fetch_add(1, Ordering::Relaxed);
    } else {
        WORKFLOWS_FAILED.fetch_add(1, Ordering::Relaxed);
    }
    WORKFLOW_RUNS_TOTAL
        .with_label_values(&[kind.as_str(), outcome])
        .inc();
    WORKFLOW_DURATION
        .with_label_values(&[kind.as_str()])
        .observe(duration.as_secs_f64());
}

pub fn snapshot() -> WorkflowMetricsSnapshot {
    WorkflowMetricsSnapshot {
        succeeded: WORKFLOWS_SUCCEEDED.load(Ordering::Relaxed),
        failed: WORKFLOWS_FAILED.load(Ordering::Relaxed),
    }
}

pub fn global_registry() -> &'static Registry {
    &GLOBAL_REGISTRY
}

pub async fn metrics_handler() -> Response {
    register_metrics();
    let encoder = TextEncoder::new();
    let metric_families = global_registry().gather();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&metric_families, &mut buffer) {
        error!(?err, "failed to encode prometheus metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, "metric encode error").into_response();
    }

    let body = match String::from_utf8(buffer) {
        Ok(body) => body,
        Err(err) => {
            error!(?err, "failed to convert prometheus metrics to utf8");
            return (StatusCode::INTERNAL_SERVER_ERROR, "metric encode error").into_response();
        }
    };
    match HeaderValue::from_str(encoder.format_type()) {
        Ok(value) => ([(CONTENT_TYPE, value)], body).into_response(),
        Err(err) => {
            error!(?err, "failed to build content-type header");
            (StatusCode::INTERNAL_SERVER_ERROR, "metric encode error").into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_split_success_from_failure() {
        let before = snapshot();
        record_workflow(WorkflowKind::CreateEmployee, "success", Duration::from_secs(3));
        record_workflow(WorkflowKind::CreateClaim, "not_found", Duration::from_secs(1));
        let after = snapshot();
        assert!(after.succeeded > before.succeeded);
        assert!(after.failed > before.failed);
    }

    #[test]
    fn registry_exposes_workflow_and_driver_families() {
        register_metrics();
        register_metrics();
        record_workflow(WorkflowKind::CreateEmployee, "success", Duration::from_millis(10));
        cdp_metrics::record_launch_failure();
        let names: Vec<String> = global_registry()
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        assert!(names.iter().any(|n| n == "hrm_workflow_runs_total"));
        assert!(names.iter().any(|n| n == "hrm_browser_launch_failures_total"));
    }
}
