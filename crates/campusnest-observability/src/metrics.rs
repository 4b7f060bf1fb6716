use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::{Duration, Instant};
use tracing::warn;

use crate::logging::is_observability_enabled;

const LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5, 10.0,
];

/// Initialize the Prometheus recorder with an upkeep task.
///
/// Returns `None` when observability is disabled or a recorder is already
/// installed.
pub fn init_metrics() -> Option<PrometheusHandle> {
    if !is_observability_enabled() {
        return None;
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )
        .and_then(|builder| builder.install_recorder())
        .map_err(|e| warn!(error = %e, "Prometheus recorder not installed"))
        .ok()?;

    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Some(handle)
}

/// Metrics middleware to track HTTP requests
pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let start = Instant::now();
    let method = req.method().as_str().to_owned();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| req.uri().path().to_owned());

    gauge!("http_requests_active").increment(1.0);

    let response = next.run(req).await;

    let latency = start.elapsed().as_secs_f64();
    let status = response.status().as_u16();

    counter!("http_requests_total", "method" => method.clone(), "path" => path.clone(), "status" => status.to_string()).increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => path).record(latency);

    gauge!("http_requests_active").decrement(1.0);

    response
}

/// Router serving the Prometheus snapshot at `/metrics`
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

/// Count an uploaded file by outcome (`accepted` or `rejected`).
pub fn track_import_file(outcome: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("student_import_files_total", "outcome" => outcome.to_string()).increment(1);
}

/// Count the records of one finished run by outcome.
pub fn track_import_records(success: usize, duplicates: usize, errors: usize) {
    if !is_observability_enabled() {
        return;
    }
    counter!("student_import_records_total", "outcome" => "success").increment(success as u64);
    counter!("student_import_records_total", "outcome" => "duplicate")
        .increment(duplicates as u64);
    counter!("student_import_records_total", "outcome" => "error").increment(errors as u64);
}

/// Count an import run by status (`completed` or `failed`).
pub fn track_import_run(status: &str) {
    if !is_observability_enabled() {
        return;
    }
    counter!("student_import_runs_total", "status" => status.to_string()).increment(1);
}
