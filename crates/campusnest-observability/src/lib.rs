//! CampusNest Observability
//!
//! Provides configurable observability features including:
//! - Tracing and distributed tracing via OpenTelemetry
//! - Metrics collection via Prometheus
//! - HTTP request/response logging
//! - Import pipeline counters
//!
//! Everything can be compiled out by disabling the `observability` feature.
//! At runtime it is switched off with `OBSERVABILITY_ENABLED=false`, in which
//! case [`init_basic_console_logging`] provides console output only.
//!
//! # Examples
//!
//! ```no_run
//! use campusnest_observability::{init_tracing, shutdown_tracer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     init_tracing()?;
//!     // ... application code ...
//!     shutdown_tracer().await;
//!     Ok(())
//! }
//! ```

pub mod basic_logging;

#[cfg(feature = "observability")]
pub mod logging;
#[cfg(feature = "observability")]
pub mod metrics;

pub use basic_logging::{default_filter, init_basic_console_logging};

#[cfg(feature = "observability")]
pub use metrics_exporter_prometheus::PrometheusHandle;

#[cfg(feature = "observability")]
pub use logging::{init_tracing, is_observability_enabled, logging_middleware, shutdown_tracer};
#[cfg(feature = "observability")]
pub use metrics::{
    init_metrics, metrics_app, metrics_middleware, track_import_file, track_import_records,
    track_import_run,
};

// No-op stubs when observability is disabled
#[cfg(not(feature = "observability"))]
pub mod stubs {
    use axum::{extract::Request, middleware::Next, response::Response};

    /// No-op observability check when feature disabled
    pub fn is_observability_enabled() -> bool {
        false
    }

    /// Console logging only when feature disabled
    pub fn init_tracing() -> anyhow::Result<()> {
        super::init_basic_console_logging();
        Ok(())
    }

    pub async fn shutdown_tracer() {}

    pub async fn logging_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub async fn metrics_middleware(req: Request, next: Next) -> Response {
        next.run(req).await
    }

    pub fn init_metrics() -> Option<()> {
        None
    }

    pub fn metrics_app(_handle: ()) -> axum::Router {
        axum::Router::new()
    }

    pub fn track_import_file(_outcome: &str) {}
    pub fn track_import_records(_success: usize, _duplicates: usize, _errors: usize) {}
    pub fn track_import_run(_status: &str) {}
}

#[cfg(not(feature = "observability"))]
pub use stubs::*;
