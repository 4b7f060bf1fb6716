use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter directive covering every CampusNest crate at `level`, with noisy
/// dependencies kept at warn.
pub fn default_filter(level: &str) -> String {
    [
        "campusnest",
        "campusnest_import",
        "campusnest_db",
        "campusnest_auth",
        "campusnest_observability",
        "campusnest_cli",
    ]
    .iter()
    .map(|target| format!("{}={}", target, level))
    .chain(
        ["tower_http=warn", "hyper=warn", "tonic=warn", "h2=warn", "sqlx=warn"]
            .iter()
            .map(|d| d.to_string()),
    )
    .collect::<Vec<_>>()
    .join(",")
}

/// Initialize basic console logging when observability is disabled.
///
/// - **Log Level**: `LOG_LEVEL` environment variable (default: "info"),
///   overridden entirely by `RUST_LOG`
/// - **Format**: Compact, with file and line numbers
pub fn init_basic_console_logging() {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(&log_level)));

    let console_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(true)
        .with_filter(env_filter);

    // try_init: tests and the CLI may initialize more than once
    let _ = tracing_subscriber::registry().with(console_layer).try_init();
}
