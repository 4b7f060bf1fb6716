use std::sync::Arc;

use anyhow::Context;
use campusnest::router::init_router;
use campusnest::state::AppState;
use campusnest_config::{CorsConfig, DatabaseConfig, ImportConfig, JwtConfig, ServerConfig};
use campusnest_db::{PgStudentStore, init_db_pool, run_migrations};
use campusnest_observability::{init_metrics, init_tracing, metrics_app, shutdown_tracer};
use dotenvy::dotenv;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing()?;

    let db_config = DatabaseConfig::from_env().context("DATABASE_URL must be set")?;
    let pool = init_db_pool(&db_config)
        .await
        .context("Failed to connect to database")?;
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let state = AppState::new(
        Arc::new(PgStudentStore::new(pool)),
        JwtConfig::from_env(),
        CorsConfig::from_env(),
        ImportConfig::from_env(),
    );
    state.imports.spawn_session_sweeper();

    let mut app = init_router(state);
    if let Some(handle) = init_metrics() {
        app = app.merge(metrics_app(handle));
    }

    let server_config = ServerConfig::from_env();
    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    info!(%address, "Server running");
    println!("🚀 Server running on http://{}", address);
    println!("📖 Scalar UI available at http://{}/scalar", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .context("Server error")?;

    shutdown_tracer().await;
    Ok(())
}
