//! # CampusNest DB
//!
//! Database pool, migrations and the PostgreSQL [`StudentStore`] for the
//! CampusNest API.
//!
//! # Example
//!
//! ```ignore
//! use campusnest_config::DatabaseConfig;
//! use campusnest_db::{PgStudentStore, init_db_pool, run_migrations};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sqlx::Error> {
//!     let pool = init_db_pool(&DatabaseConfig::from_env().unwrap()).await?;
//!     run_migrations(&pool).await?;
//!     let store = PgStudentStore::new(pool);
//!     Ok(())
//! }
//! ```
//!
//! [`StudentStore`]: campusnest_import::StudentStore

pub mod students;

use campusnest_config::DatabaseConfig;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use tracing::info;

pub use sqlx::PgPool;
pub use students::PgStudentStore;

/// Creates the PostgreSQL connection pool.
///
/// The acquire timeout is the only bound on how long a store call may wait
/// for a connection.
pub async fn init_db_pool(config: &DatabaseConfig) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .connect(&config.url)
        .await?;

    info!(max_connections = config.max_connections, "Database pool ready");
    Ok(pool)
}

/// Applies the SQL migrations under `migrations/`.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
