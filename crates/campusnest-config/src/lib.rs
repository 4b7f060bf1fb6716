//! # CampusNest Config
//!
//! Configuration types for the CampusNest API, loaded from environment variables:
//!
//! - [`cors`]: CORS (Cross-Origin Resource Sharing) configuration
//! - [`database`]: PostgreSQL connection settings
//! - [`import`]: Student import pipeline limits
//! - [`jwt`]: JWT authentication configuration
//! - [`server`]: HTTP listener address
//!
//! # Example
//!
//! ```ignore
//! use campusnest_config::{CorsConfig, ImportConfig, JwtConfig};
//!
//! let jwt_config = JwtConfig::from_env();
//! let cors_config = CorsConfig::from_env();
//! let import_config = ImportConfig::from_env();
//! ```

pub mod cors;
pub mod database;
pub mod import;
pub mod jwt;
pub mod server;

// Re-export commonly used types at crate root
pub use cors::CorsConfig;
pub use database::DatabaseConfig;
pub use import::ImportConfig;
pub use jwt::JwtConfig;
pub use server::ServerConfig;
