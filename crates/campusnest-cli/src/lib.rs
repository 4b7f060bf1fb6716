//! # CampusNest CLI
//!
//! Sample data generation used by the CLI binary.
//!
//! ## Usage
//!
//! ```ignore
//! use campusnest_cli::generator::{GenerateConfig, generate_rows, write_csv};
//!
//! let rows = generate_rows(&GenerateConfig::new(1000));
//! write_csv("students.csv", &rows)?;
//! ```

pub mod generator;
