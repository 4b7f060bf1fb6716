//! # CampusNest Models
//!
//! Domain types shared by the import pipeline, the database layer and the
//! HTTP API.
//!
//! - [`ids`]: Strongly-typed UUID newtypes
//! - [`value_types`]: Validated primitives such as [`value_types::IdNumber`]
//! - [`students`]: The validated student record
//! - [`imports`]: Raw rows, validation errors, progress and results

pub mod ids;
pub mod imports;
pub mod students;
pub mod value_types;

pub use ids::{ImportSessionId, UserId};
pub use value_types::{IdNumber, ValueTypeError};
