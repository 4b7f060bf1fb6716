//! # CampusNest Core
//!
//! Core error types shared by the CampusNest API crates.
//!
//! - [`errors`]: Application error type with HTTP response conversion
//!
//! # Example
//!
//! ```ignore
//! use campusnest_core::errors::AppError;
//!
//! let error = AppError::not_found(anyhow::anyhow!("Import session not found"));
//! ```

pub mod errors;

pub use errors::{AppError, ErrorResponse};
