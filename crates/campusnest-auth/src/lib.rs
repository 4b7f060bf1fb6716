//! # CampusNest Auth
//!
//! Access token claims and JWT verification for the CampusNest API.
//!
//! - [`claims`]: JWT claim structure and permission names
//! - [`jwt`]: Token creation and verification utilities

pub mod claims;
pub mod jwt;

// Re-export commonly used types at crate root
pub use claims::{Claims, permissions};
pub use jwt::{create_access_token, verify_token};
