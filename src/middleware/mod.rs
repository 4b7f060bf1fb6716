//! Middleware modules for request processing.
//!
//! # Authentication Flow
//!
//! 1. Client sends request with `Authorization: Bearer <token>` header
//! 2. `AuthUser` extractor validates the JWT and extracts claims
//! 3. Permission extractors check if the user has required permissions
//! 4. Handler executes if all checks pass
//!
//! # Example
//!
//! ```ignore
//! use crate::middleware::auth::RequireStudentsImport;
//!
//! async fn run_import(
//!     RequireStudentsImport(auth_user): RequireStudentsImport,
//! ) -> impl IntoResponse {
//!     // Only executes if user has "students:import" permission
//! }
//! ```

pub mod auth;
