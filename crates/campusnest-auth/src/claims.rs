//! JWT claim structures for access tokens.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Permission names checked by the import endpoints.
pub mod permissions {
    /// Upload student files and run imports.
    pub const STUDENTS_IMPORT: &str = "students:import";
}

/// JWT claims for access tokens.
///
/// # Fields
///
/// - `sub`: User ID (subject), recorded as `created_by` on imported students
/// - `email`: User's email address
/// - `permissions`: Permission strings granted to the user
/// - `exp`: Token expiration timestamp
/// - `iat`: Token issued-at timestamp
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Claims {
    /// User ID (subject claim)
    pub sub: String,
    /// User's email address
    pub email: String,
    /// Permission names granted to the user
    pub permissions: Vec<String>,
    /// Token expiration timestamp (Unix timestamp)
    pub exp: usize,
    /// Token issued-at timestamp (Unix timestamp)
    pub iat: usize,
}

impl Claims {
    /// The subject parsed as a UUID, if it is one.
    pub fn user_id(&self) -> Option<Uuid> {
        Uuid::parse_str(&self.sub).ok()
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}
