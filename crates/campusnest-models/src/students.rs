//! Student domain models produced by the import pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

use crate::value_types::IdNumber;

/// Lifecycle status of a student record in the CRM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ToSchema)]
pub enum StudentStatus {
    /// Newly imported, awaiting placement.
    #[default]
    Pending,
    Active,
    Inactive,
}

impl StudentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Active => "Active",
            Self::Inactive => "Inactive",
        }
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully-typed student ready for persistence.
///
/// Built only from CSV rows that passed validation. Optional strings are
/// trimmed and `None` when blank; optional numbers are `None` when absent or
/// unparseable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidatedStudent {
    /// Index of the source row in the uploaded file.
    pub row_index: usize,
    pub id_number: IdNumber,
    pub first_names: String,
    pub surname: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub institution: Option<String>,
    pub student_number: Option<String>,
    pub program: Option<String>,
    pub year_of_study: Option<u32>,
    pub funded: bool,
    pub funded_amount: Option<f64>,
    pub nsfas_number: Option<String>,
    pub status: StudentStatus,
}

impl ValidatedStudent {
    /// "First names Surname", as shown in import reports.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_names, self.surname)
            .trim()
            .to_string()
    }
}
