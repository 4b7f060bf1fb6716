use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;

use crate::ids::{ImportSessionId, UserId};
use crate::value_types::IdNumber;

/// A column of the student import CSV.
///
/// Serializes as its header name (`idNumber`, `firstNames`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum StudentColumn {
    IdNumber,
    FirstNames,
    Surname,
    Email,
    PhoneNumber,
    Institution,
    StudentNumber,
    Program,
    YearOfStudy,
    Funded,
    FundedAmount,
    NsfasNumber,
}

impl StudentColumn {
    /// Every column, in template order.
    pub const ALL: [StudentColumn; 12] = [
        Self::IdNumber,
        Self::FirstNames,
        Self::Surname,
        Self::Email,
        Self::PhoneNumber,
        Self::Institution,
        Self::StudentNumber,
        Self::Program,
        Self::YearOfStudy,
        Self::Funded,
        Self::FundedAmount,
        Self::NsfasNumber,
    ];

    /// Columns the header row must contain.
    pub const REQUIRED: [StudentColumn; 3] = [Self::IdNumber, Self::FirstNames, Self::Surname];

    pub fn header(&self) -> &'static str {
        match self {
            Self::IdNumber => "idNumber",
            Self::FirstNames => "firstNames",
            Self::Surname => "surname",
            Self::Email => "email",
            Self::PhoneNumber => "phoneNumber",
            Self::Institution => "institution",
            Self::StudentNumber => "studentNumber",
            Self::Program => "program",
            Self::YearOfStudy => "yearOfStudy",
            Self::Funded => "funded",
            Self::FundedAmount => "fundedAmount",
            Self::NsfasNumber => "nsfasNumber",
        }
    }

    pub fn from_header(header: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.header() == header)
    }
}

impl fmt::Display for StudentColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

/// One data row of an uploaded file, exactly as read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawRow {
    /// 0-based position among the data rows of the file.
    pub row_index: usize,
    /// Header name to raw cell text. Unknown columns are kept.
    pub values: BTreeMap<String, String>,
}

impl RawRow {
    pub fn new(row_index: usize, values: BTreeMap<String, String>) -> Self {
        Self { row_index, values }
    }

    /// The untouched cell for `column`, if the column exists.
    pub fn raw(&self, column: StudentColumn) -> Option<&str> {
        self.values.get(column.header()).map(String::as_str)
    }

    /// The trimmed cell for `column`, `None` when absent or blank.
    pub fn value(&self, column: StudentColumn) -> Option<&str> {
        self.raw(column)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ValidationError {
    pub row_index: usize,
    pub field: StudentColumn,
    pub message: String,
}

impl ValidationError {
    pub fn new(row_index: usize, field: StudentColumn, message: impl Into<String>) -> Self {
        Self {
            row_index,
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}: {}", self.row_index + 1, self.field, self.message)
    }
}

/// Row index to that row's validation errors. A row with no errors has no key.
pub type ErrorMap = BTreeMap<usize, Vec<ValidationError>>;

/// Snapshot emitted after each processed chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchProgress {
    /// 1-based number of the chunk just processed.
    pub current_batch: usize,
    pub total_batches: usize,
    /// Records processed so far, whatever their outcome.
    pub imported_count: usize,
    pub total_count: usize,
    pub percentage: u8,
}

impl BatchProgress {
    /// Builds a snapshot. The percentage stays below 100 until the last batch.
    pub fn new(
        current_batch: usize,
        total_batches: usize,
        imported_count: usize,
        total_count: usize,
    ) -> Self {
        let percentage = if total_count == 0 {
            100
        } else {
            let raw = (imported_count as f64 / total_count as f64 * 100.0).round();
            let raw = raw.clamp(0.0, 100.0) as u8;
            if current_batch < total_batches {
                raw.min(99)
            } else {
                raw
            }
        };

        Self {
            current_batch,
            total_batches,
            imported_count,
            total_count,
            percentage,
        }
    }

    pub fn is_last(&self) -> bool {
        self.current_batch >= self.total_batches
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateStudent {
    pub name: String,
    pub id_number: IdNumber,
    pub row_index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportErrorDetail {
    pub name: Option<String>,
    pub id_number: Option<IdNumber>,
    pub row_index: Option<usize>,
    pub error: String,
}

/// Final outcome of one import run.
///
/// Counts are exact. The detail lists may be capped, in which case
/// [`ImportResult::omitted_duplicates`] and [`ImportResult::omitted_errors`]
/// report how many entries were left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    pub success_count: usize,
    pub duplicate_count: usize,
    pub duplicate_students: Vec<DuplicateStudent>,
    pub error_count: usize,
    pub errors: Vec<ImportErrorDetail>,
}

impl ImportResult {
    pub fn total(&self) -> usize {
        self.success_count + self.duplicate_count + self.error_count
    }

    pub fn omitted_duplicates(&self) -> usize {
        self.duplicate_count
            .saturating_sub(self.duplicate_students.len())
    }

    pub fn omitted_errors(&self) -> usize {
        self.error_count.saturating_sub(self.errors.len())
    }

    /// Human-readable report of the run.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "Imported {} of {} students ({} duplicate{}, {} error{})\n",
            self.success_count,
            self.total(),
            self.duplicate_count,
            plural(self.duplicate_count),
            self.error_count,
            plural(self.error_count),
        );

        if self.duplicate_count > 0 {
            out.push_str("Duplicates skipped:\n");
            for dup in &self.duplicate_students {
                out.push_str(&format!(
                    "  - row {}: {} ({})\n",
                    dup.row_index + 1,
                    dup.name,
                    dup.id_number
                ));
            }
            if self.omitted_duplicates() > 0 {
                out.push_str(&format!("  ... and {} more\n", self.omitted_duplicates()));
            }
        }

        if self.error_count > 0 {
            out.push_str("Errors:\n");
            for err in &self.errors {
                let row = err
                    .row_index
                    .map(|i| format!("row {}", i + 1))
                    .unwrap_or_else(|| "row ?".to_string());
                let name = err.name.as_deref().unwrap_or("unknown");
                out.push_str(&format!("  - {}: {}: {}\n", row, name, err.error));
            }
            if self.omitted_errors() > 0 {
                out.push_str(&format!("  ... and {} more\n", self.omitted_errors()));
            }
        }

        out
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

/// Audit fields stamped on every written record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportAudit {
    pub imported_by: Option<UserId>,
    pub session_id: Option<ImportSessionId>,
}
