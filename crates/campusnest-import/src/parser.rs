//! CSV parsing for student uploads.
//!
//! The file is rejected as a whole ([`FileError`]) when it is not a CSV, is
//! too large, is not UTF-8, lacks a required column or is structurally broken.
//! Otherwise every data row is kept and validated, and the row errors are
//! collected into an [`ErrorMap`].

use campusnest_models::imports::{ErrorMap, RawRow, StudentColumn};
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::FileError;
use crate::validator::validate_row;

/// Content types accepted for files without a `.csv` extension.
pub const CSV_CONTENT_TYPES: [&str; 4] = [
    "text/csv",
    "application/csv",
    "text/x-csv",
    "application/vnd.ms-excel",
];

pub use campusnest_config::import::DEFAULT_MAX_FILE_BYTES;

const BOM: &str = "\u{feff}";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(
        file_name: impl Into<String>,
        content_type: Option<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type,
            bytes: bytes.into(),
        }
    }

    /// True when the extension is `.csv` or the content type is a CSV type.
    pub fn is_csv(&self) -> bool {
        let by_extension = Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));

        let by_content_type = self.content_type.as_deref().is_some_and(|ct| {
            let essence = ct.split(';').next().unwrap_or_default().trim();
            CSV_CONTENT_TYPES
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(essence))
        });

        by_extension || by_content_type
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseLimits {
    pub max_file_bytes: usize,
}

impl Default for ParseLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }
}

/// Outcome of parsing an accepted file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedCsv {
    /// Trimmed header names, in file order.
    pub headers: Vec<String>,
    /// Every data row, valid or not.
    pub data: Vec<RawRow>,
    /// Errors of the invalid rows only.
    pub errors: ErrorMap,
}

impl ParsedCsv {
    pub fn total_count(&self) -> usize {
        self.data.len()
    }

    pub fn invalid_count(&self) -> usize {
        self.errors.len()
    }

    pub fn valid_count(&self) -> usize {
        self.data.len() - self.errors.len()
    }

    pub fn is_valid(&self, row_index: usize) -> bool {
        !self.errors.contains_key(&row_index)
    }
}

/// Reads and validates an uploaded student CSV.
pub fn parse_student_csv(file: &UploadedFile, limits: &ParseLimits) -> Result<ParsedCsv, FileError> {
    if !file.is_csv() {
        return Err(FileError::UnsupportedType {
            file_name: file.file_name.clone(),
            content_type: file.content_type.clone(),
        });
    }

    if file.bytes.len() > limits.max_file_bytes {
        return Err(FileError::TooLarge {
            size: file.bytes.len(),
            max: limits.max_file_bytes,
        });
    }

    let text = std::str::from_utf8(&file.bytes).map_err(|_| FileError::Encoding)?;
    let text = text.strip_prefix(BOM).unwrap_or(text);
    if text.trim().is_empty() {
        return Err(FileError::Empty);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(malformed)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let missing: Vec<String> = StudentColumn::REQUIRED
        .iter()
        .filter(|column| !headers.iter().any(|h| h == column.header()))
        .map(|column| column.header().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(FileError::MissingColumns(missing));
    }

    let mut data = Vec::new();
    let mut errors = ErrorMap::new();

    for record in reader.records() {
        let record = record.map_err(malformed)?;
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let values: BTreeMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .filter(|(header, _)| !header.is_empty())
            .map(|(header, cell)| (header.clone(), cell.to_string()))
            .collect();

        let row = RawRow::new(data.len(), values);
        let row_errors = validate_row(&row);
        if !row_errors.is_empty() {
            errors.insert(row.row_index, row_errors);
        }
        data.push(row);
    }

    debug!(
        file_name = %file.file_name,
        rows = data.len(),
        invalid_rows = errors.len(),
        "Parsed student CSV"
    );

    Ok(ParsedCsv {
        headers,
        data,
        errors,
    })
}

fn malformed(err: csv::Error) -> FileError {
    FileError::Malformed {
        line: err.position().map(|pos| pos.line()).unwrap_or(0),
        message: err.to_string(),
    }
}
