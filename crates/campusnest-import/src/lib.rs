//! # CampusNest Import
//!
//! The bulk student import pipeline. Data flows strictly forward:
//!
//! 1. [`parser::parse_student_csv`] reads the uploaded bytes into raw rows and
//!    runs [`validator::validate_row`] over each of them.
//! 2. [`converter::convert_to_validated_students`] keeps the rows without
//!    errors and types them.
//! 3. [`importer::import_student_batch`] writes them through a
//!    [`store::StudentStore`] in bounded chunks, skipping duplicates.
//! 4. [`aggregator::ResultAggregator`] folds every record outcome into an
//!    [`ImportResult`](campusnest_models::imports::ImportResult).
//!
//! [`session::ImportSession`] sequences these steps as the
//! upload, preview, importing, complete wizard.

pub mod aggregator;
pub mod converter;
pub mod error;
pub mod importer;
pub mod parser;
pub mod session;
pub mod store;
pub mod template;
pub mod validator;

pub use aggregator::{DuplicateSource, RecordOutcome, ResultAggregator};
pub use converter::convert_to_validated_students;
pub use error::{FileError, PipelineError, SessionError, StoreError};
pub use importer::{ImportOptions, import_student_batch};
pub use parser::{ParseLimits, ParsedCsv, UploadedFile, parse_student_csv};
pub use session::{ImportSession, ImportTicket, SessionStage};
pub use store::{StoreFuture, StudentStore};
pub use template::student_csv_template;
pub use validator::{parse_funded, validate_row};

#[cfg(any(test, feature = "test-utils"))]
pub use store::InMemoryStudentStore;
