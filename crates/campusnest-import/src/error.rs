use crate::session::SessionStage;

/// Rejection of an uploaded file before any row is processed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FileError {
    #[error("Unsupported file type for '{file_name}': please upload a .csv file")]
    UnsupportedType {
        file_name: String,
        content_type: Option<String>,
    },

    #[error("File is {size} bytes, the maximum allowed size is {max} bytes")]
    TooLarge { size: usize, max: usize },

    #[error("File is not valid UTF-8 text")]
    Encoding,

    #[error("File is empty")]
    Empty,

    #[error("Missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Malformed CSV at line {line}: {message}")]
    Malformed { line: u64, message: String },
}

/// Failure reported by a [`StudentStore`](crate::store::StudentStore).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The natural key is already taken.
    #[error("{0}")]
    Conflict(String),

    /// The store refused the record.
    #[error("{0}")]
    Rejected(String),

    /// The store cannot be reached at all.
    #[error("Student store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Fatal errors abort the whole run instead of one record.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PipelineError {
    #[error("Import aborted during batch {batch} of {total_batches}: {source}")]
    StoreUnavailable {
        batch: usize,
        total_batches: usize,
        source: StoreError,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Cannot {action} while the session is in the {stage} stage")]
    InvalidTransition {
        stage: SessionStage,
        action: &'static str,
    },

    #[error("An import is in progress for this session")]
    ImportInProgress,

    #[error("{invalid_rows} row(s) still have validation errors, fix them and upload the file again")]
    ValidationPending { invalid_rows: usize },

    #[error("The file contains no students to import")]
    NothingToImport,

    #[error(transparent)]
    File(#[from] FileError),
}
