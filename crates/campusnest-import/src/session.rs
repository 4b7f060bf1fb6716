//! The import wizard as an explicit state machine.
//!
//! ```text
//! Upload --upload--> Preview --begin_import--> Importing --finish(Ok)--> Complete
//!   ^                  |  ^                        |                       |
//!   |                  |  +------finish(Err)-------+                       |
//!   +------reset-------+-------------------------reset---------------------+
//! ```
//!
//! Leaving `Importing` requires the [`ImportTicket`] handed out by
//! [`ImportSession::begin_import`], so reset and re-upload are refused while
//! an import is running.

use campusnest_models::imports::{BatchProgress, ImportResult};
use campusnest_models::students::ValidatedStudent;
use serde::Serialize;
use std::fmt;
use tracing::debug;
use utoipa::ToSchema;

use crate::converter::convert_to_validated_students;
use crate::error::{FileError, PipelineError, SessionError};
use crate::parser::{ParseLimits, ParsedCsv, UploadedFile, parse_student_csv};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SessionStage {
    Upload,
    Preview,
    Importing,
    Complete,
}

impl fmt::Display for SessionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Upload => "upload",
            Self::Preview => "preview",
            Self::Importing => "importing",
            Self::Complete => "complete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct PreviewState {
    pub file_name: String,
    pub parsed: ParsedCsv,
    /// Message of the last failed import attempt, if any.
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ImportingState {
    pub file_name: String,
    pub parsed: ParsedCsv,
    pub total_count: usize,
    pub progress: Option<BatchProgress>,
}

#[derive(Debug, Clone)]
pub struct CompleteState {
    pub file_name: String,
    pub result: ImportResult,
}

#[derive(Debug, Clone)]
pub enum ImportSession {
    Upload { error: Option<FileError> },
    Preview(PreviewState),
    Importing(ImportingState),
    Complete(CompleteState),
}

impl Default for ImportSession {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof that an import was started. Carries the students to import and is
/// consumed by [`ImportSession::finish`].
#[derive(Debug)]
pub struct ImportTicket {
    students: Vec<ValidatedStudent>,
}

impl ImportTicket {
    pub fn students(&self) -> &[ValidatedStudent] {
        &self.students
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }
}

impl ImportSession {
    pub fn new() -> Self {
        Self::Upload { error: None }
    }

    pub fn stage(&self) -> SessionStage {
        match self {
            Self::Upload { .. } => SessionStage::Upload,
            Self::Preview(_) => SessionStage::Preview,
            Self::Importing(_) => SessionStage::Importing,
            Self::Complete(_) => SessionStage::Complete,
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            stage: self.stage(),
            action,
        }
    }

    /// Parses `file` and moves to Preview. On a file error the session stays
    /// in Upload with the error recorded.
    pub fn upload(&mut self, file: &UploadedFile, limits: &ParseLimits) -> Result<(), SessionError> {
        if !matches!(self, Self::Upload { .. }) {
            return Err(self.invalid("upload a file"));
        }

        match parse_student_csv(file, limits) {
            Ok(parsed) => {
                debug!(
                    file_name = %file.file_name,
                    rows = parsed.total_count(),
                    "Import session moved to preview"
                );
                *self = Self::Preview(PreviewState {
                    file_name: file.file_name.clone(),
                    parsed,
                    error: None,
                });
                Ok(())
            }
            Err(e) => {
                *self = Self::Upload {
                    error: Some(e.clone()),
                };
                Err(e.into())
            }
        }
    }

    /// Passes the zero-tolerance gate and moves to Importing.
    pub fn begin_import(&mut self) -> Result<ImportTicket, SessionError> {
        let students = match self {
            Self::Preview(preview) => {
                let invalid_rows = preview.parsed.invalid_count();
                if invalid_rows > 0 {
                    return Err(SessionError::ValidationPending { invalid_rows });
                }
                convert_to_validated_students(&preview.parsed.data, &preview.parsed.errors)
            }
            Self::Importing(_) => return Err(SessionError::ImportInProgress),
            _ => return Err(self.invalid("start an import")),
        };

        if students.is_empty() {
            return Err(SessionError::NothingToImport);
        }

        if let Self::Preview(preview) = std::mem::take(self) {
            *self = Self::Importing(ImportingState {
                file_name: preview.file_name,
                parsed: preview.parsed,
                total_count: students.len(),
                progress: None,
            });
        }

        Ok(ImportTicket { students })
    }

    /// Stores the latest progress snapshot.
    pub fn record_progress(&mut self, progress: BatchProgress) -> Result<(), SessionError> {
        match self {
            Self::Importing(state) => {
                state.progress = Some(progress);
                Ok(())
            }
            _ => Err(self.invalid("record progress")),
        }
    }

    /// Leaves Importing: to Complete on success, back to Preview with the
    /// error shown otherwise.
    pub fn finish(
        &mut self,
        ticket: ImportTicket,
        outcome: Result<ImportResult, PipelineError>,
    ) -> Result<(), SessionError> {
        if !matches!(self, Self::Importing(_)) {
            return Err(self.invalid("finish an import"));
        }
        drop(ticket);

        if let Self::Importing(state) = std::mem::take(self) {
            *self = match outcome {
                Ok(result) => Self::Complete(CompleteState {
                    file_name: state.file_name,
                    result,
                }),
                Err(e) => Self::Preview(PreviewState {
                    file_name: state.file_name,
                    parsed: state.parsed,
                    error: Some(e.to_string()),
                }),
            };
        }
        Ok(())
    }

    /// Back to an empty Upload stage. Refused while importing.
    pub fn reset(&mut self) -> Result<(), SessionError> {
        if self.is_importing() {
            return Err(SessionError::ImportInProgress);
        }
        *self = Self::new();
        Ok(())
    }

    pub fn is_importing(&self) -> bool {
        matches!(self, Self::Importing(_))
    }

    pub fn file_name(&self) -> Option<&str> {
        match self {
            Self::Upload { .. } => None,
            Self::Preview(s) => Some(&s.file_name),
            Self::Importing(s) => Some(&s.file_name),
            Self::Complete(s) => Some(&s.file_name),
        }
    }

    pub fn parsed(&self) -> Option<&ParsedCsv> {
        match self {
            Self::Preview(s) => Some(&s.parsed),
            Self::Importing(s) => Some(&s.parsed),
            _ => None,
        }
    }

    pub fn progress(&self) -> Option<BatchProgress> {
        match self {
            Self::Importing(s) => s.progress,
            _ => None,
        }
    }

    pub fn result(&self) -> Option<&ImportResult> {
        match self {
            Self::Complete(s) => Some(&s.result),
            _ => None,
        }
    }

    /// The message to show for the last failure, if any.
    pub fn error(&self) -> Option<String> {
        match self {
            Self::Upload { error } => error.as_ref().map(ToString::to_string),
            Self::Preview(s) => s.error.clone(),
            _ => None,
        }
    }
}
