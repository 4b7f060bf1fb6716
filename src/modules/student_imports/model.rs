use campusnest_import::{ImportSession, SessionStage};
use campusnest_models::ids::ImportSessionId;
use campusnest_models::imports::{BatchProgress, ImportResult, RawRow, ValidationError};
use serde::Serialize;
use utoipa::ToSchema;

/// Snapshot of an import session as shown to the operator.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportSessionView {
    pub id: ImportSessionId,
    pub stage: SessionStage,
    pub file_name: Option<String>,
    /// Header row of the uploaded file, in file order.
    pub headers: Vec<String>,
    /// The first rows of the file, valid or not.
    pub preview: Vec<RawRow>,
    /// Every validation error in the file, ordered by row.
    pub row_errors: Vec<ValidationError>,
    pub total_count: usize,
    pub valid_count: usize,
    pub invalid_count: usize,
    /// Latest batch progress while importing.
    pub progress: Option<BatchProgress>,
    pub result: Option<ImportResult>,
    /// Last upload or import failure.
    pub error: Option<String>,
}

impl ImportSessionView {
    pub fn from_session(
        id: ImportSessionId,
        session: &ImportSession,
        progress: Option<BatchProgress>,
        preview_rows: usize,
    ) -> Self {
        let parsed = session.parsed();

        Self {
            id,
            stage: session.stage(),
            file_name: session.file_name().map(ToString::to_string),
            headers: parsed.map(|p| p.headers.clone()).unwrap_or_default(),
            preview: parsed
                .map(|p| p.data.iter().take(preview_rows).cloned().collect())
                .unwrap_or_default(),
            row_errors: parsed
                .map(|p| p.errors.values().flatten().cloned().collect())
                .unwrap_or_default(),
            total_count: parsed.map_or(0, |p| p.total_count()),
            valid_count: parsed.map_or(0, |p| p.valid_count()),
            invalid_count: parsed.map_or(0, |p| p.invalid_count()),
            progress: progress.or_else(|| session.progress()),
            result: session.result().cloned(),
            error: session.error(),
        }
    }
}

/// Multipart body of a file upload.
#[derive(ToSchema)]
pub struct UploadFileForm {
    /// The CSV file
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}
