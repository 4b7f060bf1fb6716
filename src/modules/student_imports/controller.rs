use crate::middleware::auth::RequireStudentsImport;
use crate::modules::student_imports::model::{ImportSessionView, UploadFileForm};
use crate::state::AppState;
use anyhow::anyhow;
use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};
use campusnest_core::{AppError, ErrorResponse};
use campusnest_import::template::TEMPLATE_FILE_NAME;
use campusnest_import::{UploadedFile, student_csv_template};
use campusnest_models::ids::ImportSessionId;
use campusnest_models::imports::ImportResult;
use tracing::instrument;

/// Multipart field carrying the CSV file.
const FILE_FIELD: &str = "file";

#[utoipa::path(
    get,
    path = "/api/student-imports/template",
    responses(
        (status = 200, description = "CSV template with the header row only", content_type = "text/csv", body = String),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Student Imports"
)]
#[instrument]
pub async fn download_template(
    RequireStudentsImport(_auth_user): RequireStudentsImport,
) -> Result<impl IntoResponse, AppError> {
    let template = student_csv_template()?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", TEMPLATE_FILE_NAME),
            ),
        ],
        template,
    ))
}

#[utoipa::path(
    post,
    path = "/api/student-imports",
    responses(
        (status = 201, description = "Import session created", body = ImportSessionView),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Student Imports"
)]
#[instrument(skip(state))]
pub async fn create_session(
    State(state): State<AppState>,
    RequireStudentsImport(auth_user): RequireStudentsImport,
) -> Result<(StatusCode, Json<ImportSessionView>), AppError> {
    let user_id = auth_user.user_id()?;
    let view = state.imports.create_session(user_id).await;
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/api/student-imports/{id}",
    params(
        ("id" = ImportSessionId, Path, description = "Import session ID")
    ),
    responses(
        (status = 200, description = "Import session snapshot", body = ImportSessionView),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Import session not found", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Student Imports"
)]
#[instrument(skip(state))]
pub async fn get_session(
    State(state): State<AppState>,
    RequireStudentsImport(auth_user): RequireStudentsImport,
    Path(id): Path<ImportSessionId>,
) -> Result<Json<ImportSessionView>, AppError> {
    let user_id = auth_user.user_id()?;
    let view = state.imports.get_session(user_id, id).await?;
    Ok(Json(view))
}

#[utoipa::path(
    post,
    path = "/api/student-imports/{id}/file",
    params(
        ("id" = ImportSessionId, Path, description = "Import session ID")
    ),
    request_body(content = UploadFileForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File parsed, session moved to preview", body = ImportSessionView),
        (status = 400, description = "Unreadable or malformed file", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Import session not found", body = ErrorResponse),
        (status = 409, description = "Session is not awaiting a file", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 415, description = "Not a CSV file", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Student Imports"
)]
#[instrument(skip(state, multipart))]
pub async fn upload_file(
    State(state): State<AppState>,
    RequireStudentsImport(auth_user): RequireStudentsImport,
    Path(id): Path<ImportSessionId>,
    mut multipart: Multipart,
) -> Result<Json<ImportSessionView>, AppError> {
    let user_id = auth_user.user_id()?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::bad_request(anyhow!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(ToString::to_string).unwrap_or_default();
        let content_type = field.content_type().map(ToString::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::bad_request(anyhow!("Failed to read uploaded file: {}", e)))?;

        let file = UploadedFile::new(file_name, content_type, bytes.to_vec());
        let view = state.imports.upload_file(user_id, id, file).await?;
        return Ok(Json(view));
    }

    Err(AppError::bad_request(anyhow!(
        "Missing '{}' field in multipart body",
        FILE_FIELD
    )))
}

#[utoipa::path(
    post,
    path = "/api/student-imports/{id}/import",
    params(
        ("id" = ImportSessionId, Path, description = "Import session ID")
    ),
    responses(
        (status = 200, description = "Import finished", body = ImportResult),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Import session not found", body = ErrorResponse),
        (status = 409, description = "Session is not in preview or an import is running", body = ErrorResponse),
        (status = 422, description = "Rows still have validation errors or there is nothing to import", body = ErrorResponse),
        (status = 503, description = "Student store unavailable, import aborted", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Student Imports"
)]
#[instrument(skip(state))]
pub async fn run_import(
    State(state): State<AppState>,
    RequireStudentsImport(auth_user): RequireStudentsImport,
    Path(id): Path<ImportSessionId>,
) -> Result<Json<ImportResult>, AppError> {
    let user_id = auth_user.user_id()?;
    let result = state.imports.run_import(user_id, id).await?;
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/api/student-imports/{id}/reset",
    params(
        ("id" = ImportSessionId, Path, description = "Import session ID")
    ),
    responses(
        (status = 200, description = "Session back to upload", body = ImportSessionView),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Import session not found", body = ErrorResponse),
        (status = 409, description = "Import in progress", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Student Imports"
)]
#[instrument(skip(state))]
pub async fn reset_session(
    State(state): State<AppState>,
    RequireStudentsImport(auth_user): RequireStudentsImport,
    Path(id): Path<ImportSessionId>,
) -> Result<Json<ImportSessionView>, AppError> {
    let user_id = auth_user.user_id()?;
    let view = state.imports.reset_session(user_id, id).await?;
    Ok(Json(view))
}

#[utoipa::path(
    delete,
    path = "/api/student-imports/{id}",
    params(
        ("id" = ImportSessionId, Path, description = "Import session ID")
    ),
    responses(
        (status = 204, description = "Session discarded"),
        (status = 401, description = "Unauthorized", body = ErrorResponse),
        (status = 403, description = "Forbidden", body = ErrorResponse),
        (status = 404, description = "Import session not found", body = ErrorResponse),
        (status = 409, description = "Import in progress", body = ErrorResponse)
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Student Imports"
)]
#[instrument(skip(state))]
pub async fn delete_session(
    State(state): State<AppState>,
    RequireStudentsImport(auth_user): RequireStudentsImport,
    Path(id): Path<ImportSessionId>,
) -> Result<StatusCode, AppError> {
    let user_id = auth_user.user_id()?;
    state.imports.delete_session(user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
