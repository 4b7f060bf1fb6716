use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use campusnest_core::ErrorResponse;
use campusnest_import::SessionStage;
use campusnest_models::ids::ImportSessionId;
use campusnest_models::imports::{
    BatchProgress, DuplicateStudent, ImportErrorDetail, ImportResult, RawRow, StudentColumn,
    ValidationError,
};

use crate::modules::student_imports::model::{ImportSessionView, UploadFileForm};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::student_imports::controller::download_template,
        crate::modules::student_imports::controller::create_session,
        crate::modules::student_imports::controller::get_session,
        crate::modules::student_imports::controller::upload_file,
        crate::modules::student_imports::controller::run_import,
        crate::modules::student_imports::controller::reset_session,
        crate::modules::student_imports::controller::delete_session,
    ),
    components(
        schemas(
            ImportSessionId,
            ImportSessionView,
            UploadFileForm,
            SessionStage,
            StudentColumn,
            RawRow,
            ValidationError,
            BatchProgress,
            ImportResult,
            DuplicateStudent,
            ImportErrorDetail,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Student Imports", description = "Bulk student import from CSV files")
    ),
    info(
        title = "CampusNest API",
        version = "0.1.0",
        description = "Bulk student import service for the CampusNest CRM, built with Rust, Axum, and PostgreSQL.",
        license(
            name = "MIT"
        )
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            )
        }
    }
}
