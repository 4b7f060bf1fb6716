use crate::modules::student_imports::controller::{
    create_session, delete_session, download_template, get_session, reset_session, run_import,
    upload_file,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{get, post},
};

pub fn init_student_imports_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session))
        .route("/template", get(download_template))
        .route("/{id}", get(get_session).delete(delete_session))
        .route("/{id}/file", post(upload_file))
        .route("/{id}/import", post(run_import))
        .route("/{id}/reset", post(reset_session))
}
