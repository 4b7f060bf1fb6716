#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use campusnest::router::init_router;
use campusnest::state::AppState;
use campusnest_auth::{create_access_token, permissions};
use campusnest_config::{CorsConfig, ImportConfig, JwtConfig};
use campusnest_import::InMemoryStudentStore;
use http_body_util::BodyExt;
use uuid::Uuid;

pub const MULTIPART_BOUNDARY: &str = "campusnest-test-boundary";

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 3600,
    }
}

pub fn token_with(user_id: Uuid, permissions: &[&str]) -> String {
    create_access_token(
        user_id,
        "registrar@example.com",
        permissions.iter().map(|p| p.to_string()).collect(),
        &jwt_config(),
    )
    .unwrap()
}

/// Token allowed to run imports.
pub fn import_token(user_id: Uuid) -> String {
    token_with(user_id, &[permissions::STUDENTS_IMPORT])
}

pub fn setup_test_app(store: Arc<InMemoryStudentStore>, import_config: ImportConfig) -> axum::Router {
    let state = AppState::new(
        store,
        jwt_config(),
        CorsConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
        },
        import_config,
    );
    init_router(state)
}

/// Distinct 13-digit ID number for the `n`-th test student.
pub fn id_number(n: usize) -> String {
    format!("{:013}", 9_001_015_000_000u64 + n as u64)
}

/// CSV with the required columns only.
pub fn student_csv(rows: &[(&str, &str, &str)]) -> String {
    let mut csv = String::from("idNumber,firstNames,surname\n");
    for (id, first_names, surname) in rows {
        csv.push_str(&format!("{},{},{}\n", id, first_names, surname));
    }
    csv
}

/// CSV of `count` valid students with distinct ID numbers.
pub fn valid_student_csv(count: usize) -> String {
    let ids: Vec<String> = (0..count).map(id_number).collect();
    let rows: Vec<(&str, &str, &str)> = ids
        .iter()
        .map(|id| (id.as_str(), "Naledi", "Khumalo"))
        .collect();
    student_csv(&rows)
}

pub fn multipart_body(file_name: &str, content_type: &str, contents: &str) -> String {
    format!(
        "--{b}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
         Content-Type: {ct}\r\n\
         \r\n\
         {contents}\r\n\
         --{b}--\r\n",
        b = MULTIPART_BOUNDARY,
        name = file_name,
        ct = content_type,
        contents = contents
    )
}

pub fn upload_request(uri: &str, token: &str, file_name: &str, content_type: &str, contents: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
        )
        .header("authorization", format!("Bearer {}", token))
        .body(Body::from(multipart_body(file_name, content_type, contents)))
        .unwrap()
}

pub fn authed_request(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

pub async fn body_text(response: Response) -> String {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(body.to_vec()).unwrap()
}
