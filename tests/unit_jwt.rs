use axum::http::StatusCode;
use campusnest_auth::{create_access_token, permissions, verify_token};
use campusnest_config::JwtConfig;
use uuid::Uuid;

fn get_test_jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test_secret_key_for_testing_purposes".to_string(),
        access_token_expiry: 3600,
    }
}

#[test]
fn test_verify_token_success() {
    let jwt_config = get_test_jwt_config();
    let user_id = Uuid::new_v4();

    let token = create_access_token(
        user_id,
        "registrar@example.com",
        vec![permissions::STUDENTS_IMPORT.to_string()],
        &jwt_config,
    )
    .unwrap();
    let claims = verify_token(&token, &jwt_config).unwrap();

    assert_eq!(claims.sub, user_id.to_string());
    assert_eq!(claims.user_id(), Some(user_id));
    assert_eq!(claims.email, "registrar@example.com");
    assert!(claims.has_permission(permissions::STUDENTS_IMPORT));
    assert!(claims.exp > claims.iat);
}

#[test]
fn test_verify_token_wrong_secret() {
    let jwt_config = get_test_jwt_config();
    let token =
        create_access_token(Uuid::new_v4(), "registrar@example.com", vec![], &jwt_config).unwrap();

    let other = JwtConfig {
        secret: "another_secret".to_string(),
        ..get_test_jwt_config()
    };
    let err = verify_token(&token, &other).unwrap_err();
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);
}

#[test]
fn test_verify_token_malformed() {
    let err = verify_token("not.a.token", &get_test_jwt_config()).unwrap_err();
    assert_eq!(err.status, StatusCode::UNAUTHORIZED);
}
