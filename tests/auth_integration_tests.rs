mod common;

use axum::{
    extract::FromRequestParts,
    http::{Method, Request, StatusCode, header, request::Parts},
};
use blog_api::{
    AppConfig, ApiError,
    auth::{AdminUser, AuthUser, Claims, TOKEN_TTL_SECS, decode_token, issue_token},
    models::Role,
};
use chrono::Utc;
use common::{PASSWORD, TestApp};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;

const TEST_TOKEN_SECRET: &str = "test-secret-value-1234567890";

fn create_config() -> AppConfig {
    AppConfig {
        token_secret: TEST_TOKEN_SECRET.to_string(),
        ..AppConfig::default()
    }
}

fn create_token(uid: i64, role: i16, exp_offset: i64, secret: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        uid,
        role,
        iat: now,
        exp: now + exp_offset,
    };
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn get_request_parts(authorization: Option<&str>) -> Parts {
    let mut builder = Request::builder().method(Method::GET).uri("/");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    let (parts, _) = builder.body(axum::body::Body::empty()).unwrap().into_parts();
    parts
}

// --- Extractor ---

#[tokio::test]
async fn test_auth_success_with_valid_token() {
    let config = create_config();
    let token = create_token(7, 0, 3600, TEST_TOKEN_SECRET);
    let mut parts = get_request_parts(Some(&format!("Bearer {token}")));

    let user = AuthUser::from_request_parts(&mut parts, &config)
        .await
        .expect("valid token should authenticate");

    assert_eq!(user, AuthUser { id: 7, role: 0 });
}

#[tokio::test]
async fn test_auth_failure_with_missing_header() {
    let config = create_config();
    let mut parts = get_request_parts(None);

    let result = AuthUser::from_request_parts(&mut parts, &config).await;

    assert!(matches!(result, Err(ApiError::Unauthenticated)));
}

#[tokio::test]
async fn test_auth_failure_with_non_bearer_scheme() {
    let config = create_config();
    let mut parts = get_request_parts(Some("Basic dXNlcjpwYXNz"));

    let result = AuthUser::from_request_parts(&mut parts, &config).await;

    assert!(matches!(result, Err(ApiError::Unauthenticated)));
}

#[tokio::test]
async fn test_auth_failure_with_empty_token() {
    let config = create_config();
    let mut parts = get_request_parts(Some("Bearer "));

    let result = AuthUser::from_request_parts(&mut parts, &config).await;

    assert!(matches!(result, Err(ApiError::Unauthenticated)));
}

#[tokio::test]
async fn test_auth_failure_with_wrong_secret() {
    let config = create_config();
    let token = create_token(7, 0, 3600, "some-other-secret");
    let mut parts = get_request_parts(Some(&format!("Bearer {token}")));

    let result = AuthUser::from_request_parts(&mut parts, &config).await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn test_auth_failure_with_expired_token() {
    let config = create_config();
    let token = create_token(7, 0, -10, TEST_TOKEN_SECRET);
    let mut parts = get_request_parts(Some(&format!("Bearer {token}")));

    let result = AuthUser::from_request_parts(&mut parts, &config).await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn test_auth_failure_with_garbage_token() {
    let config = create_config();
    let mut parts = get_request_parts(Some("Bearer not.a.jwt"));

    let result = AuthUser::from_request_parts(&mut parts, &config).await;

    assert!(matches!(result, Err(ApiError::Unauthorized)));
}

#[tokio::test]
async fn test_admin_extractor_rejects_regular_user() {
    let config = create_config();
    let token = create_token(3, i16::from(Role::User), 3600, TEST_TOKEN_SECRET);
    let mut parts = get_request_parts(Some(&format!("Bearer {token}")));

    let result = AdminUser::from_request_parts(&mut parts, &config).await;

    assert!(matches!(result, Err(ApiError::Forbidden)));
}

#[tokio::test]
async fn test_admin_extractor_accepts_admin() {
    let config = create_config();
    let token = create_token(1, i16::from(Role::Admin), 3600, TEST_TOKEN_SECRET);
    let mut parts = get_request_parts(Some(&format!("Bearer {token}")));

    let AdminUser(user) = AdminUser::from_request_parts(&mut parts, &config)
        .await
        .expect("admin token should pass");

    assert_eq!(user.id, 1);
    assert!(user.has_role(Role::Admin));
}

#[tokio::test]
async fn test_admin_extractor_without_token_is_unauthenticated() {
    let config = create_config();
    let mut parts = get_request_parts(None);

    let result = AdminUser::from_request_parts(&mut parts, &config).await;

    assert!(matches!(result, Err(ApiError::Unauthenticated)));
}

#[test]
fn test_issued_token_round_trips_claims() {
    let issued = issue_token(42, Role::Admin, TEST_TOKEN_SECRET).unwrap();
    let claims = decode_token(&issued.token, TEST_TOKEN_SECRET).unwrap();

    assert_eq!(claims.uid, 42);
    assert_eq!(claims.role, 1);
    assert_eq!(claims.exp, issued.expires_at);
    assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
}

// --- Login / register endpoints ---

#[tokio::test]
async fn test_login_with_valid_credentials() {
    let app = TestApp::new().await;
    let user = app.seed_user("Alice", "alice@example.com", Role::User).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "alice@example.com", "password": PASSWORD})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"], json!({"id": user.id, "name": "Alice"}));
    let token = body["token"].as_str().expect("token in response");
    let claims = decode_token(token, &app.config.token_secret).unwrap();
    assert_eq!(claims.uid, user.id);
    assert_eq!(body["expires_at"], json!(claims.exp));
}

#[tokio::test]
async fn test_login_with_unrecognised_stored_role_gets_user_token() {
    let app = TestApp::new().await;
    let user = app.seed_user("Odd", "odd@example.com", Role::User).await;
    sqlx::query("UPDATE users SET role = 7 WHERE id = ?")
        .bind(user.id)
        .execute(app.repo.pool())
        .await
        .unwrap();

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "odd@example.com", "password": PASSWORD})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let claims = decode_token(body["token"].as_str().unwrap(), &app.config.token_secret).unwrap();
    assert_eq!(claims.role, i16::from(Role::User));
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let app = TestApp::new().await;
    app.seed_user("Alice", "alice@example.com", Role::User).await;

    let (status, _) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "  Alice@Example.com ", "password": PASSWORD})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_with_invalid_email_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "notanemail", "password": "whatever"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("token").is_none());
    assert!(!body["errors"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_login_with_empty_password_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "alice@example.com", "password": ""})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("token").is_none());
    assert_eq!(body["errors"], json!(["password: must not be empty"]));
}

#[tokio::test]
async fn test_login_unknown_user_and_wrong_password_look_the_same() {
    let app = TestApp::new().await;
    app.seed_user("Alice", "alice@example.com", Role::User).await;

    let (unknown_status, unknown_body) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "bob@example.com", "password": PASSWORD})),
        )
        .await;
    let (wrong_status, wrong_body) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "alice@example.com", "password": "wrong-password"})),
        )
        .await;

    assert_eq!(unknown_status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_status, StatusCode::BAD_REQUEST);
    assert_eq!(unknown_body, wrong_body);
}

#[tokio::test]
async fn test_register_returns_token_and_user() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({"email": "new@example.com", "name": "Newcomer", "password": "longenough"})),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"], json!({"id": 1, "name": "Newcomer"}));
    let claims = decode_token(body["token"].as_str().unwrap(), &app.config.token_secret).unwrap();
    assert_eq!(claims.uid, 1);
    assert_eq!(claims.role, i16::from(Role::User));

    // The new account can log in straight away.
    let (status, _) = app
        .request(
            Method::POST,
            "/auth/login",
            None,
            Some(json!({"email": "new@example.com", "password": "longenough"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_register_duplicate_email_is_rejected() {
    let app = TestApp::new().await;
    app.seed_user("Alice", "alice@example.com", Role::User).await;

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({"email": "alice@example.com", "name": "Imposter", "password": "longenough"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"], json!(["Email is already registered"]));
}

#[tokio::test]
async fn test_register_short_password_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/auth/register",
            None,
            Some(json!({"email": "new@example.com", "name": "Newcomer", "password": "short"})),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("token").is_none());
}

#[tokio::test]
async fn test_protected_route_without_token_has_empty_body() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/articles",
            None,
            Some(json!({"title": "t", "text": "x", "category_id": 1})),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, serde_json::Value::Null);
}

#[tokio::test]
async fn test_protected_route_with_bad_token_reports_unauthorized() {
    let app = TestApp::new().await;

    let (status, body) = app
        .request(
            Method::POST,
            "/articles",
            Some("garbage"),
            Some(json!({"title": "t", "text": "x", "category_id": 1})),
        )
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({"errors": ["Unauthorized"]}));
}
