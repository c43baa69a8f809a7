//! HTTP-level integration tests for credential registration.

mod common;

use axum::http::{header, StatusCode};
use common::{body_json, post_json, register, TEST_PASSWORD};
use sqlx::PgPool;

fn registration_body(email: &str, phone: &str) -> serde_json::Value {
    serde_json::json!({
        "name": "Asha Verma",
        "email": email,
        "phone": phone,
        "course": "BCA (Co-Ed)",
        "password": TEST_PASSWORD,
        "confirmPassword": TEST_PASSWORD,
    })
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_creates_applicant_and_sets_session_cookie(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_json(
        app.router(),
        "/api/v1/register",
        registration_body("Asha@Example.com", "9876543210"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("admission_session="));
    assert!(cookie.contains("HttpOnly"));

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["user"]["email"], "asha@example.com");
    assert_eq!(json["user"]["phone"], "9876543210");
    assert_eq!(json["user"]["course"], "BCA (Co-Ed)");
    assert!(json["user"].get("passwordHash").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_without_password_is_allowed(pool: PgPool) {
    let app = common::build_test_app(pool);

    let body = serde_json::json!({
        "name": "Asha Verma",
        "email": "asha@example.com",
        "phone": "9876543210",
        "course": "BCA (Co-Ed)",
    });
    let response = post_json(app.router(), "/api/v1/register", body).await;

    assert_eq!(response.status(), StatusCode::CREATED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_phone_is_conflict(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(&app, "first@example.com", "9876543210").await;

    let response = post_json(
        app.router(),
        "/api/v1/register",
        registration_body("second@example.com", "9876543210"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "Phone number already in use");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_email_is_conflict(pool: PgPool) {
    let app = common::build_test_app(pool);
    register(&app, "asha@example.com", "9876543210").await;

    let response = post_json(
        app.router(),
        "/api/v1/register",
        registration_body("ASHA@example.com", "9123456780"),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "CONFLICT");
    assert_eq!(json["error"], "Email already registered");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn invalid_fields_are_rejected(pool: PgPool) {
    let app = common::build_test_app(pool);

    let cases = [
        registration_body("not-an-email", "9876543210"),
        registration_body("asha@example.com", "12345"),
        serde_json::json!({
            "name": "Asha",
            "email": "asha@example.com",
            "phone": "9876543210",
            "course": "Astrophysics",
        }),
        serde_json::json!({
            "name": "Asha",
            "email": "asha@example.com",
            "phone": "9876543210",
            "course": "BCA (Co-Ed)",
            "password": "weak",
            "confirmPassword": "weak",
        }),
        serde_json::json!({
            "name": "Asha",
            "email": "asha@example.com",
            "phone": "9876543210",
            "course": "BCA (Co-Ed)",
            "password": TEST_PASSWORD,
            "confirmPassword": "Different1!",
        }),
    ];

    for body in cases {
        let response = post_json(app.router(), "/api/v1/register", body.clone()).await;
        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "expected 400 for {body}"
        );
        let json = body_json(response).await;
        assert_eq!(json["code"], "VALIDATION_ERROR");
    }
}
