/// Integration tests for admin account management

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../migrations")]
async fn test_create_admin_hides_password_hash(pool: PgPool) {
    let ctx = TestContext::from_pool(pool).await;

    let (status, body) = ctx
        .authed(
            Method::POST,
            "/api/admins",
            Some(json!({ "fullName": "Ben Moss", "email": "Ben@Example.com", "password": "mossy-rocks9" })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["email"], "ben@example.com");
    assert!(body["data"].get("passwordHash").is_none());
    assert!(body["data"].get("password_hash").is_none());

    let (_, list) = ctx.authed(Method::GET, "/api/admins", None).await;
    for admin in list["data"].as_array().unwrap() {
        assert!(admin.get("passwordHash").is_none());
    }
    assert_eq!(list["metadata"]["total"], 2);
}

#[sqlx::test(migrations = "../migrations")]
async fn test_duplicate_email_is_bad_request(pool: PgPool) {
    let ctx = TestContext::from_pool(pool).await;

    let (status, body) = ctx
        .authed(
            Method::POST,
            "/api/admins",
            Some(json!({ "fullName": "Imposter", "email": "ADA@example.com", "password": "mossy-rocks9" })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"][0]["field"], "email");
}

#[sqlx::test(migrations = "../migrations")]
async fn test_update_admin_password_optional(pool: PgPool) {
    let ctx = TestContext::from_pool(pool).await;

    let (_, created) = ctx
        .authed(
            Method::POST,
            "/api/admins",
            Some(json!({ "fullName": "Ben Moss", "email": "ben@example.com", "password": "mossy-rocks9" })),
        )
        .await;
    let uri = format!("/api/admins/{}", created["data"]["id"]);

    let (status, updated) = ctx
        .authed(
            Method::PUT,
            &uri,
            Some(json!({ "fullName": "Benjamin Moss", "email": "ben@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["fullName"], "Benjamin Moss");

    let (status, _) = ctx
        .public(
            Method::POST,
            "/api/auth/login",
            Some(json!({ "email": "ben@example.com", "password": "mossy-rocks9" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .authed(
            Method::PUT,
            &uri,
            Some(json!({ "fullName": "Benjamin Moss", "email": "ada@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../migrations")]
async fn test_cannot_delete_self(pool: PgPool) {
    let ctx = TestContext::from_pool(pool).await;

    let (status, _) = ctx
        .authed(Method::DELETE, &format!("/api/admins/{}", ctx.admin.id), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx.authed(Method::DELETE, "/api/admins/4242", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
