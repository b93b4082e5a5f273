/// Integration tests for team members and their display order

mod common;

use axum::http::{Method, StatusCode};
use common::{app_without_database, send, TestContext};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn add_member(ctx: &TestContext, name: &str) -> Value {
    let (status, body) = ctx
        .authed(
            Method::POST,
            "/api/team-members",
            Some(json!({ "name": name, "position": "Ecologist" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"].clone()
}

async fn orders(pool: &PgPool) -> Vec<(String, i32)> {
    sqlx::query_as("SELECT name, display_order FROM team_members ORDER BY display_order, id")
        .fetch_all(pool)
        .await
        .unwrap()
}

#[sqlx::test(migrations = "../migrations")]
async fn test_create_appends_after_max(pool: PgPool) {
    let ctx = TestContext::from_pool(pool).await;

    let first = add_member(&ctx, "Ada").await;
    assert_eq!(first["displayOrder"], 0);
    assert_eq!(first["isActive"], true);

    let next = add_member(&ctx, "Ben").await;
    assert_eq!(next["displayOrder"], 1);
}

#[sqlx::test(migrations = "../migrations")]
async fn test_explicit_display_order_shifts_others(pool: PgPool) {
    let ctx = TestContext::from_pool(pool).await;
    add_member(&ctx, "Ada").await;

    let (status, placed) = ctx
        .authed(
            Method::POST,
            "/api/team-members",
            Some(json!({ "name": "Ben", "position": "Hydrologist", "displayOrder": 0 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(placed["data"]["displayOrder"], 0);
    assert_eq!(
        orders(&ctx.db).await,
        vec![("Ben".to_string(), 0), ("Ada".to_string(), 1)]
    );

    let (status, moved) = ctx
        .authed(
            Method::PATCH,
            &format!("/api/team-members/{}", placed["data"]["id"]),
            Some(json!({ "displayOrder": 40 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["data"]["displayOrder"], 1);
    assert_eq!(
        orders(&ctx.db).await,
        vec![("Ada".to_string(), 0), ("Ben".to_string(), 1)]
    );

    let (status, _) = ctx
        .authed(
            Method::POST,
            "/api/team-members",
            Some(json!({ "name": "Cleo", "position": "Botanist", "displayOrder": 7 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(
        orders(&ctx.db).await,
        vec![
            ("Ada".to_string(), 0),
            ("Ben".to_string(), 1),
            ("Cleo".to_string(), 2),
        ]
    );
}

#[sqlx::test(migrations = "../migrations")]
async fn test_delete_renumbers_densely(pool: PgPool) {
    let ctx = TestContext::from_pool(pool).await;
    add_member(&ctx, "Ada").await;
    let ben = add_member(&ctx, "Ben").await;
    add_member(&ctx, "Cleo").await;
    add_member(&ctx, "Dev").await;

    let (status, _) = ctx
        .authed(Method::DELETE, &format!("/api/team-members/{}", ben["id"]), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(
        orders(&ctx.db).await,
        vec![
            ("Ada".to_string(), 0),
            ("Cleo".to_string(), 1),
            ("Dev".to_string(), 2),
        ]
    );
}

#[sqlx::test(migrations = "../migrations")]
async fn test_reorder(pool: PgPool) {
    let ctx = TestContext::from_pool(pool).await;
    let ada = add_member(&ctx, "Ada").await;
    let ben = add_member(&ctx, "Ben").await;
    let cleo = add_member(&ctx, "Cleo").await;

    let (status, body) = ctx
        .authed(
            Method::PUT,
            "/api/team-members/reorder",
            Some(json!({ "items": [
                { "id": cleo["id"], "displayOrder": 0 },
                { "id": ada["id"], "displayOrder": 1 },
                { "id": ben["id"], "displayOrder": 2 }
            ] })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Cleo", "Ada", "Ben"]);

    assert_eq!(
        orders(&ctx.db).await,
        vec![
            ("Cleo".to_string(), 0),
            ("Ada".to_string(), 1),
            ("Ben".to_string(), 2),
        ]
    );
}

#[sqlx::test(migrations = "../migrations")]
async fn test_reorder_single_item_moves_to_front(pool: PgPool) {
    let ctx = TestContext::from_pool(pool).await;
    add_member(&ctx, "Ada").await;
    add_member(&ctx, "Ben").await;
    let cleo = add_member(&ctx, "Cleo").await;

    let (status, body) = ctx
        .authed(
            Method::PUT,
            "/api/team-members/reorder",
            Some(json!({ "items": [{ "id": cleo["id"], "displayOrder": 0 }] })),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(
        orders(&ctx.db).await,
        vec![
            ("Cleo".to_string(), 0),
            ("Ada".to_string(), 1),
            ("Ben".to_string(), 2),
        ]
    );
}

#[sqlx::test(migrations = "../migrations")]
async fn test_reorder_with_unknown_id_changes_nothing(pool: PgPool) {
    let ctx = TestContext::from_pool(pool).await;
    let ada = add_member(&ctx, "Ada").await;
    add_member(&ctx, "Ben").await;

    let (status, _) = ctx
        .authed(
            Method::PUT,
            "/api/team-members/reorder",
            Some(json!({ "items": [
                { "id": ada["id"], "displayOrder": 5 },
                { "id": 9999, "displayOrder": 0 }
            ] })),
        )
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        orders(&ctx.db).await,
        vec![("Ada".to_string(), 0), ("Ben".to_string(), 1)]
    );
}

#[sqlx::test(migrations = "../migrations")]
async fn test_reorder_rejects_duplicates(pool: PgPool) {
    let ctx = TestContext::from_pool(pool).await;
    let ada = add_member(&ctx, "Ada").await;

    let (status, body) = ctx
        .authed(
            Method::PUT,
            "/api/team-members/reorder",
            Some(json!({ "items": [
                { "id": ada["id"], "displayOrder": 0 },
                { "id": ada["id"], "displayOrder": 1 }
            ] })),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"][0]["field"], "items");
}

#[sqlx::test(migrations = "../migrations")]
async fn test_patch_and_put(pool: PgPool) {
    let ctx = TestContext::from_pool(pool).await;
    let ada = add_member(&ctx, "Ada").await;
    let uri = format!("/api/team-members/{}", ada["id"]);

    let (status, patched) = ctx
        .authed(Method::PATCH, &uri, Some(json!({ "isActive": false, "image": "ada.png" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(patched["data"]["isActive"], false);
    assert_eq!(patched["data"]["image"], "ada.png");
    assert_eq!(patched["data"]["name"], "Ada");

    let (status, _) = ctx.authed(Method::PATCH, &uri, Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, replaced) = ctx
        .authed(
            Method::PUT,
            &uri,
            Some(json!({ "name": "Ada Green", "position": "Lead Ecologist" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(replaced["data"]["position"], "Lead Ecologist");
    assert_eq!(replaced["data"]["isActive"], true);
    assert!(replaced["data"]["image"].is_null());
    assert_eq!(replaced["data"]["displayOrder"], 0);
}

#[sqlx::test(migrations = "../migrations")]
async fn test_list_filters_active_and_sorts_by_order(pool: PgPool) {
    let ctx = TestContext::from_pool(pool).await;
    add_member(&ctx, "Ada").await;
    let ben = add_member(&ctx, "Ben").await;
    add_member(&ctx, "Cleo").await;

    ctx.authed(
        Method::PATCH,
        &format!("/api/team-members/{}", ben["id"]),
        Some(json!({ "isActive": false })),
    )
    .await;

    let (status, body) = ctx.public(Method::GET, "/api/team-members?isActive=true", None).await;
    assert_eq!(status, StatusCode::OK);

    let names: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Ada", "Cleo"]);
    assert_eq!(body["metadata"]["total"], 2);
}

#[tokio::test]
async fn test_malformed_filter_uses_error_envelope() {
    let app = app_without_database();

    for uri in ["/api/team-members?isActive=yes", "/api/team-members/abc"] {
        let (status, body) = send(&app, Method::GET, uri, None, None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
        assert_eq!(body["success"], false, "{}: {}", uri, body);
    }
}
