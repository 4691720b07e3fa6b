//! Integration tests for the device token endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, create_user_with_token, get_auth, post_auth, StubGateway};
use courier_gateway::FailureKind;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn register_returns_created_token(pool: PgPool) {
    let (user_id, token) = create_user_with_token(&pool, "alice", "user").await;
    let app = common::build_test_app(pool.clone());

    let response = post_auth(
        app,
        "/api/v1/device-tokens/register",
        &token,
        json!({ "token": "fcm-tok-1", "platform": "ANDROID", "device_name": "Pixel" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["token"], "fcm-tok-1");
    assert_eq!(json["data"]["platform"], "ANDROID");
    assert_eq!(json["data"]["user_id"], user_id);
    assert_eq!(json["data"]["is_active"], true);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_rejects_gateway_invalid_token(pool: PgPool) {
    let (_user_id, token) = create_user_with_token(&pool, "alice", "user").await;
    let gateway = StubGateway::with_failures([("fcm-dead", FailureKind::Unregistered)]);
    let app = common::build_test_app_with_gateway(pool.clone(), gateway);

    let response = post_auth(
        app,
        "/api/v1/device-tokens/register",
        &token,
        json!({ "token": "fcm-dead" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Nothing persisted for a rejected token.
    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM device_tokens")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(rows, 0);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_rejects_empty_token(pool: PgPool) {
    let (_user_id, token) = create_user_with_token(&pool, "alice", "user").await;
    let app = common::build_test_app(pool);

    let response = post_auth(
        app,
        "/api/v1/device-tokens/register",
        &token,
        json!({ "token": "  " }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_requires_authentication(pool: PgPool) {
    let app = common::build_test_app(pool);

    let response = post_auth(
        app,
        "/api/v1/device-tokens/register",
        "not-a-valid-jwt",
        json!({ "token": "fcm-tok-1" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unregister_unknown_token_returns_404(pool: PgPool) {
    let (_user_id, token) = create_user_with_token(&pool, "alice", "user").await;
    let app = common::build_test_app(pool);

    let response = post_auth(
        app,
        "/api/v1/device-tokens/unregister",
        &token,
        json!({ "token": "never-registered" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn register_then_unregister_round_trip(pool: PgPool) {
    let (_user_id, token) = create_user_with_token(&pool, "alice", "user").await;

    let response = post_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/device-tokens/register",
        &token,
        json!({ "token": "fcm-tok-1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = post_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/device-tokens/unregister",
        &token,
        json!({ "token": "fcm-tok-1" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["unregistered"], true);

    // Listing active tokens afterwards comes back empty.
    let response = get_auth(
        common::build_test_app(pool),
        "/api/v1/device-tokens",
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 0);
}
