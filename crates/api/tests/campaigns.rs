//! Integration tests for the campaign endpoints.

mod common;

use axum::http::StatusCode;
use common::{body_json, create_user_with_token, get_auth, post_auth, StubGateway};
use courier_db::repositories::DeviceTokenRepo;
use courier_gateway::FailureKind;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../db/migrations")]
async fn campaign_endpoints_require_admin(pool: PgPool) {
    let (_user_id, token) = create_user_with_token(&pool, "alice", "user").await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/v1/campaigns", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn create_and_get_campaign(pool: PgPool) {
    let (admin_id, token) = create_user_with_token(&pool, "admin", "admin").await;

    let response = post_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/campaigns",
        &token,
        json!({ "title": "Launch", "description": "Spring launch" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let id = json["data"]["id"].as_i64().unwrap();
    assert_eq!(json["data"]["campaign_type"], "MANUAL");
    assert_eq!(json["data"]["created_by"], admin_id);
    assert_eq!(json["data"]["is_completed"], false);

    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/v1/campaigns/{id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "Launch");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn unknown_campaign_returns_404(pool: PgPool) {
    let (_admin_id, token) = create_user_with_token(&pool, "admin", "admin").await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/v1/campaigns/424242", &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../db/migrations")]
async fn send_campaign_reports_stats_and_failed_rows(pool: PgPool) {
    let (_admin_id, token) = create_user_with_token(&pool, "admin", "admin").await;

    // Two reachable users; one has a permanently dead token.
    let (alice, _t) = create_user_with_token(&pool, "alice", "user").await;
    let (bob, _t) = create_user_with_token(&pool, "bob", "user").await;
    DeviceTokenRepo::upsert(&pool, alice, "fcm-alice", "ANDROID", None)
        .await
        .unwrap();
    DeviceTokenRepo::upsert(&pool, bob, "fcm-bob-dead", "IOS", None)
        .await
        .unwrap();

    let response = post_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/campaigns",
        &token,
        json!({ "title": "Blast" }),
    )
    .await;
    let id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let gateway = StubGateway::with_failures([("fcm-bob-dead", FailureKind::Unregistered)]);
    let response = post_auth(
        common::build_test_app_with_gateway(pool.clone(), gateway),
        &format!("/api/v1/campaigns/{id}/send"),
        &token,
        json!({ "title": "Hello", "body": "World" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["total_users"], 2);
    assert_eq!(json["data"]["successful_users"], 1);
    assert_eq!(json["data"]["failed_users"], 1);

    // Stats reflect the finalized campaign.
    let response = get_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/campaigns/{id}/stats"),
        &token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["campaign"]["is_completed"], true);
    assert_eq!(json["data"]["campaign"]["successful_sends"], 1);
    assert_eq!(json["data"]["campaign"]["failed_sends"], 1);
    assert_eq!(json["data"]["success_rate"], 50.0);
    assert_eq!(json["data"]["notifications"]["sent"], 1);
    assert_eq!(json["data"]["notifications"]["failed"], 1);

    // The failed listing names the dead delivery.
    let response = get_auth(
        common::build_test_app(pool),
        &format!("/api/v1/campaigns/{id}/failed"),
        &token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["count"], 1);
    assert_eq!(json["data"]["notifications"][0]["user_id"], bob);
    assert_eq!(json["data"]["notifications"][0]["status"], "FAILED");
}

#[sqlx::test(migrations = "../db/migrations")]
async fn send_to_unknown_campaign_returns_404(pool: PgPool) {
    let (_admin_id, token) = create_user_with_token(&pool, "admin", "admin").await;
    let app = common::build_test_app(pool);

    let response = post_auth(
        app,
        "/api/v1/campaigns/424242/send",
        &token,
        json!({ "title": "Hello", "body": "World" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
