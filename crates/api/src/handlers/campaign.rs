//! Handlers for the `/campaigns` resource (admin only).

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use courier_core::error::CoreError;
use courier_core::types::{CampaignType, DbId, NotificationType};
use courier_db::models::campaign::CreateCampaign;
use courier_db::repositories::{CampaignRepo, NotificationRepo};
use courier_dispatch::{CampaignTracker, DispatchRequest};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// Query parameters for `GET /campaigns`.
#[derive(Debug, Deserialize)]
pub struct CampaignQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Body for `POST /campaigns/{id}/send`.
#[derive(Debug, Deserialize)]
pub struct SendCampaignRequest {
    pub title: String,
    pub body: String,
    pub notification_type: Option<NotificationType>,
    pub data: Option<serde_json::Value>,
    pub image_url: Option<String>,
}

/// GET /api/v1/campaigns
pub async fn list_campaigns(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(params): Query<CampaignQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let limit = params.limit.unwrap_or(50).min(100);
    let offset = params.offset.unwrap_or(0);

    let campaigns = CampaignRepo::list(&state.pool, limit, offset).await?;

    Ok(Json(serde_json::json!({ "data": campaigns })))
}

/// POST /api/v1/campaigns
///
/// Create a campaign shell. The population and statistics are filled in when
/// the campaign is sent.
pub async fn create_campaign(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<CreateCampaign>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    if body.title.trim().is_empty() {
        return Err(CoreError::Validation("title must not be empty".into()).into());
    }

    let campaign_type = body.campaign_type.unwrap_or(CampaignType::Manual);
    let campaign = CampaignRepo::create(
        &state.pool,
        &body.title,
        body.description.as_deref(),
        campaign_type.as_str(),
        Some(admin.user_id),
        0,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": campaign })),
    ))
}

/// GET /api/v1/campaigns/{id}
pub async fn get_campaign(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let campaign = CampaignRepo::get(&state.pool, campaign_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id: campaign_id,
        }))?;

    Ok(Json(serde_json::json!({ "data": campaign })))
}

/// POST /api/v1/campaigns/{id}/send
///
/// Send the campaign to every reachable user (active users with at least one
/// active device token). Returns the batch result; delivery failure is data.
pub async fn send_campaign(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
    Json(body): Json<SendCampaignRequest>,
) -> AppResult<Json<serde_json::Value>> {
    if body.title.trim().is_empty() || body.body.trim().is_empty() {
        return Err(CoreError::Validation("title and body must not be empty".into()).into());
    }

    let notification_type = body.notification_type.unwrap_or(NotificationType::Custom);
    let mut request = DispatchRequest::new(notification_type, &body.title, &body.body);
    request.data = body.data.clone();
    request.image_url = body.image_url.clone();

    let batch =
        CampaignTracker::send_campaign_to_all_devices(&state.dispatcher, campaign_id, &request)
            .await?;

    Ok(Json(serde_json::json!({ "data": batch })))
}

/// GET /api/v1/campaigns/{id}/stats
///
/// Campaign statistics: stored aggregates plus live per-status counts from
/// the notifications table.
pub async fn campaign_stats(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let campaign = CampaignRepo::get(&state.pool, campaign_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id: campaign_id,
        }))?;

    let counts = NotificationRepo::campaign_status_counts(&state.pool, campaign_id).await?;

    Ok(Json(serde_json::json!({
        "data": {
            "campaign": campaign,
            "success_rate": campaign.success_rate(),
            "notifications": counts,
        }
    })))
}

/// GET /api/v1/campaigns/{id}/failed
///
/// List a campaign's FAILED notifications with their error messages.
pub async fn failed_notifications(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(campaign_id): Path<DbId>,
) -> AppResult<Json<serde_json::Value>> {
    let campaign = CampaignRepo::get(&state.pool, campaign_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Campaign",
            id: campaign_id,
        }))?;

    let failed = NotificationRepo::list_failed_for_campaign(&state.pool, campaign.id).await?;

    Ok(Json(serde_json::json!({
        "data": { "count": failed.len(), "notifications": failed }
    })))
}
