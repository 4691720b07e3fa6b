//! Handlers for the `/notifications` resource.
//!
//! Read endpoints require authentication via [`AuthUser`]; the send and
//! diagnostics endpoints are admin-only.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use courier_core::error::CoreError;
use courier_core::types::{DbId, NotificationType};
use courier_db::repositories::{NotificationRepo, UserRepo};
use courier_dispatch::DispatchRequest;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query / request types
// ---------------------------------------------------------------------------

/// Query parameters for `GET /notifications`.
#[derive(Debug, Deserialize)]
pub struct NotificationQuery {
    /// If `true`, return only unread notifications. Defaults to `false`.
    pub unread_only: Option<bool>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<i64>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<i64>,
}

/// Maximum page size for notification listing.
const MAX_LIMIT: i64 = 100;

/// Default page size for notification listing.
const DEFAULT_LIMIT: i64 = 50;

/// Body for `POST /notifications/send`.
///
/// Exactly what to send plus at most one target selector. When several are
/// present the priority rule picks one: topic, then explicit device tokens,
/// then user ids; with no selector the message goes to all active admins.
#[derive(Debug, Deserialize)]
pub struct SendNotificationRequest {
    pub title: String,
    pub body: String,
    pub notification_type: Option<NotificationType>,
    pub data: Option<serde_json::Value>,
    pub image_url: Option<String>,
    pub topic: Option<String>,
    pub device_tokens: Option<Vec<String>>,
    pub user_ids: Option<Vec<DbId>>,
}

// ---------------------------------------------------------------------------
// Notification history
// ---------------------------------------------------------------------------

/// GET /api/v1/notifications
///
/// List the authenticated user's notifications with optional filtering.
pub async fn list_notifications(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);
    let unread_only = params.unread_only.unwrap_or(false);

    let notifications =
        NotificationRepo::list_for_user(&state.pool, auth.user_id, unread_only, limit, offset)
            .await?;

    Ok(Json(serde_json::json!({ "data": notifications })))
}

/// GET /api/v1/notifications/unread
///
/// List the authenticated user's unread notifications.
pub async fn list_unread(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<NotificationQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT);
    let offset = params.offset.unwrap_or(0);

    let notifications =
        NotificationRepo::list_for_user(&state.pool, auth.user_id, true, limit, offset).await?;

    Ok(Json(serde_json::json!({ "data": notifications })))
}

/// GET /api/v1/notifications/unread-count
///
/// Return the number of unread notifications for the authenticated user.
pub async fn unread_count(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let count = NotificationRepo::unread_count(&state.pool, auth.user_id).await?;

    Ok(Json(serde_json::json!({
        "data": { "count": count }
    })))
}

/// POST /api/v1/notifications/{id}/read
///
/// Mark a single notification as read. Returns 204 No Content on success,
/// or 404 if the notification is not SENT or does not belong to the
/// authenticated user.
pub async fn mark_read(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let found = NotificationRepo::mark_read(&state.pool, notification_id, auth.user_id).await?;

    if !found {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Notification",
            id: notification_id,
        }));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notifications/read-all
///
/// Mark all of the authenticated user's SENT notifications as read.
/// Returns the number of notifications that were marked.
pub async fn mark_all_read(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let count = NotificationRepo::mark_all_read(&state.pool, auth.user_id).await?;

    Ok(Json(serde_json::json!({
        "data": { "marked_read": count }
    })))
}

/// GET /api/v1/notifications/stats
///
/// Per-user notification statistics: totals plus a by-type breakdown.
pub async fn stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let stats = NotificationRepo::stats_for_user(&state.pool, auth.user_id).await?;

    Ok(Json(serde_json::json!({ "data": stats })))
}

// ---------------------------------------------------------------------------
// Sending (admin)
// ---------------------------------------------------------------------------

/// POST /api/v1/notifications/send
///
/// Send a notification to a target chosen by the priority rule. Delivery
/// failure is data: the response is always 200 with a structured result,
/// and only request-shape problems return 4xx.
pub async fn send(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Json(body): Json<SendNotificationRequest>,
) -> AppResult<Json<serde_json::Value>> {
    if body.title.trim().is_empty() || body.body.trim().is_empty() {
        return Err(CoreError::Validation("title and body must not be empty".into()).into());
    }
    if matches!(&body.device_tokens, Some(tokens) if tokens.is_empty()) {
        return Err(CoreError::Validation("device_tokens must not be empty".into()).into());
    }
    if matches!(&body.topic, Some(topic) if topic.trim().is_empty()) {
        return Err(CoreError::Validation("topic must not be blank".into()).into());
    }

    let notification_type = body.notification_type.unwrap_or(NotificationType::Custom);
    let mut request = DispatchRequest::new(notification_type, &body.title, &body.body);
    request.data = body.data.clone();
    request.image_url = body.image_url.clone();

    // Priority rule: topic > explicit tokens > user ids > all admins.
    let result = if let Some(topic) = &body.topic {
        let outcome = state.dispatcher.dispatch_to_topic(topic, &request).await;
        serde_json::json!({ "target": "topic", "topic": topic, "result": outcome })
    } else if let Some(tokens) = &body.device_tokens {
        let outcome = state.dispatcher.dispatch_to_tokens(tokens, &request).await?;
        serde_json::json!({ "target": "device_tokens", "result": outcome })
    } else if let Some(user_ids) = &body.user_ids {
        let outcome = state
            .dispatcher
            .dispatch_to_users(user_ids, &request, None)
            .await?;
        serde_json::json!({ "target": "users", "result": outcome })
    } else {
        let outcome = state.dispatcher.send_to_all_admins(&request).await?;
        serde_json::json!({ "target": "admins", "result": outcome })
    };

    Ok(Json(serde_json::json!({ "data": result })))
}

/// GET /api/v1/notifications/reachable-users
///
/// Diagnostic listing of users reachable by push: active users with at
/// least one active device token.
pub async fn reachable_users(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let users = UserRepo::list_with_active_tokens(&state.pool).await?;

    Ok(Json(serde_json::json!({
        "data": { "count": users.len(), "users": users }
    })))
}
