//! Handlers for the `/device-tokens` resource.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use courier_core::error::CoreError;
use courier_db::models::device_token::RegisterDeviceToken;
use courier_dispatch::DeviceTokenRegistry;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// Body for `POST /device-tokens/unregister`.
#[derive(Debug, Deserialize)]
pub struct UnregisterRequest {
    pub token: String,
}

/// Query parameters for `GET /device-tokens`.
#[derive(Debug, Deserialize)]
pub struct ListTokensQuery {
    /// If `true`, return only active tokens. Defaults to `true`.
    pub active_only: Option<bool>,
}

/// POST /api/v1/device-tokens/register
///
/// Register a device token for the authenticated user. The token is
/// validated against the gateway first; a permanently rejected token
/// returns 400 and persists nothing.
pub async fn register(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<RegisterDeviceToken>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    if body.token.trim().is_empty() {
        return Err(CoreError::Validation("token must not be empty".into()).into());
    }

    let token = DeviceTokenRegistry::register(
        &state.pool,
        state.gateway.as_ref(),
        auth.user_id,
        &body,
        true,
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({ "data": token })),
    ))
}

/// POST /api/v1/device-tokens/unregister
///
/// Deactivate a device token. Returns 404 when the token is unknown.
pub async fn unregister(
    _auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<UnregisterRequest>,
) -> AppResult<(StatusCode, Json<serde_json::Value>)> {
    let existed = DeviceTokenRegistry::unregister(&state.pool, &body.token).await?;

    if !existed {
        return Ok((
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "error": "Device token not found",
                "code": "NOT_FOUND",
            })),
        ));
    }

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({
            "data": { "unregistered": true }
        })),
    ))
}

/// GET /api/v1/device-tokens
///
/// List the authenticated user's device tokens.
pub async fn list(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(params): Query<ListTokensQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let active_only = params.active_only.unwrap_or(true);
    let tokens = DeviceTokenRegistry::list(&state.pool, auth.user_id, active_only).await?;

    Ok(Json(serde_json::json!({ "data": tokens })))
}
