//! Handlers for the `/preferences` resource.

use axum::extract::State;
use axum::Json;
use courier_db::models::preference::UpdatePreference;
use courier_db::repositories::PreferenceRepo;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /api/v1/preferences
///
/// Fetch the authenticated user's notification preferences, lazily creating
/// the all-enabled default row on first access.
pub async fn get_preferences(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<serde_json::Value>> {
    let prefs = PreferenceRepo::get_or_create(&state.pool, auth.user_id).await?;

    Ok(Json(serde_json::json!({ "data": prefs })))
}

/// PATCH /api/v1/preferences
///
/// Partially update the authenticated user's preferences. Absent fields are
/// unchanged; quiet-hours bounds accept an explicit `null` to clear them.
pub async fn update_preferences(
    auth: AuthUser,
    State(state): State<AppState>,
    Json(body): Json<UpdatePreference>,
) -> AppResult<Json<serde_json::Value>> {
    let prefs = PreferenceRepo::update(&state.pool, auth.user_id, &body).await?;

    Ok(Json(serde_json::json!({ "data": prefs })))
}
