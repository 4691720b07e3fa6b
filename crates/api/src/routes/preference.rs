//! Route definitions for the `/preferences` resource.
//!
//! All endpoints require authentication.

use axum::routing::get;
use axum::Router;

use crate::handlers::preference;
use crate::state::AppState;

/// Routes mounted at `/preferences`.
///
/// ```text
/// GET    /  -> get_preferences
/// PATCH  /  -> update_preferences
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route(
        "/",
        get(preference::get_preferences).patch(preference::update_preferences),
    )
}
