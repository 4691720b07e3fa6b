//! Route definitions for the `/campaigns` resource.
//!
//! All endpoints require the admin role.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::campaign;
use crate::state::AppState;

/// Routes mounted at `/campaigns`.
///
/// ```text
/// GET    /              -> list_campaigns
/// POST   /              -> create_campaign
/// GET    /{id}          -> get_campaign
/// POST   /{id}/send     -> send_campaign
/// GET    /{id}/stats    -> campaign_stats
/// GET    /{id}/failed   -> failed_notifications
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(campaign::list_campaigns).post(campaign::create_campaign),
        )
        .route("/{id}", get(campaign::get_campaign))
        .route("/{id}/send", post(campaign::send_campaign))
        .route("/{id}/stats", get(campaign::campaign_stats))
        .route("/{id}/failed", get(campaign::failed_notifications))
}
