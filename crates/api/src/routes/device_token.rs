//! Route definitions for the `/device-tokens` resource.
//!
//! All endpoints require authentication.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::device_token;
use crate::state::AppState;

/// Routes mounted at `/device-tokens`.
///
/// ```text
/// GET    /            -> list
/// POST   /register    -> register
/// POST   /unregister  -> unregister
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(device_token::list))
        .route("/register", post(device_token::register))
        .route("/unregister", post(device_token::unregister))
}
