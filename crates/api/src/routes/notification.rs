//! Route definitions for the `/notifications` resource.
//!
//! Read endpoints require authentication; `send` and `reachable-users`
//! require the admin role.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::notification;
use crate::state::AppState;

/// Routes mounted at `/notifications`.
///
/// ```text
/// GET    /                  -> list_notifications
/// GET    /unread            -> list_unread
/// GET    /unread-count      -> unread_count
/// POST   /read-all          -> mark_all_read
/// GET    /stats             -> stats
/// POST   /{id}/read         -> mark_read
///
/// POST   /send              -> send (admin)
/// GET    /reachable-users   -> reachable_users (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(notification::list_notifications))
        .route("/unread", get(notification::list_unread))
        .route("/unread-count", get(notification::unread_count))
        .route("/read-all", post(notification::mark_all_read))
        .route("/stats", get(notification::stats))
        .route("/{id}/read", post(notification::mark_read))
        .route("/send", post(notification::send))
        .route("/reachable-users", get(notification::reachable_users))
}
