pub mod campaign;
pub mod device_token;
pub mod health;
pub mod notification;
pub mod preference;
pub mod push;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /device-tokens                       list (auth)
/// /device-tokens/register              register token (auth, POST)
/// /device-tokens/unregister            unregister token (auth, POST)
///
/// /notifications                       list (?unread_only, limit, offset)
/// /notifications/unread                list unread (auth)
/// /notifications/unread-count          unread count (auth)
/// /notifications/read-all              mark all read (auth, POST)
/// /notifications/stats                 per-user stats (auth)
/// /notifications/{id}/read             mark read (auth, POST)
/// /notifications/send                  send notification (admin, POST)
/// /notifications/reachable-users       reachable-user diagnostic (admin)
///
/// /preferences                         get, patch (auth)
///
/// /campaigns                           list, create (admin)
/// /campaigns/{id}                      get (admin)
/// /campaigns/{id}/send                 send to all devices (admin, POST)
/// /campaigns/{id}/stats                statistics (admin)
/// /campaigns/{id}/failed               failed notifications (admin)
///
/// /push/client-config                  client SDK config (public)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Device token registration and lifecycle.
        .nest("/device-tokens", device_token::router())
        // Notification history, read tracking, and sending.
        .nest("/notifications", notification::router())
        // Per-user notification preferences.
        .nest("/preferences", preference::router())
        // Campaign management and tracked blasts.
        .nest("/campaigns", campaign::router())
        // Public client push configuration.
        .nest("/push", push::router())
}
