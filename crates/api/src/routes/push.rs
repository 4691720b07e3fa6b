//! Route definitions for the public `/push` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::push_config;
use crate::state::AppState;

/// Routes mounted at `/push`.
///
/// ```text
/// GET    /client-config  -> client_config (public)
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/client-config", get(push_config::client_config))
}
